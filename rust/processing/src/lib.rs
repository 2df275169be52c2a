// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC-Report Processing
//!
//! Multi-file IFC reporting pipeline shared by the server:
//!
//! - **Parser adapter**: load a model and extract one row per element with
//!   flattened property sets and quantities
//! - **Unifier**: concatenate per-file tables with a `source_file` column
//! - **Unique-value matrix**: per-file sorted distinct values of one column
//! - **Column selection**: idempotent, session-scoped include flags
//! - **Export**: in-memory xlsx workbook with the report and the matrix
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ifc_report_processing::{ReportSession, StepParserAdapter, Upload};
//!
//! let mut session = ReportSession::new();
//! session.ingest(&StepParserAdapter, &[Upload {
//!     file_name: "walls.ifc".into(),
//!     path: "walls.ifc".into(),
//! }]);
//!
//! let matrix = session.choose_column("Type")?;
//! let workbook = session.export(true, "ifc_report.xlsx")?;
//! std::fs::write(&workbook.file_name, &workbook.bytes)?;
//! ```

pub mod adapter;
pub mod elements;
pub mod error;
pub mod export;
pub mod matrix;
pub mod model;
pub mod selection;
pub mod session;
pub mod table;
pub mod unify;

pub use adapter::{ParserAdapter, StepParserAdapter};
pub use elements::extract_elements;
pub use error::{ExportError, ReportError, Result};
pub use export::{
    export_report, read_first_sheet, read_workbook, sanitize_sheet_name, ExportedWorkbook,
    WorkbookSheet, DEFAULT_FILE_NAME, REPORT_SHEET_NAME, XLSX_MIME,
};
pub use matrix::{unique_values, SortPolicy, UniqueValueMatrix, PADDING};
pub use model::IfcModel;
pub use selection::{ColumnFlag, ColumnSelection, SelectionAction};
pub use session::{LoadedFile, ReportSession, SessionStage, SessionSummary, Upload};
pub use table::{CellValue, Table, ValueKind};
pub use unify::{unify_tables, SourceSummary, UnifiedTable, SOURCE_FILE_COLUMN};
