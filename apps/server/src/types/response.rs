// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response types for the API.

use ifc_report_processing::{
    CellValue, ColumnFlag, LoadedFile, SessionSummary, SortPolicy, Table, UniqueValueMatrix,
};
use serde::Serialize;
use uuid::Uuid;

/// Newly created session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionCreated {
    pub session_id: Uuid,
}

/// Result of a file upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    /// Files of this upload, in upload order.
    pub files: Vec<LoadedFile>,
    pub summary: SessionSummary,
    /// Parsing time (ms).
    pub parse_time_ms: u64,
}

/// Global distinct values of one column.
#[derive(Debug, Clone, Serialize)]
pub struct ValuesResponse {
    pub column: String,
    pub count: usize,
    pub values: Vec<CellValue>,
}

/// Per-file distinct values, plus the padded rectangle for display.
#[derive(Debug, Clone, Serialize)]
pub struct MatrixResponse {
    pub column: String,
    pub policy: SortPolicy,
    pub height: usize,
    pub distinct_counts: Vec<(String, usize)>,
    pub table: Table,
}

impl From<&UniqueValueMatrix> for MatrixResponse {
    fn from(matrix: &UniqueValueMatrix) -> Self {
        Self {
            column: matrix.column.clone(),
            policy: matrix.policy,
            height: matrix.height,
            distinct_counts: matrix
                .files
                .iter()
                .map(|f| (f.file_name.clone(), f.distinct_count()))
                .collect(),
            table: matrix.to_table(),
        }
    }
}

/// Current column selection.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionResponse {
    pub columns: Vec<ColumnFlag>,
    pub selected_count: usize,
    /// Columns the export will contain, `source_file` included.
    pub included: Vec<String>,
}

/// One page of the filtered table.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewResponse {
    pub offset: usize,
    pub limit: usize,
    pub total_rows: usize,
    pub table: Table,
}
