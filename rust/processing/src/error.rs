// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for report processing and workbook export.

use thiserror::Error;

/// Errors raised by table operations and the report session.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("No usable data: no uploaded file produced any element rows")]
    NoData,

    #[error("Row has {found} cells but the table has {expected} columns")]
    RowWidth { expected: usize, found: usize },

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Errors raised while writing or reading an xlsx workbook.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Malformed workbook: {0}")]
    Malformed(String),
}

impl ExportError {
    pub(crate) fn xml(err: impl std::fmt::Display) -> Self {
        ExportError::Xml(err.to_string())
    }
}

pub type Result<T, E = ReportError> = std::result::Result<T, E>;
