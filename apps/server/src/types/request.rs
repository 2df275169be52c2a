// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request types for the API.

use serde::Deserialize;

/// `?column=` for value and matrix lookups.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnQuery {
    pub column: String,
}

/// Paging for table previews.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreviewQuery {
    #[serde(default)]
    pub offset: usize,

    /// Page size; the configured default when absent.
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Options for the workbook download.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportQuery {
    /// Add the unique-value matrix sheet when a column has been chosen.
    #[serde(default)]
    pub include_matrix: bool,

    /// Override the configured file name.
    #[serde(default)]
    pub file_name: Option<String>,
}
