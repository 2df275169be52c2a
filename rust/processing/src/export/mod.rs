// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spreadsheet export of the filtered report and the unique-value matrix.
//!
//! Workbooks are built in memory and handed back as bytes together with a
//! suggested file name and the xlsx MIME type.

mod reader;
mod writer;

pub use reader::{read_first_sheet, read_workbook, WorkbookSheet};
pub use writer::WorkbookWriter;

use crate::error::ExportError;
use crate::matrix::UniqueValueMatrix;
use crate::table::Table;

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const DEFAULT_FILE_NAME: &str = "ifc_report.xlsx";
pub const REPORT_SHEET_NAME: &str = "IFC Report";
pub const MAX_SHEET_NAME_CHARS: usize = 31;

pub(crate) const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
pub(crate) const REL_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const FORBIDDEN_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Serialized workbook ready for download.
#[derive(Debug, Clone)]
pub struct ExportedWorkbook {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime: &'static str,
    /// Sheet names in workbook order
    pub sheets: Vec<String>,
}

/// Write the filtered table, and optionally the matrix, to one workbook.
///
/// `file_name` gets an `.xlsx` extension when it lacks one; an empty name
/// falls back to [`DEFAULT_FILE_NAME`].
pub fn export_report(
    filtered: &Table,
    matrix: Option<&UniqueValueMatrix>,
    file_name: &str,
) -> Result<ExportedWorkbook, ExportError> {
    let start = std::time::Instant::now();
    let mut writer = WorkbookWriter::new();
    let mut sheets = vec![writer.add_sheet(REPORT_SHEET_NAME, filtered)?];
    if let Some(matrix) = matrix {
        sheets.push(writer.add_sheet(&matrix_sheet_name(&matrix.column), &matrix.to_table())?);
    }
    let bytes = writer.finish()?;

    tracing::info!(
        rows = filtered.row_count(),
        columns = filtered.column_count(),
        sheets = sheets.len(),
        size = bytes.len(),
        export_time_ms = start.elapsed().as_millis(),
        "Exported workbook"
    );

    Ok(ExportedWorkbook {
        bytes,
        file_name: xlsx_file_name(file_name),
        mime: XLSX_MIME,
        sheets,
    })
}

/// Sheet name for the matrix of `column`.
pub fn matrix_sheet_name(column: &str) -> String {
    sanitize_sheet_name(&format!("Unique {}", column))
}

/// Make `name` a legal sheet name: forbidden characters become `_`, no
/// leading or trailing apostrophe, at most 31 characters, never empty.
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if FORBIDDEN_SHEET_CHARS.contains(&c) || c.is_control() { '_' } else { c })
        .collect();
    let truncated: String = cleaned
        .trim_matches('\'')
        .chars()
        .take(MAX_SHEET_NAME_CHARS)
        .collect();
    let trimmed = truncated.trim_end_matches('\'').trim();
    if trimmed.is_empty() {
        "Sheet".to_string()
    } else {
        trimmed.to_string()
    }
}

fn xlsx_file_name(requested: &str) -> String {
    let name = requested.trim();
    if name.is_empty() {
        DEFAULT_FILE_NAME.to_string()
    } else if name.to_ascii_lowercase().ends_with(".xlsx") {
        name.to_string()
    } else {
        format!("{}.xlsx", name)
    }
}

/// Zero-based column index to letters: 0 -> `A`, 25 -> `Z`, 26 -> `AA`.
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.iter().rev().map(|&b| b as char).collect()
}

/// Letters back to a zero-based column index. `None` for anything but `A-Z`.
pub fn column_from_letters(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    letters.bytes().try_fold(0usize, |acc, b| {
        b.is_ascii_uppercase()
            .then(|| acc * 26 + usize::from(b - b'A') + 1)
    })
    .map(|n| n - 1)
}

/// `A1`-style reference from zero-based row and column.
pub fn cell_ref(row: usize, col: usize) -> String {
    format!("{}{}", column_letter(col), row + 1)
}
