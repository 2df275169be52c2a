// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Report session - everything one user works on between upload and
//! download.
//!
//! Stages move `NoFiles -> FilesLoaded -> ColumnSelected -> Filtered ->
//! Exported`, each step driven by a user action. Ingesting more files
//! re-unifies every table loaded so far; the selection keeps the user's
//! choices and only adds new columns.

use crate::adapter::ParserAdapter;
use crate::error::{ReportError, Result};
use crate::export::{export_report, ExportedWorkbook};
use crate::matrix::{unique_values, UniqueValueMatrix};
use crate::selection::{ColumnSelection, SelectionAction};
use crate::table::{CellValue, Table};
use crate::unify::{unify_tables, UnifiedTable};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStage {
    #[default]
    NoFiles,
    FilesLoaded,
    ColumnSelected,
    Filtered,
    Exported,
}

/// File stored on disk, waiting to be parsed.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub path: PathBuf,
}

/// Outcome of loading one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedFile {
    pub file_name: String,
    /// `false` when the file could not be parsed or had no elements
    pub loaded: bool,
    pub row_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub stage: SessionStage,
    pub files: Vec<LoadedFile>,
    pub row_count: usize,
    pub columns: Vec<String>,
    pub selected_columns: usize,
    pub matrix_column: Option<String>,
}

#[derive(Debug, Default)]
pub struct ReportSession {
    /// Per-file tables in arrival order; `None` for files that failed
    tables: Vec<(String, Option<Table>)>,
    unified: UnifiedTable,
    selection: ColumnSelection,
    matrix: Option<UniqueValueMatrix>,
    stage: SessionStage,
}

impl ReportSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `uploads` in parallel and merge them into the session.
    ///
    /// Results keep upload order. Files that fail are recorded as not loaded
    /// and contribute no rows.
    pub fn ingest<A: ParserAdapter>(&mut self, adapter: &A, uploads: &[Upload]) -> Vec<LoadedFile> {
        let start = std::time::Instant::now();
        let tables: Vec<(String, Option<Table>)> = uploads
            .par_iter()
            .map(|upload| {
                let table = adapter.element_table(&upload.path);
                if table.is_none() {
                    tracing::warn!(
                        file = %upload.file_name,
                        "Skipping file: no model or no elements"
                    );
                }
                (upload.file_name.clone(), table)
            })
            .collect();

        tracing::info!(
            files = uploads.len(),
            parse_time_ms = start.elapsed().as_millis(),
            "Parsed uploads"
        );
        self.ingest_tables(tables)
    }

    /// Merge already extracted tables into the session.
    pub fn ingest_tables<I>(&mut self, tables: I) -> Vec<LoadedFile>
    where
        I: IntoIterator<Item = (String, Option<Table>)>,
    {
        let mut added = Vec::new();
        for (name, table) in tables {
            let name = self.unique_file_name(&name);
            let table = table.filter(|t| !t.is_empty());
            added.push(LoadedFile {
                file_name: name.clone(),
                loaded: table.is_some(),
                row_count: table.as_ref().map_or(0, Table::row_count),
            });
            self.tables.push((name, table));
        }
        self.rebuild();
        added
    }

    /// Drop every file and reset to `NoFiles`.
    pub fn clear_files(&mut self) {
        *self = Self::default();
    }

    /// Build the unique-value matrix for `column` and remember the choice.
    pub fn choose_column(&mut self, column: &str) -> Result<&UniqueValueMatrix> {
        self.require_data()?;
        let matrix = UniqueValueMatrix::build(&self.unified.table, column)?;
        self.stage = SessionStage::ColumnSelected;
        let matrix: &UniqueValueMatrix = self.matrix.insert(matrix);
        Ok(matrix)
    }

    /// Global sorted distinct values of one column.
    pub fn unique_values(&self, column: &str) -> Result<Vec<CellValue>> {
        self.require_data()?;
        unique_values(&self.unified.table, column)
    }

    /// Apply a selection action. A toggle on an unknown column is an error.
    pub fn apply_selection(&mut self, action: &SelectionAction) -> Result<()> {
        self.require_data()?;
        if !self.selection.apply(action) {
            if let SelectionAction::Toggle { column, .. } = action {
                return Err(ReportError::UnknownColumn(column.clone()));
            }
        }
        self.stage = SessionStage::Filtered;
        Ok(())
    }

    /// Unified table restricted to `source_file` and the selected columns.
    pub fn filtered_table(&self) -> Result<Table> {
        self.require_data()?;
        Ok(self.selection.filter(&self.unified.table))
    }

    /// A page of the filtered table.
    pub fn preview(&self, offset: usize, limit: usize) -> Result<Table> {
        self.require_data()?;
        let included = self.selection.included_columns(&self.unified.table);
        Ok(self.unified.table.slice_rows(offset, limit).select(&included))
    }

    /// Write the filtered table, plus the chosen matrix when asked, to xlsx.
    pub fn export(&mut self, include_matrix: bool, file_name: &str) -> Result<ExportedWorkbook> {
        let filtered = self.filtered_table()?;
        let matrix = self.matrix.as_ref().filter(|_| include_matrix);
        let workbook = export_report(&filtered, matrix, file_name)?;
        self.stage = SessionStage::Exported;
        Ok(workbook)
    }

    pub fn stage(&self) -> SessionStage {
        self.stage
    }

    pub fn has_data(&self) -> bool {
        !self.unified.is_empty()
    }

    pub fn unified(&self) -> &UnifiedTable {
        &self.unified
    }

    pub fn selection(&self) -> &ColumnSelection {
        &self.selection
    }

    pub fn matrix(&self) -> Option<&UniqueValueMatrix> {
        self.matrix.as_ref()
    }

    pub fn files(&self) -> Vec<LoadedFile> {
        self.tables
            .iter()
            .map(|(name, table)| LoadedFile {
                file_name: name.clone(),
                loaded: table.is_some(),
                row_count: table.as_ref().map_or(0, Table::row_count),
            })
            .collect()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            stage: self.stage,
            files: self.files(),
            row_count: self.unified.row_count(),
            columns: self.unified.table.columns().to_vec(),
            selected_columns: self.selection.selected_count(),
            matrix_column: self.matrix.as_ref().map(|m| m.column.clone()),
        }
    }

    fn require_data(&self) -> Result<()> {
        if self.has_data() {
            Ok(())
        } else {
            Err(ReportError::NoData)
        }
    }

    fn rebuild(&mut self) {
        self.unified = unify_tables(
            self.tables
                .iter()
                .map(|(name, table)| (name.as_str(), table.as_ref())),
        );
        self.selection.initialize(self.unified.candidate_columns());

        // keep the chosen matrix column if it still exists
        self.matrix = self
            .matrix
            .take()
            .and_then(|m| UniqueValueMatrix::build(&self.unified.table, &m.column).ok());

        self.stage = if self.unified.is_empty() {
            SessionStage::NoFiles
        } else if self.matrix.is_some() {
            SessionStage::ColumnSelected
        } else {
            SessionStage::FilesLoaded
        };
        tracing::debug!(
            files = self.tables.len(),
            rows = self.unified.row_count(),
            stage = ?self.stage,
            "Rebuilt session tables"
        );
    }

    /// `name`, or `name (n)` with the smallest free `n` when already taken.
    fn unique_file_name(&self, name: &str) -> String {
        let taken = |candidate: &str| self.tables.iter().any(|(n, _)| n == candidate);
        if !taken(name) {
            return name.to_string();
        }
        let (stem, extension) = match name.rfind('.') {
            Some(dot) if dot > 0 => name.split_at(dot),
            _ => (name, ""),
        };
        (2..)
            .map(|n| format!("{} ({}){}", stem, n, extension))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(guid: &str, element_type: &str) -> Table {
        let mut table = Table::new(["GUID", "Type"]);
        table.push_row(vec![guid.into(), element_type.into()]).unwrap();
        table
    }

    fn loaded_session() -> ReportSession {
        let mut session = ReportSession::new();
        session.ingest_tables([
            ("A".to_string(), Some(file("1", "Wall"))),
            ("B".to_string(), Some(file("2", "Door"))),
        ]);
        session
    }

    #[test]
    fn test_stage_progression() {
        let mut session = ReportSession::new();
        assert_eq!(session.stage(), SessionStage::NoFiles);

        session.ingest_tables([("A".to_string(), Some(file("1", "Wall")))]);
        assert_eq!(session.stage(), SessionStage::FilesLoaded);

        session.choose_column("Type").unwrap();
        assert_eq!(session.stage(), SessionStage::ColumnSelected);

        session
            .apply_selection(&SelectionAction::Toggle {
                column: "GUID".into(),
                selected: false,
            })
            .unwrap();
        assert_eq!(session.stage(), SessionStage::Filtered);

        session.export(true, "out").unwrap();
        assert_eq!(session.stage(), SessionStage::Exported);

        session.clear_files();
        assert_eq!(session.stage(), SessionStage::NoFiles);
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_all_files_failed_is_no_data() {
        let mut session = ReportSession::new();
        let files = session.ingest_tables([("x.ifc".to_string(), None), ("y.ifc".to_string(), None)]);

        assert!(files.iter().all(|f| !f.loaded));
        assert!(!session.has_data());
        assert_eq!(session.stage(), SessionStage::NoFiles);
        assert!(matches!(session.export(false, ""), Err(ReportError::NoData)));
        assert!(matches!(session.choose_column("GUID"), Err(ReportError::NoData)));
    }

    #[test]
    fn test_selection_survives_new_uploads() {
        let mut session = loaded_session();
        session
            .apply_selection(&SelectionAction::Toggle {
                column: "Type".into(),
                selected: false,
            })
            .unwrap();

        let mut extra = Table::new(["GUID", "Storey"]);
        extra.push_row(vec!["3".into(), "L1".into()]).unwrap();
        session.ingest_tables([("C".to_string(), Some(extra))]);

        assert!(!session.selection().is_selected("Type"));
        assert!(session.selection().is_selected("Storey"));
        assert_eq!(session.unified().row_count(), 3);
        assert_eq!(
            session.filtered_table().unwrap().columns(),
            ["GUID", "Storey", "source_file"]
        );
    }

    #[test]
    fn test_duplicate_file_names() {
        let mut session = loaded_session();
        let added = session.ingest_tables([
            ("A".to_string(), Some(file("9", "Slab"))),
            ("walls.ifc".to_string(), Some(file("4", "Wall"))),
            ("walls.ifc".to_string(), Some(file("5", "Wall"))),
        ]);
        let names: Vec<&str> = added.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, ["A (2)", "walls.ifc", "walls (2).ifc"]);
        assert_eq!(session.summary().files.len(), 5);
    }

    #[test]
    fn test_matrix_follows_new_files() {
        let mut session = loaded_session();
        session.choose_column("Type").unwrap();
        session.ingest_tables([("C".to_string(), Some(file("3", "Slab")))]);

        let matrix = session.matrix().unwrap();
        assert_eq!(matrix.files.len(), 3);
        assert_eq!(session.stage(), SessionStage::ColumnSelected);
    }

    #[test]
    fn test_unknown_column_errors() {
        let mut session = loaded_session();
        assert!(matches!(
            session.choose_column("Nope"),
            Err(ReportError::UnknownColumn(_))
        ));
        assert!(matches!(
            session.apply_selection(&SelectionAction::Toggle {
                column: "Nope".into(),
                selected: true
            }),
            Err(ReportError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_preview_pages() {
        let session = loaded_session();
        let page = session.preview(1, 10).unwrap();
        assert_eq!(page.row_count(), 1);
        assert_eq!(page.cell(0, "source_file"), Some(&CellValue::from("B")));
    }
}
