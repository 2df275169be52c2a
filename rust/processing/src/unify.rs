// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Table unification - concatenate per-file element tables, tagging every
//! row with the file it came from.

use crate::table::{CellValue, Table};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Column appended to every unified row.
pub const SOURCE_FILE_COLUMN: &str = "source_file";

/// Contribution of one file to a unified table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub file_name: String,
    pub row_count: usize,
}

/// Concatenated table with per-file provenance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnifiedTable {
    pub table: Table,
    /// Files that contributed rows, in arrival order
    pub sources: Vec<SourceSummary>,
}

impl UnifiedTable {
    /// True when no file contributed any row.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    /// Columns that can be selected for export (everything but `source_file`).
    pub fn candidate_columns(&self) -> impl Iterator<Item = &str> {
        self.table
            .columns()
            .iter()
            .map(String::as_str)
            .filter(|c| *c != SOURCE_FILE_COLUMN)
    }
}

/// Concatenate `(file_name, table)` pairs.
///
/// Missing or empty tables are skipped. Columns are the union of all input
/// columns in order of first appearance, with `source_file` last; absent cells
/// are `Null`. An input column already named `source_file` is overwritten.
pub fn unify_tables<'a, I>(inputs: I) -> UnifiedTable
where
    I: IntoIterator<Item = (&'a str, Option<&'a Table>)>,
{
    let present: Vec<(&str, &Table)> = inputs
        .into_iter()
        .filter_map(|(name, table)| table.filter(|t| !t.is_empty()).map(|t| (name, t)))
        .collect();

    if present.is_empty() {
        return UnifiedTable::default();
    }

    let mut columns: Vec<String> = Vec::new();
    let mut positions: FxHashMap<&str, usize> = FxHashMap::default();
    for (_, table) in &present {
        for column in table.columns() {
            if column == SOURCE_FILE_COLUMN || positions.contains_key(column.as_str()) {
                continue;
            }
            positions.insert(column.as_str(), columns.len());
            columns.push(column.clone());
        }
    }
    let source_index = columns.len();
    let width = source_index + 1;

    let total_rows: usize = present.iter().map(|(_, t)| t.row_count()).sum();
    let mut rows = Vec::with_capacity(total_rows);
    let mut sources = Vec::with_capacity(present.len());

    for (name, table) in &present {
        // input column -> unified column (None for a pre-existing source_file)
        let mapping: Vec<Option<usize>> = table
            .columns()
            .iter()
            .map(|c| positions.get(c.as_str()).copied())
            .collect();

        for row in table.rows() {
            let mut unified = vec![CellValue::Null; width];
            for (cell, target) in row.iter().zip(&mapping) {
                if let Some(target) = target {
                    unified[*target] = cell.clone();
                }
            }
            unified[source_index] = CellValue::from(*name);
            rows.push(unified);
        }

        sources.push(SourceSummary {
            file_name: (*name).to_string(),
            row_count: table.row_count(),
        });
    }

    columns.push(SOURCE_FILE_COLUMN.to_string());
    tracing::debug!(
        files = sources.len(),
        rows = rows.len(),
        columns = columns.len(),
        "Unified tables"
    );

    UnifiedTable {
        table: Table::from_parts(columns, rows),
        sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: Vec<Vec<CellValue>>) -> Table {
        let mut table = Table::new(columns.iter().copied());
        for row in rows {
            table.push_row(row).unwrap();
        }
        table
    }

    #[test]
    fn test_two_file_scenario() {
        let a = table(&["GUID", "Type"], vec![vec!["1".into(), "Wall".into()]]);
        let b = table(&["GUID", "Type"], vec![vec!["2".into(), "Door".into()]]);

        let unified = unify_tables([("A", Some(&a)), ("B", Some(&b))]);

        assert_eq!(unified.row_count(), 2);
        assert_eq!(unified.table.columns(), ["GUID", "Type", "source_file"]);
        let sources: Vec<String> = unified
            .table
            .column_values(SOURCE_FILE_COLUMN)
            .unwrap()
            .map(ToString::to_string)
            .collect();
        assert_eq!(sources, ["A", "B"]);
        assert_eq!(
            unified.sources,
            [
                SourceSummary { file_name: "A".into(), row_count: 1 },
                SourceSummary { file_name: "B".into(), row_count: 1 },
            ]
        );
    }

    #[test]
    fn test_union_of_columns_fills_null() {
        let a = table(&["GUID", "Height"], vec![vec!["1".into(), CellValue::Number(3.0)]]);
        let b = table(
            &["GUID", "Width", "Type"],
            vec![
                vec!["2".into(), CellValue::Number(0.9), "Door".into()],
                vec!["3".into(), CellValue::Null, "Door".into()],
            ],
        );

        let unified = unify_tables([("a.ifc", Some(&a)), ("b.ifc", Some(&b))]);

        assert_eq!(
            unified.table.columns(),
            ["GUID", "Height", "Width", "Type", "source_file"]
        );
        assert_eq!(unified.row_count(), 3);
        assert_eq!(unified.table.cell(0, "Width"), Some(&CellValue::Null));
        assert_eq!(unified.table.cell(0, "Height"), Some(&CellValue::Number(3.0)));
        assert_eq!(unified.table.cell(1, "Height"), Some(&CellValue::Null));
        assert_eq!(unified.table.cell(2, "source_file"), Some(&CellValue::from("b.ifc")));
    }

    #[test]
    fn test_failed_and_empty_inputs_are_skipped() {
        let a = table(&["GUID"], vec![vec!["1".into()], vec!["2".into()]]);
        let empty = table(&["GUID", "Other"], vec![]);

        let unified = unify_tables([
            ("broken.ifc", None),
            ("a.ifc", Some(&a)),
            ("empty.ifc", Some(&empty)),
        ]);

        assert_eq!(unified.row_count(), 2);
        assert_eq!(unified.table.columns(), ["GUID", "source_file"]);
        assert_eq!(unified.sources.len(), 1);
    }

    #[test]
    fn test_all_inputs_failed() {
        let unified = unify_tables([("x.ifc", None), ("y.ifc", None)]);
        assert!(unified.is_empty());
        assert!(unified.table.columns().is_empty());
        assert!(unified.sources.is_empty());
    }

    #[test]
    fn test_existing_source_column_is_overwritten() {
        let a = table(&["source_file", "GUID"], vec![vec!["stale".into(), "1".into()]]);

        let unified = unify_tables([("fresh.ifc", Some(&a))]);

        assert_eq!(unified.table.columns(), ["GUID", "source_file"]);
        assert_eq!(unified.table.cell(0, "source_file"), Some(&CellValue::from("fresh.ifc")));
    }

    #[test]
    fn test_candidate_columns_exclude_source() {
        let a = table(&["GUID", "Type"], vec![vec!["1".into(), "Wall".into()]]);
        let unified = unify_tables([("A", Some(&a))]);
        let candidates: Vec<&str> = unified.candidate_columns().collect();
        assert_eq!(candidates, ["GUID", "Type"]);
    }
}
