// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Column selection state for the export.
//!
//! Initialization is idempotent: columns already tracked keep the flag the
//! user gave them, so re-initializing after every interaction never resets
//! a choice. `source_file` is never tracked and is always exported.

use crate::table::Table;
use crate::unify::SOURCE_FILE_COLUMN;
use serde::{Deserialize, Serialize};

/// Inclusion flag for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFlag {
    pub column: String,
    pub selected: bool,
}

/// Ordered column -> included mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSelection {
    flags: Vec<ColumnFlag>,
}

/// User action on the selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SelectionAction {
    SelectAll,
    DeselectAll,
    Toggle { column: String, selected: bool },
    Preset { columns: Vec<String> },
}

impl ColumnSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `columns`, adding unseen ones as selected. Returns how many were added.
    pub fn initialize<I, S>(&mut self, columns: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for column in columns {
            let column = column.as_ref();
            if column == SOURCE_FILE_COLUMN || self.position(column).is_some() {
                continue;
            }
            self.flags.push(ColumnFlag {
                column: column.to_string(),
                selected: true,
            });
            added += 1;
        }
        added
    }

    pub fn select_all(&mut self) {
        self.flags.iter_mut().for_each(|f| f.selected = true);
    }

    pub fn deselect_all(&mut self) {
        self.flags.iter_mut().for_each(|f| f.selected = false);
    }

    /// Set one column. Returns `false` when the column is not tracked.
    pub fn toggle(&mut self, column: &str, selected: bool) -> bool {
        match self.position(column) {
            Some(i) => {
                self.flags[i].selected = selected;
                true
            }
            None => false,
        }
    }

    /// Select exactly the tracked columns named in `columns`.
    pub fn select_preset<S: AsRef<str>>(&mut self, columns: &[S]) {
        for flag in &mut self.flags {
            flag.selected = columns.iter().any(|c| c.as_ref() == flag.column);
        }
    }

    /// Apply a user action. Returns `false` for a toggle on an unknown column.
    pub fn apply(&mut self, action: &SelectionAction) -> bool {
        match action {
            SelectionAction::SelectAll => self.select_all(),
            SelectionAction::DeselectAll => self.deselect_all(),
            SelectionAction::Toggle { column, selected } => return self.toggle(column, *selected),
            SelectionAction::Preset { columns } => self.select_preset(columns),
        }
        true
    }

    pub fn is_selected(&self, column: &str) -> bool {
        self.position(column)
            .is_some_and(|i| self.flags[i].selected)
    }

    pub fn flags(&self) -> &[ColumnFlag] {
        &self.flags
    }

    pub fn selected_count(&self) -> usize {
        self.flags.iter().filter(|f| f.selected).count()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Forget every tracked column.
    pub fn reset(&mut self) {
        self.flags.clear();
    }

    /// Export columns: selected ones plus `source_file`, in table order.
    pub fn included_columns<'a>(&self, table: &'a Table) -> Vec<&'a str> {
        table
            .columns()
            .iter()
            .map(String::as_str)
            .filter(|c| *c == SOURCE_FILE_COLUMN || self.is_selected(c))
            .collect()
    }

    /// Project `table` onto the included columns.
    pub fn filter(&self, table: &Table) -> Table {
        table.select(&self.included_columns(table))
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.flags.iter().position(|f| f.column == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;

    fn table() -> Table {
        let mut table = Table::new(["GUID", "Name", "Type", "Pset.Height", "source_file"]);
        table
            .push_row(vec![
                "1".into(),
                "W".into(),
                "IfcWall".into(),
                CellValue::Number(3.0),
                "a.ifc".into(),
            ])
            .unwrap();
        table
    }

    #[test]
    fn test_initialize_selects_everything_but_source() {
        let mut selection = ColumnSelection::new();
        let added = selection.initialize(table().columns());
        assert_eq!(added, 4);
        assert_eq!(selection.selected_count(), 4);
        assert!(!selection.is_selected(SOURCE_FILE_COLUMN));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut selection = ColumnSelection::new();
        selection.initialize(table().columns());
        selection.toggle("Name", false);

        assert_eq!(selection.initialize(table().columns()), 0);
        assert!(!selection.is_selected("Name"));

        // new columns join as selected, old choices survive
        selection.initialize(["GUID", "Storey"]);
        assert!(selection.is_selected("Storey"));
        assert!(!selection.is_selected("Name"));
    }

    #[test]
    fn test_bulk_actions() {
        let mut selection = ColumnSelection::new();
        selection.initialize(table().columns());

        selection.deselect_all();
        assert_eq!(selection.selected_count(), 0);
        selection.select_all();
        assert_eq!(selection.selected_count(), 4);
    }

    #[test]
    fn test_toggle_unknown_column() {
        let mut selection = ColumnSelection::new();
        selection.initialize(["GUID"]);
        assert!(!selection.toggle("Nope", true));
        assert!(selection.toggle("GUID", false));
        assert!(!selection.is_selected("GUID"));
    }

    #[test]
    fn test_preset() {
        let mut selection = ColumnSelection::new();
        selection.initialize(table().columns());
        selection.select_preset(&["GUID", "Name", "Type"]);
        assert!(selection.is_selected("Type"));
        assert!(!selection.is_selected("Pset.Height"));
    }

    #[test]
    fn test_empty_selection_keeps_source_file() {
        let table = table();
        let mut selection = ColumnSelection::new();
        selection.initialize(table.columns());
        selection.deselect_all();

        let filtered = selection.filter(&table);
        assert_eq!(filtered.columns(), ["source_file"]);
        assert_eq!(filtered.row_count(), 1);
    }

    #[test]
    fn test_included_columns_follow_table_order() {
        let table = table();
        let mut selection = ColumnSelection::new();
        selection.initialize(["Type", "GUID", "Name", "Pset.Height"]);
        selection.toggle("Name", false);
        assert_eq!(
            selection.included_columns(&table),
            ["GUID", "Type", "Pset.Height", "source_file"]
        );
    }

    #[test]
    fn test_action_json() {
        let action: SelectionAction =
            serde_json::from_str(r#"{"action":"toggle","column":"Name","selected":false}"#).unwrap();
        assert_eq!(
            action,
            SelectionAction::Toggle {
                column: "Name".into(),
                selected: false
            }
        );

        let mut selection = ColumnSelection::new();
        selection.initialize(["Name"]);
        assert!(selection.apply(&action));
        assert!(!selection.is_selected("Name"));

        let action: SelectionAction = serde_json::from_str(r#"{"action":"select_all"}"#).unwrap();
        selection.apply(&action);
        assert!(selection.is_selected("Name"));
    }
}
