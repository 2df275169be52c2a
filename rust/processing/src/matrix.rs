// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Unique-value matrix - per-file sorted distinct values of one column,
//! padded into a rectangle.
//!
//! Rows of the matrix line up by position only. Row `i` of one file has no
//! relation to row `i` of another.

use crate::error::{ReportError, Result};
use crate::table::{CellValue, Table, ValueKind};
use crate::unify::SOURCE_FILE_COLUMN;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::cmp::Ordering;

/// Cell used to pad shorter value lists.
pub const PADDING: &str = "";

/// Ordering applied to one column, decided over all of its non-null values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortPolicy {
    /// Every value is an integer or a number
    Numeric,
    /// Every value is a boolean; `false < true`
    Boolean,
    /// Every value is text; byte-wise lexicographic
    Text,
    /// Mixed kinds; values are compared as their display strings
    Coerced,
}

impl SortPolicy {
    pub fn for_values<'a>(values: impl IntoIterator<Item = &'a CellValue>) -> Self {
        let mut seen: Option<ValueKind> = None;
        for value in values {
            match (seen, value.kind()) {
                (_, ValueKind::Null) => {}
                (None, kind) => seen = Some(kind),
                (Some(prev), kind) if prev == kind => {}
                _ => return SortPolicy::Coerced,
            }
        }
        match seen {
            Some(ValueKind::Numeric) => SortPolicy::Numeric,
            Some(ValueKind::Boolean) => SortPolicy::Boolean,
            _ => SortPolicy::Text,
        }
    }

    fn compare(self, a: &CellValue, b: &CellValue) -> Ordering {
        match (a, b) {
            (CellValue::Integer(x), CellValue::Integer(y)) => x.cmp(y),
            (CellValue::Number(x), CellValue::Number(y)) => float_key(*x).total_cmp(&float_key(*y)),
            (CellValue::Integer(x), CellValue::Number(y)) => compare_int_float(*x, *y),
            (CellValue::Number(x), CellValue::Integer(y)) => compare_int_float(*y, *x).reverse(),
            (CellValue::Boolean(x), CellValue::Boolean(y)) => x.cmp(y),
            (CellValue::Text(x), CellValue::Text(y)) => x.cmp(y),
            _ => Ordering::Equal,
        }
    }

    /// Drop nulls, apply the policy's coercion, sort ascending and dedupe.
    fn distinct_sorted<'a>(self, values: impl IntoIterator<Item = &'a CellValue>) -> Vec<CellValue> {
        let mut out: Vec<CellValue> = values
            .into_iter()
            .filter(|v| !v.is_null())
            .map(|v| match self {
                SortPolicy::Coerced => CellValue::Text(v.to_string()),
                _ => v.clone(),
            })
            .collect();
        out.sort_by(|a, b| self.compare(a, b));
        out.dedup_by(|a, b| self.compare(a, b) == Ordering::Equal);
        out
    }
}

/// `-0.0` and `0.0` are one value, as they are for integers.
fn float_key(f: f64) -> f64 {
    if f == 0.0 {
        0.0
    } else {
        f
    }
}

/// Exact comparison of an integer with a float, consistent with
/// `f64::total_cmp` for NaN: positive NaN sorts last, negative NaN first.
fn compare_int_float(i: i64, f: f64) -> Ordering {
    // 2^63, the first float above i64::MAX
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() {
        return if f.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if f >= LIMIT {
        return Ordering::Less;
    }
    if f < -LIMIT {
        return Ordering::Greater;
    }
    // in range, so the truncated float converts to i64 without loss
    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => {
            let fraction = f - whole;
            if fraction > 0.0 {
                Ordering::Less
            } else if fraction < 0.0 {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        }
        other => other,
    }
}

/// Distinct values found in one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileValues {
    pub file_name: String,
    /// Sorted distinct values, unpadded
    pub values: Vec<CellValue>,
}

impl FileValues {
    pub fn distinct_count(&self) -> usize {
        self.values.len()
    }
}

/// Per-file distinct values of a single column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UniqueValueMatrix {
    pub column: String,
    pub policy: SortPolicy,
    /// One entry per file, in order of first appearance
    pub files: Vec<FileValues>,
    /// Largest distinct count; every padded column has this length
    pub height: usize,
}

impl UniqueValueMatrix {
    /// Build the matrix for `column` over a unified table.
    pub fn build(table: &Table, column: &str) -> Result<Self> {
        let (value_index, source_index) = column_indices(table, column)?;

        let policy = SortPolicy::for_values(table.rows().iter().map(|row| &row[value_index]));

        let mut order: Vec<&str> = Vec::new();
        let mut groups: FxHashMap<&str, Vec<&CellValue>> = FxHashMap::default();
        for row in table.rows() {
            let file = match &row[source_index] {
                CellValue::Text(name) => name.as_str(),
                _ => PADDING,
            };
            groups
                .entry(file)
                .or_insert_with(|| {
                    order.push(file);
                    Vec::new()
                })
                .push(&row[value_index]);
        }

        let files: Vec<FileValues> = order
            .into_iter()
            .map(|file| FileValues {
                file_name: file.to_string(),
                values: policy.distinct_sorted(groups.remove(file).unwrap_or_default()),
            })
            .collect();
        let height = files.iter().map(FileValues::distinct_count).max().unwrap_or(0);

        tracing::debug!(
            column,
            files = files.len(),
            height,
            policy = ?policy,
            "Built unique-value matrix"
        );

        Ok(Self {
            column: column.to_string(),
            policy,
            files,
            height,
        })
    }

    /// Unpadded values for one file.
    pub fn values_for(&self, file_name: &str) -> Option<&[CellValue]> {
        self.files
            .iter()
            .find(|f| f.file_name == file_name)
            .map(|f| f.values.as_slice())
    }

    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.file_name.as_str())
    }

    /// Rectangular table: one column per file, shorter lists padded with `""`.
    pub fn to_table(&self) -> Table {
        let columns = self.files.iter().map(|f| f.file_name.clone()).collect();
        let rows = (0..self.height)
            .map(|i| {
                self.files
                    .iter()
                    .map(|f| {
                        f.values
                            .get(i)
                            .cloned()
                            .unwrap_or_else(|| CellValue::from(PADDING))
                    })
                    .collect()
            })
            .collect();
        Table::from_parts(columns, rows)
    }
}

/// Sorted distinct values of `column` across every file.
pub fn unique_values(table: &Table, column: &str) -> Result<Vec<CellValue>> {
    let index = table
        .column_index(column)
        .ok_or_else(|| ReportError::UnknownColumn(column.to_string()))?;
    if table.is_empty() {
        return Err(ReportError::NoData);
    }
    let values = || table.rows().iter().map(|row| &row[index]);
    Ok(SortPolicy::for_values(values()).distinct_sorted(values()))
}

fn column_indices(table: &Table, column: &str) -> Result<(usize, usize)> {
    if table.is_empty() {
        return Err(ReportError::NoData);
    }
    let value_index = table
        .column_index(column)
        .ok_or_else(|| ReportError::UnknownColumn(column.to_string()))?;
    let source_index = table
        .column_index(SOURCE_FILE_COLUMN)
        .ok_or_else(|| ReportError::UnknownColumn(SOURCE_FILE_COLUMN.to_string()))?;
    Ok((value_index, source_index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unify::unify_tables;

    fn unified(files: &[(&str, Vec<CellValue>)]) -> Table {
        let tables: Vec<(&str, Table)> = files
            .iter()
            .map(|(name, values)| {
                let mut table = Table::new(["Value"]);
                for value in values {
                    table.push_row(vec![value.clone()]).unwrap();
                }
                (*name, table)
            })
            .collect();
        unify_tables(tables.iter().map(|(name, t)| (*name, Some(t)))).table
    }

    fn texts(values: &[CellValue]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_type_scenario() {
        let mut a = Table::new(["GUID", "Type"]);
        a.push_row(vec!["1".into(), "Wall".into()]).unwrap();
        let mut b = Table::new(["GUID", "Type"]);
        b.push_row(vec!["2".into(), "Door".into()]).unwrap();
        let table = unify_tables([("A", Some(&a)), ("B", Some(&b))]).table;

        let matrix = UniqueValueMatrix::build(&table, "Type").unwrap();

        assert_eq!(matrix.height, 1);
        assert_eq!(matrix.values_for("A"), Some(&[CellValue::from("Wall")][..]));
        assert_eq!(matrix.values_for("B"), Some(&[CellValue::from("Door")][..]));
        let rect = matrix.to_table();
        assert_eq!(rect.columns(), ["A", "B"]);
        assert_eq!(rect.rows(), [vec![CellValue::from("Wall"), CellValue::from("Door")]]);
    }

    #[test]
    fn test_sorted_distinct_and_padded() {
        let table = unified(&[
            ("a.ifc", vec!["b".into(), "a".into(), "b".into(), CellValue::Null, "c".into()]),
            ("b.ifc", vec!["z".into(), CellValue::Null]),
        ]);

        let matrix = UniqueValueMatrix::build(&table, "Value").unwrap();

        assert_eq!(matrix.policy, SortPolicy::Text);
        assert_eq!(texts(matrix.values_for("a.ifc").unwrap()), ["a", "b", "c"]);
        assert_eq!(matrix.files[1].distinct_count(), 1);

        let rect = matrix.to_table();
        assert_eq!(rect.row_count(), 3);
        let b_column: Vec<&CellValue> = rect.column_values("b.ifc").unwrap().collect();
        assert_eq!(b_column, [&CellValue::from("z"), &CellValue::from(""), &CellValue::from("")]);
        assert!(rect.rows().iter().flatten().all(|cell| !cell.is_null()));
    }

    #[test]
    fn test_numeric_ordering() {
        let table = unified(&[(
            "a.ifc",
            vec![
                CellValue::Integer(10),
                CellValue::Number(2.5),
                CellValue::Integer(2),
                CellValue::Integer(10),
                CellValue::Integer(-1),
            ],
        )]);

        let matrix = UniqueValueMatrix::build(&table, "Value").unwrap();

        assert_eq!(matrix.policy, SortPolicy::Numeric);
        assert_eq!(
            matrix.values_for("a.ifc").unwrap(),
            [
                CellValue::Integer(-1),
                CellValue::Integer(2),
                CellValue::Number(2.5),
                CellValue::Integer(10)
            ]
        );
    }

    #[test]
    fn test_mixed_kinds_are_coerced_across_files() {
        let table = unified(&[
            ("a.ifc", vec![CellValue::Integer(10), CellValue::Integer(9)]),
            ("b.ifc", vec!["EI30".into(), true.into()]),
        ]);

        let matrix = UniqueValueMatrix::build(&table, "Value").unwrap();

        assert_eq!(matrix.policy, SortPolicy::Coerced);
        // string order, so "10" sorts before "9"
        assert_eq!(
            matrix.values_for("a.ifc").unwrap(),
            [CellValue::from("10"), CellValue::from("9")]
        );
        assert_eq!(texts(matrix.values_for("b.ifc").unwrap()), ["EI30", "true"]);
    }

    #[test]
    fn test_large_integers_mixed_with_floats() {
        let base = 1i64 << 53;
        let values: Vec<CellValue> = (0..64)
            .flat_map(|k| {
                let v = base + 2 * k;
                [
                    CellValue::Integer(v + 1),
                    CellValue::Number(v as f64),
                    CellValue::Integer(v),
                ]
            })
            .collect();
        let table = unified(&[("a.ifc", values)]);

        let matrix = UniqueValueMatrix::build(&table, "Value").unwrap();

        // Number(v) and Integer(v) are the same value and collapse into one
        let sorted = matrix.values_for("a.ifc").unwrap();
        assert_eq!(sorted.len(), 128);
        assert!(sorted
            .windows(2)
            .all(|w| SortPolicy::Numeric.compare(&w[0], &w[1]) == Ordering::Less));
        assert_eq!(sorted[0], CellValue::Number(base as f64));
        assert_eq!(sorted[1], CellValue::Integer(base + 1));
    }

    #[test]
    fn test_integer_float_comparison() {
        use Ordering::*;
        let two_53 = 1i64 << 53;
        assert_eq!(compare_int_float(2, 2.0), Equal);
        assert_eq!(compare_int_float(2, 2.5), Less);
        assert_eq!(compare_int_float(-2, -2.5), Greater);
        assert_eq!(compare_int_float(0, -0.0), Equal);
        assert_eq!(compare_int_float(two_53 + 1, two_53 as f64), Greater);
        assert_eq!(compare_int_float(i64::MAX, 9.3e18), Less);
        assert_eq!(compare_int_float(i64::MIN, -9_223_372_036_854_775_808.0), Equal);
        assert_eq!(compare_int_float(i64::MAX, f64::INFINITY), Less);
        assert_eq!(compare_int_float(i64::MIN, f64::NEG_INFINITY), Greater);
        assert_eq!(compare_int_float(0, f64::NAN), Less);
        assert_eq!(
            SortPolicy::Numeric.compare(&CellValue::Number(-0.0), &CellValue::Number(0.0)),
            Equal
        );
    }

    #[test]
    fn test_booleans() {
        let table = unified(&[("a.ifc", vec![true.into(), false.into(), true.into()])]);
        let matrix = UniqueValueMatrix::build(&table, "Value").unwrap();
        assert_eq!(
            matrix.values_for("a.ifc").unwrap(),
            [CellValue::Boolean(false), CellValue::Boolean(true)]
        );
    }

    #[test]
    fn test_all_null_file_keeps_its_column() {
        let table = unified(&[
            ("a.ifc", vec!["x".into()]),
            ("b.ifc", vec![CellValue::Null, CellValue::Null]),
        ]);
        let matrix = UniqueValueMatrix::build(&table, "Value").unwrap();
        let rect = matrix.to_table();
        assert_eq!(rect.columns(), ["a.ifc", "b.ifc"]);
        assert_eq!(rect.cell(0, "b.ifc"), Some(&CellValue::from(PADDING)));
    }

    #[test]
    fn test_errors() {
        let table = unified(&[("a.ifc", vec!["x".into()])]);
        assert!(matches!(
            UniqueValueMatrix::build(&table, "Missing"),
            Err(ReportError::UnknownColumn(c)) if c == "Missing"
        ));
        assert!(matches!(
            UniqueValueMatrix::build(&Table::default(), "Value"),
            Err(ReportError::NoData)
        ));
    }

    #[test]
    fn test_global_unique_values() {
        let table = unified(&[
            ("a.ifc", vec!["Wall".into(), "Door".into()]),
            ("b.ifc", vec!["Door".into(), "Slab".into()]),
        ]);
        let values = unique_values(&table, "Value").unwrap();
        assert_eq!(texts(&values), ["Door", "Slab", "Wall"]);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::unify::unify_tables;
    use proptest::prelude::*;

    const TWO_53: i64 = 1 << 53;

    fn cell_strategy() -> impl Strategy<Value = CellValue> {
        prop_oneof![
            Just(CellValue::Null),
            any::<bool>().prop_map(CellValue::Boolean),
            any::<i64>().prop_map(CellValue::Integer),
            any::<f64>().prop_map(CellValue::Number),
            "[a-c]{0,2}".prop_map(CellValue::Text),
        ]
    }

    /// Integers and floats crowded around the edge of exact f64 integers.
    fn numeric_strategy() -> impl Strategy<Value = CellValue> {
        prop_oneof![
            (TWO_53 - 4..TWO_53 + 4).prop_map(CellValue::Integer),
            (TWO_53 - 4..TWO_53 + 4).prop_map(|i| CellValue::Number(i as f64)),
            (-3i64..3).prop_map(CellValue::Integer),
            (-3.0f64..3.0).prop_map(CellValue::Number),
            any::<i64>().prop_map(CellValue::Integer),
            any::<f64>().prop_map(CellValue::Number),
        ]
    }

    fn unified(files: &[Vec<CellValue>]) -> Table {
        let tables: Vec<(String, Table)> = files
            .iter()
            .enumerate()
            .map(|(i, values)| {
                let mut table = Table::new(["Value"]);
                for value in values {
                    table.push_row(vec![value.clone()]).unwrap();
                }
                (format!("file_{}.ifc", i), table)
            })
            .collect();
        unify_tables(tables.iter().map(|(name, t)| (name.as_str(), Some(t)))).table
    }

    fn check_matrix(files: &[Vec<CellValue>]) -> Result<(), TestCaseError> {
        let table = unified(files);
        let present: Vec<&Vec<CellValue>> = files.iter().filter(|f| !f.is_empty()).collect();
        if present.is_empty() {
            prop_assert!(matches!(
                UniqueValueMatrix::build(&table, "Value"),
                Err(ReportError::NoData)
            ));
            return Ok(());
        }

        let matrix = UniqueValueMatrix::build(&table, "Value").unwrap();
        let policy = matrix.policy;
        prop_assert_eq!(matrix.files.len(), present.len());

        for (file, input) in matrix.files.iter().zip(&present) {
            prop_assert!(file.values.iter().all(|v| !v.is_null()));
            for pair in file.values.windows(2) {
                prop_assert_eq!(policy.compare(&pair[0], &pair[1]), Ordering::Less);
            }
            for value in input.iter().filter(|v| !v.is_null()) {
                let value = match policy {
                    SortPolicy::Coerced => CellValue::Text(value.to_string()),
                    _ => value.clone(),
                };
                prop_assert!(file
                    .values
                    .iter()
                    .any(|v| policy.compare(v, &value) == Ordering::Equal));
            }
        }

        let height = matrix.files.iter().map(|f| f.values.len()).max().unwrap_or(0);
        prop_assert_eq!(matrix.height, height);
        let rect = matrix.to_table();
        prop_assert_eq!(rect.row_count(), height);
        for (column, file) in matrix.files.iter().enumerate() {
            for (i, row) in rect.rows().iter().enumerate() {
                prop_assert!(!row[column].is_null());
                if i >= file.values.len() {
                    prop_assert_eq!(&row[column], &CellValue::from(PADDING));
                }
            }
        }
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_matrix_over_mixed_values(
            files in prop::collection::vec(prop::collection::vec(cell_strategy(), 0..12), 0..4)
        ) {
            check_matrix(&files)?;
        }

        #[test]
        fn prop_matrix_over_numeric_values(
            files in prop::collection::vec(prop::collection::vec(numeric_strategy(), 0..40), 1..4)
        ) {
            check_matrix(&files)?;
        }

        #[test]
        fn prop_global_values_are_strictly_ascending(
            values in prop::collection::vec(numeric_strategy(), 1..60)
        ) {
            let table = unified(&[values]);
            let distinct = unique_values(&table, "Value").unwrap();
            prop_assert_eq!(SortPolicy::for_values(&distinct), SortPolicy::Numeric);
            for pair in distinct.windows(2) {
                prop_assert_eq!(SortPolicy::Numeric.compare(&pair[0], &pair[1]), Ordering::Less);
            }
        }
    }
}
