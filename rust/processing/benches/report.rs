// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Benchmarks for table unification and unique-value matrix construction.
//!
//! Run with: cargo bench -p ifc-report-processing --bench report

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ifc_report_processing::{export_report, unify_tables, CellValue, Table, UniqueValueMatrix};

const ELEMENT_TYPES: [&str; 6] = ["IfcWall", "IfcDoor", "IfcWindow", "IfcSlab", "IfcBeam", "IfcColumn"];

/// Synthetic per-file element tables with partly overlapping property columns.
fn generate_files(file_count: usize, rows_per_file: usize) -> Vec<(String, Table)> {
    (0..file_count)
        .map(|f| {
            let extra = format!("Pset_File{}.Note", f % 3);
            let mut table = Table::new([
                "GUID",
                "Type",
                "Pset_WallCommon.FireRating",
                "Qto_Base.Height",
                extra.as_str(),
            ]);
            for r in 0..rows_per_file {
                table
                    .push_row(vec![
                        CellValue::Text(format!("{:08}-{:06}", f, r)),
                        CellValue::from(ELEMENT_TYPES[r % ELEMENT_TYPES.len()]),
                        CellValue::Text(format!("EI{}", 30 * (r % 4))),
                        CellValue::Number((r % 50) as f64 * 0.1),
                        if r % 5 == 0 { CellValue::Null } else { CellValue::Integer(r as i64) },
                    ])
                    .expect("row width matches header");
            }
            (format!("model_{}.ifc", f), table)
        })
        .collect()
}

fn bench_unify(c: &mut Criterion) {
    let mut group = c.benchmark_group("unify");
    for &(files, rows) in &[(2, 1_000), (10, 5_000), (20, 20_000)] {
        let inputs = generate_files(files, rows);
        group.throughput(Throughput::Elements((files * rows) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", files, rows)),
            &inputs,
            |b, inputs| {
                b.iter(|| {
                    let unified =
                        unify_tables(inputs.iter().map(|(name, t)| (name.as_str(), Some(t))));
                    black_box(unified.row_count())
                })
            },
        );
    }
    group.finish();
}

fn bench_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrix");
    let inputs = generate_files(10, 5_000);
    let unified = unify_tables(inputs.iter().map(|(name, t)| (name.as_str(), Some(t))));

    for column in ["Type", "Pset_WallCommon.FireRating", "Qto_Base.Height", "GUID"] {
        group.bench_with_input(BenchmarkId::from_parameter(column), column, |b, column| {
            b.iter(|| {
                let matrix = UniqueValueMatrix::build(&unified.table, column)
                    .expect("column exists");
                black_box(matrix.height)
            })
        });
    }
    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let inputs = generate_files(4, 5_000);
    let unified = unify_tables(inputs.iter().map(|(name, t)| (name.as_str(), Some(t))));
    let matrix = UniqueValueMatrix::build(&unified.table, "Type").expect("column exists");

    c.bench_function("export_20k_rows", |b| {
        b.iter(|| {
            let workbook = export_report(&unified.table, Some(&matrix), "bench.xlsx")
                .expect("in-memory export");
            black_box(workbook.bytes.len())
        })
    });
}

criterion_group!(benches, bench_unify, bench_matrix, bench_export);
criterion_main!(benches);
