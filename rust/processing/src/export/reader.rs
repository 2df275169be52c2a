// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read an xlsx workbook back into tables, first row as header.

use super::column_from_letters;
use super::writer::starts_with_escape;
use crate::error::ExportError;
use crate::table::{CellValue, Table};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rustc_hash::FxHashMap;
use std::borrow::Cow;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// One worksheet as a table.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookSheet {
    pub name: String,
    pub table: Table,
}

/// Every sheet of the workbook, in workbook order.
pub fn read_workbook(bytes: &[u8]) -> Result<Vec<WorkbookSheet>, ExportError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let workbook = read_part(&mut archive, "xl/workbook.xml")?;
    let rels = read_part(&mut archive, "xl/_rels/workbook.xml.rels")?;
    let targets = parse_relationships(&rels)?;
    let shared = match read_part(&mut archive, "xl/sharedStrings.xml") {
        Ok(xml) => parse_shared_strings(&xml)?,
        Err(ExportError::Zip(zip::result::ZipError::FileNotFound)) => Vec::new(),
        Err(e) => return Err(e),
    };

    parse_sheet_list(&workbook)?
        .into_iter()
        .map(|(name, rel_id)| -> Result<WorkbookSheet, ExportError> {
            let target = targets
                .get(&rel_id)
                .ok_or_else(|| ExportError::Malformed(format!("no relationship {}", rel_id)))?;
            let xml = read_part(&mut archive, &part_path(target))?;
            Ok(WorkbookSheet {
                name,
                table: parse_sheet(&xml, &shared)?,
            })
        })
        .collect()
}

/// The first sheet of the workbook.
pub fn read_first_sheet(bytes: &[u8]) -> Result<Table, ExportError> {
    read_workbook(bytes)?
        .into_iter()
        .next()
        .map(|sheet| sheet.table)
        .ok_or_else(|| ExportError::Malformed("workbook has no sheets".to_string()))
}

fn read_part<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<String, ExportError> {
    let mut file = archive.by_name(path)?;
    let mut xml = String::new();
    file.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Relationship targets are relative to `xl/` unless absolute.
fn part_path(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    }
}

fn attribute(e: &BytesStart, local: &[u8]) -> Result<Option<String>, ExportError> {
    for attr in e.attributes() {
        let attr = attr.map_err(ExportError::xml)?;
        if attr.key.local_name().as_ref() == local {
            return Ok(Some(attr.unescape_value().map_err(ExportError::xml)?.into_owned()));
        }
    }
    Ok(None)
}

/// `(sheet name, relationship id)` pairs from `workbook.xml`.
fn parse_sheet_list(xml: &str) -> Result<Vec<(String, String)>, ExportError> {
    let mut reader = Reader::from_str(xml);
    let mut sheets = Vec::new();
    loop {
        match reader.read_event().map_err(ExportError::xml)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let name = attribute(&e, b"name")?.unwrap_or_default();
                let id = attribute(&e, b"id")?
                    .ok_or_else(|| ExportError::Malformed(format!("sheet {} has no r:id", name)))?;
                sheets.push((name, id));
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(sheets)
}

fn parse_relationships(xml: &str) -> Result<FxHashMap<String, String>, ExportError> {
    let mut reader = Reader::from_str(xml);
    let mut targets = FxHashMap::default();
    loop {
        match reader.read_event().map_err(ExportError::xml)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (attribute(&e, b"Id")?, attribute(&e, b"Target")?) {
                    targets.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(targets)
}

/// Shared strings; rich-text runs are concatenated.
fn parse_shared_strings(xml: &str) -> Result<Vec<String>, ExportError> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    loop {
        match reader.read_event().map_err(ExportError::xml)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(t) if in_text => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&t.unescape().map_err(ExportError::xml)?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"si" => strings.extend(current.take()),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(strings)
}

/// Cell being read.
#[derive(Default)]
struct PendingCell {
    column: usize,
    kind: Option<String>,
    text: String,
}

fn parse_sheet(xml: &str, shared: &[String]) -> Result<Table, ExportError> {
    let mut reader = Reader::from_str(xml);
    let mut grid: Vec<Vec<CellValue>> = Vec::new();
    let mut row: usize = 0;
    let mut next_row: usize = 0;
    let mut next_column: usize = 0;
    let mut cell: Option<PendingCell> = None;
    let mut in_value = false;

    loop {
        match reader.read_event().map_err(ExportError::xml)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => {
                    row = row_number(&e)?.unwrap_or(next_row);
                    next_row = row + 1;
                    next_column = 0;
                }
                b"c" => {
                    let pending = pending_cell(&e, next_column)?;
                    next_column = pending.column + 1;
                    cell = Some(pending);
                }
                b"v" | b"t" => in_value = cell.is_some(),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => {
                    row = row_number(&e)?.unwrap_or(next_row);
                    next_row = row + 1;
                }
                b"c" => next_column = pending_cell(&e, next_column)?.column + 1,
                _ => {}
            },
            Event::Text(t) if in_value => {
                if let Some(pending) = cell.as_mut() {
                    pending.text.push_str(&t.unescape().map_err(ExportError::xml)?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    if let Some(pending) = cell.take() {
                        place(&mut grid, row, pending.column, cell_value(&pending, shared)?);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(grid_to_table(grid))
}

/// Zero-based row index from the `r` attribute.
fn row_number(e: &BytesStart) -> Result<Option<usize>, ExportError> {
    Ok(attribute(e, b"r")?
        .and_then(|r| r.parse::<usize>().ok())
        .and_then(|r| r.checked_sub(1)))
}

fn pending_cell(e: &BytesStart, fallback_column: usize) -> Result<PendingCell, ExportError> {
    let column = attribute(e, b"r")?
        .and_then(|r| {
            let letters: String = r.chars().take_while(char::is_ascii_alphabetic).collect();
            column_from_letters(&letters)
        })
        .unwrap_or(fallback_column);
    Ok(PendingCell {
        column,
        kind: attribute(e, b"t")?,
        text: String::new(),
    })
}

fn cell_value(cell: &PendingCell, shared: &[String]) -> Result<CellValue, ExportError> {
    let text = cell.text.as_str();
    let value = match cell.kind.as_deref() {
        Some("s") => {
            let index: usize = text
                .trim()
                .parse()
                .map_err(|_| ExportError::Malformed(format!("bad shared string index {:?}", text)))?;
            let s = shared
                .get(index)
                .ok_or_else(|| ExportError::Malformed(format!("shared string {} missing", index)))?;
            CellValue::Text(decode_cell_text(s).into_owned())
        }
        Some("b") => CellValue::Boolean(text.trim() == "1"),
        Some("str") | Some("inlineStr") | Some("e") => {
            CellValue::Text(decode_cell_text(text).into_owned())
        }
        _ => number_value(text.trim()),
    };
    Ok(value)
}

/// Undo `_xHHHH_` escapes; sequences that do not name a character stay as is.
fn decode_cell_text(s: &str) -> Cow<'_, str> {
    if !s.contains("_x") {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find("_x") {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let decoded = starts_with_escape(tail)
            .then(|| u32::from_str_radix(&tail[2..6], 16).ok())
            .flatten()
            .and_then(char::from_u32);
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[7..];
            }
            None => {
                out.push_str("_x");
                rest = &tail[2..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn number_value(text: &str) -> CellValue {
    if text.is_empty() {
        return CellValue::Null;
    }
    if !text.contains(['.', 'e', 'E']) {
        if let Ok(i) = text.parse::<i64>() {
            return CellValue::Integer(i);
        }
    }
    text.parse::<f64>()
        .map(CellValue::Number)
        .unwrap_or_else(|_| CellValue::Text(text.to_string()))
}

fn place(grid: &mut Vec<Vec<CellValue>>, row: usize, column: usize, value: CellValue) {
    if grid.len() <= row {
        grid.resize_with(row + 1, Vec::new);
    }
    let cells = &mut grid[row];
    if cells.len() <= column {
        cells.resize(column + 1, CellValue::Null);
    }
    cells[column] = value;
}

/// First row becomes the header; other rows are padded or cut to its width.
fn grid_to_table(grid: Vec<Vec<CellValue>>) -> Table {
    let mut rows = grid.into_iter();
    let Some(header) = rows.next() else {
        return Table::default();
    };
    let columns: Vec<String> = header.iter().map(ToString::to_string).collect();
    let width = columns.len();
    let body = rows
        .map(|mut row| {
            row.resize(width, CellValue::Null);
            row
        })
        .collect();
    Table::from_parts(columns, body)
}
