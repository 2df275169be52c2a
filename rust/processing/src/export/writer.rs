// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Minimal SpreadsheetML writer: shared strings, one bold header style,
//! typed cells, and an in-memory zip package.

use super::{cell_ref, column_letter, sanitize_sheet_name, MAIN_NS, REL_NS};
use crate::error::ExportError;
use crate::table::{CellValue, Table};
use rustc_hash::FxHashMap;
use std::borrow::Cow;
use std::fmt::Write as FmtWrite;
use std::io::{Cursor, Write};
use zip::write::{SimpleFileOptions, ZipWriter};

/// Style index of the bold header font in `styles.xml`.
const HEADER_STYLE: u32 = 1;

const STYLES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<fonts count="2">"#,
    r#"<font><sz val="11"/><name val="Calibri"/><family val="2"/></font>"#,
    r#"<font><b/><sz val="11"/><name val="Calibri"/><family val="2"/></font>"#,
    r#"</fonts>"#,
    r#"<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#,
    r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
    r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    r#"<cellXfs count="2">"#,
    r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#,
    r#"<xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/>"#,
    r#"</cellXfs>"#,
    r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
    r#"</styleSheet>"#
);

const ROOT_RELS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    r#"</Relationships>"#
);

/// Escape XML special characters and drop characters XML 1.0 cannot carry.
pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => out.push(c),
        }
    }
    out
}

/// `true` when `s` starts with a literal `_xHHHH_` sequence.
pub(crate) fn starts_with_escape(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 7
        && b.starts_with(b"_x")
        && b[2..6].iter().all(u8::is_ascii_hexdigit)
        && b[6] == b'_'
}

/// Encode cell text with SpreadsheetML `_xHHHH_` escapes.
///
/// Control characters (including `\r`, which XML would normalize away) are
/// escaped, and an underscore opening a literal `_xHHHH_` becomes `_x005F_`,
/// so text survives a write and read unchanged.
pub(crate) fn encode_cell_text(s: &str) -> Cow<'_, str> {
    let escaped = |c: char| {
        (c < ' ' && c != '\t' && c != '\n') || c == '\u{FFFE}' || c == '\u{FFFF}'
    };
    if !s.chars().any(escaped) && !s.contains("_x") {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for (i, c) in s.char_indices() {
        if escaped(c) {
            out.push_str(&format!("_x{:04X}_", c as u32));
        } else if c == '_' && starts_with_escape(&s[i..]) {
            out.push_str("_x005F_");
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Shared strings table; each distinct string is stored once.
#[derive(Debug, Default)]
struct SharedStrings {
    strings: Vec<String>,
    index: FxHashMap<String, usize>,
    /// Total references, including repeats
    count: usize,
}

impl SharedStrings {
    fn add(&mut self, s: &str) -> usize {
        self.count += 1;
        if let Some(&i) = self.index.get(s) {
            return i;
        }
        let i = self.strings.len();
        self.strings.push(s.to_string());
        self.index.insert(s.to_string(), i);
        i
    }

    fn to_xml(&self) -> Result<String, ExportError> {
        let mut xml = String::with_capacity(64 + self.strings.len() * 32);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        write!(
            xml,
            r#"<sst xmlns="{}" count="{}" uniqueCount="{}">"#,
            MAIN_NS,
            self.count,
            self.strings.len()
        )
        .map_err(ExportError::xml)?;
        for s in &self.strings {
            write!(xml, r#"<si><t xml:space="preserve">{}</t></si>"#, escape_xml(&encode_cell_text(s)))
                .map_err(ExportError::xml)?;
        }
        xml.push_str("</sst>");
        Ok(xml)
    }
}

/// Workbook under construction. Sheets are written in the order added.
#[derive(Debug, Default)]
pub struct WorkbookWriter {
    /// (sheet name, worksheet xml)
    sheets: Vec<(String, String)>,
    strings: SharedStrings,
}

impl WorkbookWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Add `table` as a sheet: header row in bold, then one row per table row.
    ///
    /// The name is sanitized and made unique within the workbook; the final
    /// name is returned.
    pub fn add_sheet(&mut self, name: &str, table: &Table) -> Result<String, ExportError> {
        let name = self.unique_sheet_name(name);
        let xml = self.sheet_xml(table)?;
        self.sheets.push((name.clone(), xml));
        Ok(name)
    }

    /// Zip every part into an `.xlsx` byte buffer.
    pub fn finish(self) -> Result<Vec<u8>, ExportError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut add = |path: &str, content: &str| -> Result<(), ExportError> {
            zip.start_file(path, options)?;
            zip.write_all(content.as_bytes())?;
            Ok(())
        };

        add("[Content_Types].xml", &self.content_types_xml())?;
        add("_rels/.rels", ROOT_RELS_XML)?;
        add("xl/workbook.xml", &self.workbook_xml()?)?;
        add("xl/_rels/workbook.xml.rels", &self.workbook_rels_xml()?)?;
        for (i, (_, xml)) in self.sheets.iter().enumerate() {
            add(&format!("xl/worksheets/sheet{}.xml", i + 1), xml)?;
        }
        add("xl/styles.xml", STYLES_XML)?;
        add("xl/sharedStrings.xml", &self.strings.to_xml()?)?;

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    fn unique_sheet_name(&self, requested: &str) -> String {
        let base = sanitize_sheet_name(requested);
        let taken = |candidate: &str| {
            self.sheets
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case(candidate))
        };
        if !taken(&base) {
            return base;
        }
        (2..)
            .map(|n| {
                let suffix = format!(" ({})", n);
                let keep = super::MAX_SHEET_NAME_CHARS - suffix.chars().count();
                let stem: String = base.chars().take(keep).collect();
                format!("{}{}", stem, suffix)
            })
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.clone())
    }

    fn sheet_xml(&mut self, table: &Table) -> Result<String, ExportError> {
        let width = table.column_count();
        let height = table.row_count() + 1;
        let mut xml = String::with_capacity(256 + height * width * 24);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        write!(xml, r#"<worksheet xmlns="{}" xmlns:r="{}">"#, MAIN_NS, REL_NS)
            .map_err(ExportError::xml)?;

        if width == 0 {
            xml.push_str(r#"<dimension ref="A1"/><sheetData/></worksheet>"#);
            return Ok(xml);
        }

        let range = format!("A1:{}", cell_ref(height - 1, width - 1));
        write!(xml, r#"<dimension ref="{}"/>"#, range).map_err(ExportError::xml)?;
        xml.push_str(concat!(
            r#"<sheetViews><sheetView workbookViewId="0">"#,
            r#"<pane ySplit="1" topLeftCell="A2" activePane="bottomLeft" state="frozen"/>"#,
            r#"<selection pane="bottomLeft"/>"#,
            r#"</sheetView></sheetViews>"#
        ));
        xml.push_str(r#"<sheetFormatPr defaultRowHeight="15"/><sheetData>"#);

        xml.push_str(r#"<row r="1">"#);
        for (col, name) in table.columns().iter().enumerate() {
            let index = self.strings.add(name);
            write!(
                xml,
                r#"<c r="{}{}" s="{}" t="s"><v>{}</v></c>"#,
                column_letter(col),
                1,
                HEADER_STYLE,
                index
            )
            .map_err(ExportError::xml)?;
        }
        xml.push_str("</row>");

        for (i, row) in table.rows().iter().enumerate() {
            write!(xml, r#"<row r="{}">"#, i + 2).map_err(ExportError::xml)?;
            for (col, cell) in row.iter().enumerate() {
                self.write_cell(&mut xml, &cell_ref(i + 1, col), cell)?;
            }
            xml.push_str("</row>");
        }

        write!(xml, r#"</sheetData><autoFilter ref="{}"/></worksheet>"#, range)
            .map_err(ExportError::xml)?;
        Ok(xml)
    }

    fn write_cell(&mut self, xml: &mut String, at: &str, cell: &CellValue) -> Result<(), ExportError> {
        let written = match cell {
            CellValue::Null => Ok(()),
            CellValue::Integer(i) => write!(xml, r#"<c r="{}"><v>{}</v></c>"#, at, i),
            CellValue::Number(n) if n.is_finite() => {
                write!(xml, r#"<c r="{}"><v>{}</v></c>"#, at, n)
            }
            CellValue::Boolean(b) => {
                write!(xml, r#"<c r="{}" t="b"><v>{}</v></c>"#, at, u8::from(*b))
            }
            // text, plus NaN/inf which have no numeric cell form
            other => {
                let index = self.strings.add(&other.to_string());
                write!(xml, r#"<c r="{}" t="s"><v>{}</v></c>"#, at, index)
            }
        };
        written.map_err(ExportError::xml)
    }

    fn content_types_xml(&self) -> String {
        let mut xml = String::from(concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
        ));
        for i in 1..=self.sheets.len() {
            xml.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i
            ));
        }
        xml.push_str(concat!(
            r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
            r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#,
            r#"</Types>"#
        ));
        xml
    }

    fn workbook_xml(&self) -> Result<String, ExportError> {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        write!(xml, r#"<workbook xmlns="{}" xmlns:r="{}"><sheets>"#, MAIN_NS, REL_NS)
            .map_err(ExportError::xml)?;
        for (i, (name, _)) in self.sheets.iter().enumerate() {
            write!(
                xml,
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape_xml(name),
                i + 1,
                i + 1
            )
            .map_err(ExportError::xml)?;
        }
        xml.push_str("</sheets></workbook>");
        Ok(xml)
    }

    fn workbook_rels_xml(&self) -> Result<String, ExportError> {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        let sheets = self.sheets.len();
        for i in 1..=sheets {
            write!(
                xml,
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i, i
            )
            .map_err(ExportError::xml)?;
        }
        write!(
            xml,
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
            sheets + 1
        )
        .map_err(ExportError::xml)?;
        write!(
            xml,
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
            sheets + 2
        )
        .map_err(ExportError::xml)?;
        xml.push_str("</Relationships>");
        Ok(xml)
    }
}
