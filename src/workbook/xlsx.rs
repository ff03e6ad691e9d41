//! Minimal SpreadsheetML (XLSX) writer.
//!
//! Cells are written as inline strings, so no shared string table is needed.
//! The stylesheet carries a single extra cell format: thin borders, wrapped
//! text, top-left alignment.

use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;

use log::{debug, warn};
use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{Sheet, SheetStyle, Workbook, WorkbookWriter};
use crate::error::{Error, Result};

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Style index of the bordered cell format in `styles.xml`.
const BORDERED_XF: usize = 1;

/// Column width used on bordered sheets.
const BORDERED_COL_WIDTH: f64 = 30.0;

/// Most characters a spreadsheet cell holds.
pub const MAX_CELL_CHARS: usize = 32_767;

/// Writes workbooks as `.xlsx` packages.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxWriter;

impl XlsxWriter {
    /// Create a writer.
    pub fn new() -> Self {
        Self
    }

    /// Serialize a workbook into memory.
    pub fn to_bytes(&self, workbook: &Workbook) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        self.write_to(workbook, &mut buffer)?;
        Ok(buffer.into_inner())
    }

    /// Serialize a workbook into any seekable sink.
    pub fn write_to<W: Write + Seek>(&self, workbook: &Workbook, sink: W) -> Result<()> {
        if workbook.is_empty() {
            return Err(Error::Render("workbook has no sheets".into()));
        }

        let mut zip = ZipWriter::new(sink);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut put = |name: &str, body: String| -> Result<()> {
            zip.start_file(name, options)?;
            zip.write_all(body.as_bytes())?;
            Ok(())
        };

        put("[Content_Types].xml", content_types(workbook.sheet_count()))?;
        put("_rels/.rels", root_rels())?;
        put("xl/workbook.xml", workbook_xml(workbook))?;
        put("xl/_rels/workbook.xml.rels", workbook_rels(workbook.sheet_count()))?;
        put("xl/styles.xml", styles_xml())?;
        for (idx, sheet) in workbook.sheets.iter().enumerate() {
            put(&format!("xl/worksheets/sheet{}.xml", idx + 1), sheet_xml(sheet))?;
        }

        zip.finish()?;
        Ok(())
    }
}

impl WorkbookWriter for XlsxWriter {
    fn write(&self, workbook: &Workbook, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        self.write_to(workbook, BufWriter::new(file))?;
        debug!(
            "Wrote {} sheets to {}",
            workbook.sheet_count(),
            path.display()
        );
        Ok(())
    }
}

/// Spreadsheet column letters for a 0-based index: 0 → `A`, 26 → `AA`.
pub fn column_name(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().map(|&b| b as char).collect()
}

/// Escape text for XML, dropping characters XML 1.0 cannot carry.
fn xml_text(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|&c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect();
    escape(cleaned.as_str()).into_owned()
}

/// Cut text longer than a cell can hold.
fn clamp_cell<'a>(text: &'a str, reference: &str) -> &'a str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => {
            warn!("cell {} truncated to {} characters", reference, MAX_CELL_CHARS);
            &text[..end]
        }
        None => text,
    }
}

fn content_types(sheet_count: usize) -> String {
    let mut xml = String::from(XML_HEADER);
    xml.push_str(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    );
    xml.push_str(
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    );
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(
        r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    );
    xml.push_str(
        r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
    );
    for n in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            n
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn root_rels() -> String {
    format!(
        r#"{}<Relationships xmlns="{}"><Relationship Id="rId1" Type="{}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        XML_HEADER, PKG_REL_NS, REL_NS
    )
}

fn workbook_xml(workbook: &Workbook) -> String {
    let mut xml = format!(
        r#"{}<workbook xmlns="{}" xmlns:r="{}"><sheets>"#,
        XML_HEADER, MAIN_NS, REL_NS
    );
    for (idx, sheet) in workbook.sheets.iter().enumerate() {
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            xml_text(&sheet.name),
            idx + 1,
            idx + 1
        ));
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn workbook_rels(sheet_count: usize) -> String {
    let mut xml = format!(r#"{}<Relationships xmlns="{}">"#, XML_HEADER, PKG_REL_NS);
    for n in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{}/worksheet" Target="worksheets/sheet{}.xml"/>"#,
            n, REL_NS, n
        ));
    }
    xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="{}/styles" Target="styles.xml"/>"#,
        sheet_count + 1,
        REL_NS
    ));
    xml.push_str("</Relationships>");
    xml
}

fn styles_xml() -> String {
    format!(
        concat!(
            r#"{}<styleSheet xmlns="{}">"#,
            r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>"#,
            r#"<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#,
            r#"<borders count="2"><border><left/><right/><top/><bottom/><diagonal/></border>"#,
            r#"<border><left style="thin"/><right style="thin"/><top style="thin"/><bottom style="thin"/><diagonal/></border></borders>"#,
            r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
            r#"<cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#,
            r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="1" xfId="0" applyBorder="1" applyAlignment="1">"#,
            r#"<alignment horizontal="left" vertical="top" wrapText="1"/></xf></cellXfs>"#,
            r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
            r#"</styleSheet>"#
        ),
        XML_HEADER, MAIN_NS
    )
}

fn sheet_xml(sheet: &Sheet) -> String {
    let bordered = sheet.style == SheetStyle::Bordered;
    let width = sheet.column_count();

    let mut xml = format!(r#"{}<worksheet xmlns="{}">"#, XML_HEADER, MAIN_NS);
    if bordered && width > 0 {
        xml.push_str(&format!(
            r#"<cols><col min="1" max="{}" width="{}" customWidth="1"/></cols>"#,
            width, BORDERED_COL_WIDTH
        ));
    }
    xml.push_str("<sheetData>");

    for (r, row) in sheet.rows.iter().enumerate() {
        // Bordered sheets frame empty cells inside non-empty rows too.
        let has_text = row.iter().any(|cell| !cell.is_empty());
        if !has_text {
            continue;
        }
        let row_number = r + 1;
        xml.push_str(&format!(r#"<row r="{}">"#, row_number));
        for (c, value) in row.iter().enumerate() {
            let reference = format!("{}{}", column_name(c), row_number);
            match (value.is_empty(), bordered) {
                (true, false) => {}
                (true, true) => {
                    xml.push_str(&format!(r#"<c r="{}" s="{}"/>"#, reference, BORDERED_XF));
                }
                (false, _) => {
                    let style = if bordered {
                        format!(r#" s="{}""#, BORDERED_XF)
                    } else {
                        String::new()
                    };
                    xml.push_str(&format!(
                        r#"<c r="{}" t="inlineStr"{}><is><t xml:space="preserve">{}</t></is></c>"#,
                        reference,
                        style,
                        xml_text(clamp_cell(value, &reference))
                    ));
                }
            }
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}
