//! Spreadsheet output.
//!
//! Extraction and mapping results are first laid out into an in-memory
//! [`Workbook`] of string cells; a [`WorkbookWriter`] then serializes it.

mod layout;
mod xlsx;

pub use layout::{extraction_workbook, mapping_workbook, RAW_TABLES_SHEET};
pub use xlsx::XlsxWriter;

use std::path::Path;

use serde::Serialize;

use crate::error::Result;

/// Longest sheet name spreadsheet applications accept.
pub const MAX_SHEET_NAME_LEN: usize = 31;

const FORBIDDEN_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Cell formatting of a sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetStyle {
    /// No cell formatting
    #[default]
    Plain,
    /// Thin borders, wrapped text, top-left alignment
    Bordered,
}

/// One worksheet of string cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sheet {
    /// Sanitized, workbook-unique name
    pub name: String,
    /// Rows of cells, row 1 first
    pub rows: Vec<Vec<String>>,
    /// Cell formatting
    pub style: SheetStyle,
}

impl Sheet {
    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Widest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cell text at a 0-based position; missing cells read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map_or("", String::as_str)
    }
}

/// An ordered set of uniquely named sheets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Workbook {
    /// Sheets in tab order
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Create an empty workbook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet; the name is sanitized and made unique.
    ///
    /// Returns the final sheet name.
    pub fn add_sheet(&mut self, name: &str, rows: Vec<Vec<String>>, style: SheetStyle) -> &str {
        let name = unique_sheet_name(name, self.sheets.iter().map(|s| s.name.as_str()));
        self.sheets.push(Sheet { name, rows, style });
        self.sheets.last().map_or("", |s| s.name.as_str())
    }

    /// Find a sheet by exact name.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Sheet names in tab order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Number of sheets.
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Check if the workbook has no sheets.
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

/// Serializes a workbook to a file.
pub trait WorkbookWriter {
    /// Write the workbook to `path`, replacing any existing file.
    fn write(&self, workbook: &Workbook, path: &Path) -> Result<()>;
}

/// Remove forbidden characters, trim, bound the length, never empty.
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !FORBIDDEN_SHEET_CHARS.contains(c) && !c.is_control())
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'').trim();
    let truncated: String = cleaned.chars().take(MAX_SHEET_NAME_LEN).collect();
    let truncated = truncated.trim_end();
    if truncated.is_empty() {
        "Sheet".to_string()
    } else {
        truncated.to_string()
    }
}

/// Sanitized name that differs case-insensitively from all `existing` names.
pub fn unique_sheet_name<'a>(name: &str, existing: impl Iterator<Item = &'a str>) -> String {
    let taken: Vec<String> = existing.map(str::to_lowercase).collect();
    let base = sanitize_sheet_name(name);
    if !taken.contains(&base.to_lowercase()) {
        return base;
    }
    (2..)
        .map(|n| {
            let suffix = format!(" ({})", n);
            let room = MAX_SHEET_NAME_LEN.saturating_sub(suffix.chars().count());
            let stem: String = base.chars().take(room).collect();
            format!("{}{}", stem.trim_end(), suffix)
        })
        .find(|candidate| !taken.contains(&candidate.to_lowercase()))
        .unwrap_or_else(|| base.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("3.1 Scope: [draft]"), "3.1 Scope draft");
        assert_eq!(sanitize_sheet_name("a/b\\c?*"), "abc");
        assert_eq!(sanitize_sheet_name("  "), "Sheet");
        assert_eq!(sanitize_sheet_name("'quoted'"), "quoted");
        let long = "x".repeat(40);
        assert_eq!(sanitize_sheet_name(&long).len(), MAX_SHEET_NAME_LEN);
    }

    #[test]
    fn test_unique_sheet_names() {
        let mut workbook = Workbook::new();
        workbook.add_sheet("Intro", Vec::new(), SheetStyle::Plain);
        workbook.add_sheet("intro", Vec::new(), SheetStyle::Plain);
        workbook.add_sheet("INTRO", Vec::new(), SheetStyle::Plain);
        assert_eq!(workbook.sheet_names(), vec!["Intro", "intro (2)", "INTRO (3)"]);
    }

    #[test]
    fn test_unique_name_respects_length() {
        let long = "y".repeat(31);
        let name = unique_sheet_name(&long, [long.as_str()].into_iter());
        assert_eq!(name.chars().count(), MAX_SHEET_NAME_LEN);
        assert!(name.ends_with(" (2)"));
    }

    #[test]
    fn test_sheet_cell_lookup() {
        let sheet = Sheet {
            name: "S".into(),
            rows: vec![vec!["a".into()], vec![String::new(), "b".into()]],
            style: SheetStyle::Plain,
        };
        assert_eq!(sheet.cell(1, 1), "b");
        assert_eq!(sheet.cell(5, 5), "");
        assert_eq!(sheet.column_count(), 2);
    }
}
