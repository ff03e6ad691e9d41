//! Sheet layouts for extraction and mapping results.

use super::{SheetStyle, Workbook};
use crate::extract::{Citations, ExtractOptions, ExtractedDocument, Item, DEFAULT_SECTION};
use crate::mapping::MappingOutcome;

/// Name of the sheet listing every table of a document as read.
pub const RAW_TABLES_SHEET: &str = "Raw Tables";

const START_MARKER: &str = "[Start]";

/// One sheet per section.
///
/// Blank items become empty rows; paragraphs are `label, text`; tables list
/// their rows with the label (and optional `[Start]` marker) on the first
/// row only. Citation columns trail each labelled row.
pub fn extraction_workbook(doc: &ExtractedDocument, options: &ExtractOptions) -> Workbook {
    let mut workbook = Workbook::new();

    for section in &doc.sections {
        let mut rows: Vec<Vec<String>> = Vec::new();
        for item in &section.items {
            match item {
                Item::Blank => rows.push(Vec::new()),
                Item::Paragraph {
                    label,
                    content,
                    citations,
                } => {
                    let mut row = vec![label.clone(), content.clone()];
                    if options.get_in_text_references {
                        row.extend(citation_columns(citations));
                    }
                    rows.push(row);
                }
                Item::Table {
                    label,
                    rows: cells,
                    citations,
                } => {
                    for (idx, cell_row) in cells.iter().enumerate() {
                        let first = idx == 0;
                        let mut row = Vec::with_capacity(cell_row.len() + 5);
                        row.push(if first { label.clone() } else { String::new() });
                        if options.table_start_marker {
                            row.push(if first {
                                START_MARKER.to_string()
                            } else {
                                String::new()
                            });
                        }
                        row.extend(cell_row.iter().map(|cell| cell.text.clone()));
                        if first && options.get_in_text_references {
                            row.extend(citation_columns(citations));
                        }
                        rows.push(row);
                    }
                    if cells.is_empty() {
                        rows.push(vec![label.clone()]);
                    }
                }
            }
        }
        workbook.add_sheet(&section.name, rows, SheetStyle::Plain);
    }

    if workbook.is_empty() {
        workbook.add_sheet(DEFAULT_SECTION, Vec::new(), SheetStyle::Plain);
    }
    workbook
}

fn citation_columns(citations: &Citations) -> [String; 3] {
    let (text, url) = match &citations.primary {
        Some(entry) => (entry.text.clone(), entry.url.clone().unwrap_or_default()),
        None => (String::new(), String::new()),
    };
    let others = citations
        .others
        .iter()
        .map(|entry| entry.text.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    [text, url, others]
}

/// Raw tables sheet plus one canonical sheet per selected table.
pub fn mapping_workbook(outcome: &MappingOutcome) -> Workbook {
    let mut workbook = Workbook::new();

    let mut raw: Vec<Vec<String>> = Vec::new();
    for (idx, grid) in outcome.grids.iter().enumerate() {
        raw.push(vec![format!("[Table{}]", idx + 1)]);
        raw.extend(grid.rows.iter().cloned());
        raw.push(Vec::new());
    }
    workbook.add_sheet(RAW_TABLES_SHEET, raw, SheetStyle::Bordered);

    for table in &outcome.mapped {
        let mut rows = Vec::with_capacity(table.rows.len() + 1);
        rows.push(table.headers.clone());
        rows.extend(table.rows.iter().cloned());
        workbook.add_sheet(
            &format!("Mapped {}", table.source_index + 1),
            rows,
            SheetStyle::Bordered,
        );
    }
    workbook
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{CellText, CitationEntry, Section};
    use crate::mapping::{map_tables, LeaveUnmapped, MappingOptions, MappingStore};
    use crate::model::Table;

    fn cell(text: &str) -> CellText {
        CellText {
            text: text.into(),
            ..CellText::default()
        }
    }

    fn sample() -> ExtractedDocument {
        let mut intro = Section::new("Intro");
        intro.items.push(Item::Blank);
        intro.items.push(Item::Paragraph {
            label: "[Paragraph1]".into(),
            content: "Hello".into(),
            citations: Citations {
                primary: Some(CitationEntry::from_text("Smith https://a.example")),
                others: vec![
                    CitationEntry::from_text("Jones"),
                    CitationEntry::from_text("Lee"),
                ],
            },
        });
        intro.items.push(Item::Table {
            label: "[Table1]".into(),
            rows: vec![vec![cell("a"), cell("b")], vec![cell("c"), cell("d")]],
            citations: Citations::none(),
        });
        ExtractedDocument {
            sections: vec![intro],
        }
    }

    #[test]
    fn test_extraction_layout_with_citations() {
        let workbook = extraction_workbook(&sample(), &ExtractOptions::default());
        let sheet = workbook.sheet("Intro").unwrap();

        assert!(sheet.rows[0].is_empty());
        assert_eq!(
            sheet.rows[1],
            vec!["[Paragraph1]", "Hello", "Smith https://a.example", "https://a.example", "Jones; Lee"]
        );
        assert_eq!(sheet.rows[2], vec!["[Table1]", "a", "b", "", "", ""]);
        assert_eq!(sheet.rows[3], vec!["", "c", "d"]);
    }

    #[test]
    fn test_extraction_layout_start_marker_no_citations() {
        let options = ExtractOptions::default()
            .with_references(false)
            .with_table_start_marker(true);
        let workbook = extraction_workbook(&sample(), &options);
        let sheet = workbook.sheet("Intro").unwrap();

        assert_eq!(sheet.rows[1], vec!["[Paragraph1]", "Hello"]);
        assert_eq!(sheet.rows[2], vec!["[Table1]", "[Start]", "a", "b"]);
        assert_eq!(sheet.rows[3], vec!["", "", "c", "d"]);
    }

    #[test]
    fn test_empty_extraction_has_one_sheet() {
        let workbook = extraction_workbook(&ExtractedDocument::default(), &ExtractOptions::default());
        assert_eq!(workbook.sheet_names(), vec![DEFAULT_SECTION]);
    }

    #[test]
    fn test_mapping_layout() {
        let table = Table::from_rows(vec![
            vec!["Chemical Name", "CAS #", "Function"],
            vec!["Water", "7732-18-5", "Solvent"],
        ]);
        let options = MappingOptions::default().with_min_table_score(0.0);
        let mut store = MappingStore::in_memory();
        let outcome = map_tables(&[&table], &options, &mut store, &mut LeaveUnmapped).unwrap();

        let workbook = mapping_workbook(&outcome);
        assert_eq!(workbook.sheet_names(), vec![RAW_TABLES_SHEET, "Mapped 1"]);

        let raw = workbook.sheet(RAW_TABLES_SHEET).unwrap();
        assert_eq!(raw.cell(0, 0), "[Table1]");
        assert_eq!(raw.cell(2, 1), "7732-18-5");
        assert_eq!(raw.style, SheetStyle::Bordered);

        let mapped = workbook.sheet("Mapped 1").unwrap();
        assert_eq!(mapped.cell(0, 0), "Chemical Name");
        assert_eq!(mapped.cell(1, 1), "7732-18-5");
        assert_eq!(mapped.cell(1, 4), "Solvent");
    }
}
