//! Section extraction.
//!
//! One linear pass over the document's blocks drives the section state
//! machine, the list numbering engine and the citation resolver, producing
//! an ordered list of sections ready for the workbook emitter.

pub mod citation;
pub mod numbering;
mod options;
pub mod section;

pub use citation::{CitationEntry, CitationResolver, Citations, ManualReferences, NoteMap};
pub use numbering::{ListNumber, NumberingState};
pub use options::{AllowedBlocks, ExtractOptions};
pub use section::{BlockKind, CellText, Item, Section, SectionBuilder, DEFAULT_SECTION};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::model::{
    Block, Document, InlineContent, MergeOrigin, NumberFormat, NumberingDefinitions, Paragraph,
    Table, TextRun,
};
use crate::normalize::normalize_whitespace;

/// Result of an extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// Sections in creation order
    pub sections: Vec<Section>,
}

impl ExtractedDocument {
    /// Find a section by name.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Number of sections.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Total number of items across all sections.
    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    /// Check if nothing was extracted.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Extract sections from a document.
pub fn extract(doc: &Document, options: &ExtractOptions) -> ExtractedDocument {
    Extractor::new(doc, options).run()
}

/// Walks a document's blocks in order.
pub struct Extractor<'a> {
    doc: &'a Document,
    options: &'a ExtractOptions,
    resolver: CitationResolver,
    numbering: NumberingState,
}

impl<'a> Extractor<'a> {
    /// Prepare an extraction pass; citation lookup tables are built once here.
    pub fn new(doc: &'a Document, options: &'a ExtractOptions) -> Self {
        let resolver = if options.get_in_text_references {
            CitationResolver::for_document(doc)
        } else {
            CitationResolver::default()
        };
        Self {
            doc,
            options,
            resolver,
            numbering: NumberingState::new(),
        }
    }

    /// Run the pass.
    pub fn run(mut self) -> ExtractedDocument {
        let doc = self.doc;
        let mut builder = SectionBuilder::new(self.options);

        for block in &doc.blocks {
            match block {
                Block::Paragraph(paragraph) => self.paragraph(paragraph, &mut builder),
                Block::Table(table) => self.table(table, &mut builder),
            }
        }

        let sections = builder.finish();
        debug!(
            "Extracted {} sections from {} blocks",
            sections.len(),
            doc.blocks.len()
        );
        ExtractedDocument { sections }
    }

    fn paragraph(&mut self, paragraph: &Paragraph, builder: &mut SectionBuilder<'_>) {
        let number = self.numbering.next_for(paragraph.style.numbering.as_ref());

        if paragraph.is_empty() {
            builder.blank();
            return;
        }

        let text = normalize_whitespace(&paragraph.plain_text());
        if let Some(name) = section::match_custom_header(&text, self.options) {
            builder.custom_header(&name);
            return;
        }

        if paragraph.is_heading() {
            let numbered = match (&number, self.list_format(paragraph)) {
                (Some(n), NumberFormat::Numbered) => format!("{} {}", n.text, text),
                _ => text.clone(),
            };
            builder.heading(&numbered, &text);
            return;
        }

        if !builder.allows(BlockKind::Paragraph) {
            return;
        }
        let content = format_paragraph(paragraph, number.as_ref(), &self.doc.numbering, self.options);
        let citations = self.citations(|r| r.resolve_paragraph(paragraph));
        builder.push_paragraph(content, citations);
    }

    fn table(&mut self, table: &Table, builder: &mut SectionBuilder<'_>) {
        // Cell numbering advances even when the table is dropped.
        let rows = self.table_cells(table);
        if !builder.allows(BlockKind::Table) {
            return;
        }
        let citations = self.citations(|r| r.resolve_table(table));
        builder.push_table(rows, citations);
    }

    fn table_cells(&mut self, table: &Table) -> Vec<Vec<CellText>> {
        let mut rows: Vec<Vec<CellText>> = Vec::with_capacity(table.rows.len());
        for (r, row) in table.rows.iter().enumerate() {
            let mut cells: Vec<CellText> = Vec::with_capacity(row.cells.len());
            for (c, cell) in row.cells.iter().enumerate() {
                let origin = match cell.merged_from {
                    Some(MergeOrigin::Left) if c > 0 => cells.get(c - 1),
                    Some(MergeOrigin::Above) if r > 0 => rows[r - 1].get(c),
                    _ => None,
                };
                let text = match origin {
                    Some(origin) => origin.clone(),
                    None => self.cell_text(&cell.content),
                };
                cells.push(text);
            }
            rows.push(cells);
        }
        rows
    }

    fn cell_text(&mut self, paragraphs: &[Paragraph]) -> CellText {
        let mut lines = Vec::with_capacity(paragraphs.len());
        let mut cell = CellText::default();
        for paragraph in paragraphs {
            let number = self.numbering.next_for(paragraph.style.numbering.as_ref());
            cell.is_list |= paragraph.is_list_item();
            if cell.numbering.is_none() {
                cell.numbering = number.as_ref().map(|n| n.text.clone());
            }
            lines.push(format_paragraph(
                paragraph,
                number.as_ref(),
                &self.doc.numbering,
                self.options,
            ));
        }
        cell.text = lines.join("\n");
        cell
    }

    fn list_format(&self, paragraph: &Paragraph) -> NumberFormat {
        match &paragraph.style.numbering {
            Some(n) => self.doc.numbering.format(&n.num_id, n.level.unwrap_or(0)),
            None => NumberFormat::None,
        }
    }

    fn citations(&self, resolve: impl FnOnce(&CitationResolver) -> Citations) -> Citations {
        if self.options.get_in_text_references {
            resolve(&self.resolver)
        } else {
            Citations::none()
        }
    }
}

/// Render a paragraph as it appears in the workbook.
///
/// List items get `indent_width × level` spaces and, with `preserve_bullets`,
/// their number or the bullet glyph.
pub fn format_paragraph(
    paragraph: &Paragraph,
    number: Option<&ListNumber>,
    definitions: &NumberingDefinitions,
    options: &ExtractOptions,
) -> String {
    let body = if options.inline_markup {
        marked_up_text(paragraph)
    } else {
        paragraph.plain_text()
    };
    let body = body.trim();

    let (Some(number), Some(numbering)) = (number, paragraph.style.numbering.as_ref()) else {
        return body.to_string();
    };

    let mut out = " ".repeat(options.indent_width * number.level as usize);
    if options.preserve_bullets {
        match definitions.format(&numbering.num_id, number.level) {
            NumberFormat::Numbered => {
                out.push_str(&number.text);
                out.push(' ');
            }
            NumberFormat::Bullet => {
                out.push_str(&options.bullet_glyph);
                out.push(' ');
            }
            NumberFormat::None => {}
        }
    }
    out.push_str(body);
    out
}

fn marked_up_text(paragraph: &Paragraph) -> String {
    let mut out = String::new();
    for item in &paragraph.content {
        match item {
            InlineContent::Text(run) => push_marked_up(&mut out, run),
            InlineContent::SimpleField { runs, .. } => {
                for run in runs {
                    push_marked_up(&mut out, run);
                }
            }
            InlineContent::Tab => out.push('\t'),
            InlineContent::LineBreak => out.push('\n'),
            InlineContent::FieldChar(_)
            | InlineContent::InstrText(_)
            | InlineContent::NoteReference { .. } => {}
        }
    }
    out
}

fn push_marked_up(out: &mut String, run: &TextRun) {
    let marker = match (run.style.bold, run.style.italic) {
        (true, true) => "***",
        (true, false) => "**",
        (false, true) => "*",
        (false, false) => "",
    };
    let core = run.text.trim();
    if marker.is_empty() || core.is_empty() {
        out.push_str(&run.text);
        return;
    }
    let leading = &run.text[..run.text.len() - run.text.trim_start().len()];
    let trailing = &run.text[run.text.trim_end().len()..];
    out.push_str(leading);
    out.push_str(marker);
    out.push_str(core);
    out.push_str(marker);
    out.push_str(trailing);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Note, NoteKind, TableCell, TableRow};

    fn bullets() -> NumberingDefinitions {
        let mut defs = NumberingDefinitions::default();
        defs.insert("2", vec![NumberFormat::Bullet; 9]);
        defs
    }

    #[test]
    fn test_format_numbered_list_item() {
        let options = ExtractOptions::default();
        let p = Paragraph::with_text("Second level").numbered("1", Some(1));
        let number = ListNumber {
            text: "2.1".into(),
            level: 1,
        };
        let text = format_paragraph(&p, Some(&number), &NumberingDefinitions::default(), &options);
        assert_eq!(text, "    2.1 Second level");
    }

    #[test]
    fn test_format_bullet_and_no_bullets() {
        let p = Paragraph::with_text("Item").numbered("2", Some(0));
        let number = ListNumber {
            text: "1".into(),
            level: 0,
        };
        let options = ExtractOptions::default().with_bullet_glyph("-");
        assert_eq!(format_paragraph(&p, Some(&number), &bullets(), &options), "- Item");

        let options = options.with_bullets(false);
        assert_eq!(format_paragraph(&p, Some(&number), &bullets(), &options), "Item");
    }

    #[test]
    fn test_inline_markup() {
        let mut p = Paragraph::new();
        p.add_text("Use ");
        p.add_run(TextRun::bold("only "));
        p.add_run(TextRun::italic("approved"));
        p.add_text(" grades");

        let options = ExtractOptions::default().with_inline_markup(true);
        let text = format_paragraph(&p, None, &NumberingDefinitions::default(), &options);
        assert_eq!(text, "Use **only** *approved* grades");
    }

    #[test]
    fn test_extract_numbering_continues_through_tables_and_headings() {
        let mut doc = Document::new();
        doc.add_block(Paragraph::heading("Intro", 1).numbered("9", Some(0)));
        doc.add_block(Paragraph::with_text("first").numbered("1", Some(0)));
        let mut table = Table::new();
        table.add_row(TableRow::new(vec![TableCell::with_content(vec![
            Paragraph::with_text("in cell").numbered("1", Some(0)),
        ])]));
        doc.add_block(table);
        doc.add_block(Paragraph::with_text("third").numbered("1", Some(0)));
        doc.add_block(Paragraph::heading("Scope", 1).numbered("9", Some(0)));

        let result = extract(&doc, &ExtractOptions::default());
        assert_eq!(result.sections[0].name, "1 Intro");
        assert_eq!(result.sections[1].name, "2 Scope");

        let items = &result.sections[0].items;
        assert!(matches!(&items[0], Item::Paragraph { content, .. } if content == "1 first"));
        match &items[1] {
            Item::Table { rows, .. } => {
                assert_eq!(rows[0][0].text, "2 in cell");
                assert!(rows[0][0].is_list);
                assert_eq!(rows[0][0].numbering.as_deref(), Some("2"));
            }
            other => panic!("expected table, got {other:?}"),
        }
        assert!(matches!(&items[2], Item::Paragraph { content, .. } if content == "3 third"));
    }

    #[test]
    fn test_merged_cells_do_not_advance_numbering() {
        let cell = TableCell::with_content(vec![Paragraph::with_text("x").numbered("1", Some(0))]);
        let mut table = Table::new();
        table.add_row(TableRow::new(vec![cell.clone(), cell.repeated(MergeOrigin::Left)]));
        table.add_row(TableRow::new(vec![
            cell.repeated(MergeOrigin::Above),
            TableCell::with_content(vec![Paragraph::with_text("y").numbered("1", Some(0))]),
        ]));
        let doc = Document::from_blocks([Block::Table(table)]);

        let result = extract(&doc, &ExtractOptions::default());
        let Item::Table { rows, .. } = &result.sections[0].items[0] else {
            panic!("expected table");
        };
        assert_eq!(rows[0][1].text, "1 x");
        assert_eq!(rows[1][0].text, "1 x");
        assert_eq!(rows[1][1].text, "2 y");
    }

    #[test]
    fn test_extract_with_endnote_citation() {
        let mut doc = Document::new();
        let mut p = Paragraph::with_text("Claim");
        p.push(InlineContent::NoteReference {
            kind: NoteKind::Endnote,
            id: "1".into(),
        });
        doc.add_block(p);
        doc.endnotes.push(Note::new("1", "Source https://example.org"));

        let result = extract(&doc, &ExtractOptions::default());
        let citations = result.sections[0].items[0].citations().unwrap();
        assert_eq!(
            citations.primary.as_ref().unwrap().url.as_deref(),
            Some("https://example.org")
        );

        let result = extract(&doc, &ExtractOptions::default().with_references(false));
        assert!(result.sections[0].items[0].citations().unwrap().is_empty());
    }

    #[test]
    fn test_tables_dropped_when_disabled() {
        let mut doc = Document::new();
        doc.add_block(Paragraph::heading("Data", 1));
        doc.add_block(Table::from_rows(vec![vec!["a", "b"]]));
        let result = extract(&doc, &ExtractOptions::default().with_tables(false));
        assert_eq!(result.section_count(), 1);
        assert_eq!(result.item_count(), 0);
    }
}
