//! Citation lookup for paragraphs and tables.
//!
//! Three storage mechanisms are consulted, first match wins:
//!
//! 1. footnote/endnote reference marks resolved against the note stores,
//! 2. `CITATION`-style field codes (simple or complex fields),
//! 3. superscript numbers resolved against a manual "References" list.

use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::{Block, FieldCharKind, InlineContent, Note, NoteKind, Paragraph, Table};
use crate::normalize::{comparison_key, normalize_whitespace};

/// Field instruction keywords that mark a citation field.
pub const CITATION_FIELD_KEYWORDS: [&str; 4] = ["CITATION", "CITE", "ADDIN", "BIBLIOGRAPHY"];

/// Note ids Word reserves for separator notes.
const RESERVED_NOTE_IDS: [&str; 2] = ["-1", "0"];

/// Widest superscript range (`3-7`) that is expanded.
const MAX_RANGE_SPAN: u32 = 50;

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>"']+"#).expect("valid url regex")
    })
}

/// First URL found in text, trailing punctuation removed.
pub fn find_url(text: &str) -> Option<String> {
    url_regex()
        .find(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':', ')', ']']).to_string())
}

/// A resolved reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationEntry {
    /// Reference text
    pub text: String,
    /// First URL in the reference, if any
    pub url: Option<String>,
}

impl CitationEntry {
    /// Create an entry, extracting the URL from the text.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let url = find_url(&text);
        Self { text, url }
    }
}

/// Citations found for one paragraph or table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citations {
    /// Best-matched reference
    pub primary: Option<CitationEntry>,
    /// Further references, in order of appearance
    pub others: Vec<CitationEntry>,
}

impl Citations {
    /// No citations.
    pub fn none() -> Self {
        Self::default()
    }

    /// Build from an ordered list of entries: first is primary.
    pub fn from_entries(entries: Vec<CitationEntry>) -> Self {
        let mut iter = entries.into_iter();
        Self {
            primary: iter.next(),
            others: iter.collect(),
        }
    }

    /// Check if nothing was found.
    pub fn is_empty(&self) -> bool {
        self.primary.is_none()
    }
}

/// Note id → reference entry, built once per document.
#[derive(Debug, Clone, Default)]
pub struct NoteMap {
    entries: BTreeMap<String, CitationEntry>,
}

impl NoteMap {
    /// Build from a note store, skipping separator notes and empty notes.
    pub fn from_notes(notes: &[Note]) -> Self {
        let entries = notes
            .iter()
            .filter(|note| !RESERVED_NOTE_IDS.contains(&note.id.as_str()))
            .filter_map(|note| {
                let text = normalize_whitespace(&note.text);
                (!text.is_empty()).then(|| (note.id.clone(), CitationEntry::from_text(text)))
            })
            .collect();
        Self { entries }
    }

    /// Look up a note by id.
    pub fn get(&self, id: &str) -> Option<&CitationEntry> {
        self.entries.get(id)
    }

    /// Number of notes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Numbered entries of a manual "References" section.
#[derive(Debug, Clone, Default)]
pub struct ManualReferences {
    entries: BTreeMap<u32, CitationEntry>,
}

impl ManualReferences {
    /// Scan top-level paragraphs for a "References" heading and number the
    /// paragraphs that follow it, up to a blank paragraph or an appendix.
    pub fn from_blocks(blocks: &[Block]) -> Self {
        let mut paragraphs = blocks.iter().filter_map(Block::as_paragraph);
        let mut entries = BTreeMap::new();

        if paragraphs
            .by_ref()
            .any(|p| comparison_key(&p.plain_text()) == "references")
        {
            let mut next_id = 1;
            for paragraph in paragraphs {
                let text = normalize_whitespace(&paragraph.plain_text());
                if text.is_empty() || comparison_key(&text).starts_with("appendix") {
                    break;
                }
                entries.insert(next_id, CitationEntry::from_text(text));
                next_id += 1;
            }
        }

        Self { entries }
    }

    /// Look up a reference by its 1-based number.
    pub fn get(&self, number: u32) -> Option<&CitationEntry> {
        self.entries.get(&number)
    }

    /// Number of references.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no references were found.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves citations against the lookup tables of one document.
#[derive(Debug, Clone, Default)]
pub struct CitationResolver {
    endnotes: NoteMap,
    footnotes: NoteMap,
    manual: ManualReferences,
}

impl CitationResolver {
    /// Create a resolver from prebuilt lookup tables.
    pub fn new(endnotes: NoteMap, footnotes: NoteMap, manual: ManualReferences) -> Self {
        Self {
            endnotes,
            footnotes,
            manual,
        }
    }

    /// Build all lookup tables for a document.
    pub fn for_document(doc: &crate::model::Document) -> Self {
        Self::new(
            NoteMap::from_notes(&doc.endnotes),
            NoteMap::from_notes(&doc.footnotes),
            ManualReferences::from_blocks(&doc.blocks),
        )
    }

    /// Endnote lookup table.
    pub fn endnotes(&self) -> &NoteMap {
        &self.endnotes
    }

    /// Manual reference lookup table.
    pub fn manual_references(&self) -> &ManualReferences {
        &self.manual
    }

    /// Resolve the citations of a paragraph.
    pub fn resolve_paragraph(&self, paragraph: &Paragraph) -> Citations {
        if let Some(entry) = self.note_reference(paragraph) {
            return Citations::from_entries(vec![entry]);
        }

        let fields = field_citations(paragraph);
        if !fields.is_empty() {
            return Citations::from_entries(fields);
        }

        let entries = superscript_numbers(paragraph)
            .into_iter()
            .filter_map(|n| self.manual.get(n).cloned())
            .collect();
        Citations::from_entries(entries)
    }

    /// First non-empty citation result of any cell paragraph, row-major.
    pub fn resolve_table(&self, table: &Table) -> Citations {
        table
            .rows
            .iter()
            .flat_map(|row| row.cells.iter())
            .flat_map(|cell| cell.content.iter())
            .map(|paragraph| self.resolve_paragraph(paragraph))
            .find(|citations| !citations.is_empty())
            .unwrap_or_default()
    }

    fn note_reference(&self, paragraph: &Paragraph) -> Option<CitationEntry> {
        paragraph.content.iter().find_map(|item| match item {
            InlineContent::NoteReference { kind, id } => {
                let map = match kind {
                    NoteKind::Endnote => &self.endnotes,
                    NoteKind::Footnote => &self.footnotes,
                };
                map.get(id).cloned()
            }
            _ => None,
        })
    }
}

fn is_citation_instruction(instruction: &str) -> bool {
    let upper = instruction.to_uppercase();
    CITATION_FIELD_KEYWORDS.iter().any(|k| upper.contains(k))
}

fn field_entry(instruction: &str, result: &str) -> CitationEntry {
    let result = normalize_whitespace(result);
    let instruction = normalize_whitespace(instruction);
    let url = find_url(&instruction).or_else(|| find_url(&result));
    let text = if result.is_empty() { instruction } else { result };
    CitationEntry { text, url }
}

#[derive(Default)]
struct FieldFrame {
    instruction: String,
    result: String,
    in_result: bool,
}

impl FieldFrame {
    fn push_text(&mut self, text: &str) {
        if self.in_result {
            self.result.push_str(text);
        }
    }
}

/// Citation fields of a paragraph in order of completion.
fn field_citations(paragraph: &Paragraph) -> Vec<CitationEntry> {
    let mut entries = Vec::new();
    let mut stack: Vec<FieldFrame> = Vec::new();

    for item in &paragraph.content {
        match item {
            InlineContent::FieldChar(FieldCharKind::Begin) => stack.push(FieldFrame::default()),
            InlineContent::FieldChar(FieldCharKind::Separate) => {
                if let Some(frame) = stack.last_mut() {
                    frame.in_result = true;
                }
            }
            InlineContent::FieldChar(FieldCharKind::End) => {
                if let Some(frame) = stack.pop() {
                    if is_citation_instruction(&frame.instruction) {
                        entries.push(field_entry(&frame.instruction, &frame.result));
                    }
                    if let Some(parent) = stack.last_mut() {
                        parent.push_text(&frame.result);
                    }
                }
            }
            InlineContent::InstrText(text) => {
                if let Some(frame) = stack.last_mut() {
                    if !frame.in_result {
                        frame.instruction.push_str(text);
                    }
                }
            }
            InlineContent::Text(run) => {
                if let Some(frame) = stack.last_mut() {
                    frame.push_text(&run.text);
                }
            }
            InlineContent::SimpleField { instruction, runs } => {
                let result: String = runs.iter().map(|r| r.text.as_str()).collect();
                if is_citation_instruction(instruction) {
                    entries.push(field_entry(instruction, &result));
                }
                if let Some(frame) = stack.last_mut() {
                    frame.push_text(&result);
                }
            }
            InlineContent::Tab | InlineContent::LineBreak | InlineContent::NoteReference { .. } => {
            }
        }
    }

    entries
}

/// Numbers cited in superscript runs, in order of first appearance.
fn superscript_numbers(paragraph: &Paragraph) -> Vec<u32> {
    let mut groups: Vec<String> = Vec::new();
    let mut current = String::new();
    for item in &paragraph.content {
        match item {
            InlineContent::Text(run) if run.style.superscript => current.push_str(&run.text),
            _ => {
                if !current.is_empty() {
                    groups.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }

    let mut seen = HashSet::new();
    let mut numbers = Vec::new();
    for group in &groups {
        for part in group.split([',', ';', ' ', '\u{00A0}']) {
            for n in parse_number_part(part.trim()) {
                if seen.insert(n) {
                    numbers.push(n);
                }
            }
        }
    }
    numbers
}

fn parse_number_part(part: &str) -> Vec<u32> {
    if let Ok(n) = part.parse::<u32>() {
        return vec![n];
    }
    let Some((start, end)) = part.split_once(['-', '–', '—']) else {
        return Vec::new();
    };
    match (start.trim().parse::<u32>(), end.trim().parse::<u32>()) {
        (Ok(start), Ok(end)) if start <= end && end - start <= MAX_RANGE_SPAN => {
            (start..=end).collect()
        }
        _ => Vec::new(),
    }
}
