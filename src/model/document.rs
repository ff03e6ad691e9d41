//! Document-level types.

use super::{Block, Paragraph, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A parsed Word document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    /// Document metadata (title, author, etc.)
    pub metadata: Metadata,

    /// Top-level blocks in reading order
    pub blocks: Vec<Block>,

    /// Endnote store (`word/endnotes.xml`), including separator notes
    pub endnotes: Vec<Note>,

    /// Footnote store (`word/footnotes.xml`), including separator notes
    pub footnotes: Vec<Note>,

    /// Number formats per numbering instance
    pub numbering: NumberingDefinitions,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from blocks.
    pub fn from_blocks(blocks: impl IntoIterator<Item = Block>) -> Self {
        Self {
            blocks: blocks.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Add a block to the document.
    pub fn add_block(&mut self, block: impl Into<Block>) {
        self.blocks.push(block.into());
    }

    /// Add an endnote.
    pub fn add_endnote(&mut self, id: impl Into<String>, text: impl Into<String>) {
        self.endnotes.push(Note::new(id, text));
    }

    /// Add a footnote.
    pub fn add_footnote(&mut self, id: impl Into<String>, text: impl Into<String>) {
        self.footnotes.push(Note::new(id, text));
    }

    /// Check if the document has any blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterate over top-level paragraphs.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(Block::as_paragraph)
    }

    /// Iterate over top-level tables.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(Block::as_table)
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Document metadata from `docProps/core.xml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Last modified by
    pub last_modified_by: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,
}

/// A footnote or endnote body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Note id as referenced from the body
    pub id: String,

    /// Plain text of all note paragraphs
    pub text: String,
}

impl Note {
    /// Create a note.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Number format of one list level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberFormat {
    /// Numbered (decimal, letter, roman, ...)
    #[default]
    Numbered,
    /// Bulleted
    Bullet,
    /// Explicitly unnumbered (`w:numFmt w:val="none"`)
    None,
}

impl NumberFormat {
    /// Map a `w:numFmt` value.
    pub fn from_num_fmt(value: &str) -> Self {
        match value {
            "bullet" => NumberFormat::Bullet,
            "none" => NumberFormat::None,
            _ => NumberFormat::Numbered,
        }
    }
}

/// Number formats keyed by numbering instance id, one entry per level.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NumberingDefinitions {
    /// `numId` → formats for levels 0..9
    pub formats: BTreeMap<String, Vec<NumberFormat>>,
}

impl NumberingDefinitions {
    /// Register the level formats of a numbering instance.
    pub fn insert(&mut self, num_id: impl Into<String>, levels: Vec<NumberFormat>) {
        self.formats.insert(num_id.into(), levels);
    }

    /// Format of a list level; unknown lists count as numbered.
    pub fn format(&self, num_id: &str, level: u8) -> NumberFormat {
        self.formats
            .get(num_id)
            .and_then(|levels| levels.get(level as usize))
            .copied()
            .unwrap_or_default()
    }
}
