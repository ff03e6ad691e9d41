//! Extraction options and configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::normalize::label_key;

/// Which block kinds a section retains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedBlocks {
    /// Retain paragraphs
    pub paragraphs: bool,
    /// Retain tables
    pub tables: bool,
}

impl AllowedBlocks {
    /// Paragraphs and tables.
    pub const ALL: Self = Self {
        paragraphs: true,
        tables: true,
    };

    /// Paragraphs only.
    pub const PARAGRAPHS: Self = Self {
        paragraphs: true,
        tables: false,
    };

    /// Tables only.
    pub const TABLES: Self = Self {
        paragraphs: false,
        tables: true,
    };
}

impl Default for AllowedBlocks {
    fn default() -> Self {
        Self::ALL
    }
}

/// Options for extracting sections from a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Retain paragraphs by default
    pub extract_paragraphs: bool,

    /// Retain tables by default
    pub extract_tables: bool,

    /// Only create a heading section once a retained block follows it
    pub only_headings_with_data: bool,

    /// Paragraph labels that start a section regardless of style
    pub custom_headers: Vec<String>,

    /// Per-heading overrides of the retained block kinds, keyed by heading text
    pub custom_section_rules: BTreeMap<String, AllowedBlocks>,

    /// Similarity a paragraph needs to match a custom header
    pub custom_header_threshold: f64,

    /// Prefix list paragraphs with their number or bullet glyph
    pub preserve_bullets: bool,

    /// Emit blank rows for blank paragraphs
    pub preserve_blank_paragraphs: bool,

    /// Wrap bold runs in `**` and italic runs in `*`
    pub inline_markup: bool,

    /// Spaces per list indent level
    pub indent_width: usize,

    /// Marker used for bulleted list items
    pub bullet_glyph: String,

    /// Resolve in-text citations and emit citation columns
    pub get_in_text_references: bool,

    /// Emit a literal `[Start]` column on the first row of each table
    pub table_start_marker: bool,
}

impl ExtractOptions {
    /// Create new extraction options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable paragraph extraction.
    pub fn with_paragraphs(mut self, extract: bool) -> Self {
        self.extract_paragraphs = extract;
        self
    }

    /// Enable or disable table extraction.
    pub fn with_tables(mut self, extract: bool) -> Self {
        self.extract_tables = extract;
        self
    }

    /// Defer heading sections until data follows.
    pub fn only_headings_with_data(mut self, only: bool) -> Self {
        self.only_headings_with_data = only;
        self
    }

    /// Add a custom section header label.
    pub fn with_custom_header(mut self, label: impl Into<String>) -> Self {
        self.custom_headers.push(label.into());
        self
    }

    /// Override retained block kinds for sections under a heading.
    pub fn with_section_rule(mut self, heading: &str, allowed: AllowedBlocks) -> Self {
        self.custom_section_rules.insert(label_key(heading), allowed);
        self
    }

    /// Enable or disable list markers.
    pub fn with_bullets(mut self, preserve: bool) -> Self {
        self.preserve_bullets = preserve;
        self
    }

    /// Enable or disable blank rows.
    pub fn with_blank_paragraphs(mut self, preserve: bool) -> Self {
        self.preserve_blank_paragraphs = preserve;
        self
    }

    /// Enable or disable inline markup.
    pub fn with_inline_markup(mut self, markup: bool) -> Self {
        self.inline_markup = markup;
        self
    }

    /// Set the indent width per list level.
    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }

    /// Set the bullet glyph.
    pub fn with_bullet_glyph(mut self, glyph: impl Into<String>) -> Self {
        self.bullet_glyph = glyph.into();
        self
    }

    /// Enable or disable citation resolution.
    pub fn with_references(mut self, resolve: bool) -> Self {
        self.get_in_text_references = resolve;
        self
    }

    /// Enable or disable the `[Start]` marker column.
    pub fn with_table_start_marker(mut self, marker: bool) -> Self {
        self.table_start_marker = marker;
        self
    }

    /// Default retained block kinds.
    pub fn default_allowed(&self) -> AllowedBlocks {
        AllowedBlocks {
            paragraphs: self.extract_paragraphs,
            tables: self.extract_tables,
        }
    }

    /// Rule for a heading, looked up by its label key.
    pub fn section_rule(&self, heading: &str) -> Option<AllowedBlocks> {
        let key = label_key(heading);
        self.custom_section_rules
            .iter()
            .find(|(name, _)| label_key(name) == key)
            .map(|(_, allowed)| *allowed)
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            extract_paragraphs: true,
            extract_tables: true,
            only_headings_with_data: false,
            custom_headers: Vec::new(),
            custom_section_rules: BTreeMap::new(),
            custom_header_threshold: 0.8,
            preserve_bullets: true,
            preserve_blank_paragraphs: true,
            inline_markup: false,
            indent_width: 4,
            bullet_glyph: "•".to_string(),
            get_in_text_references: true,
            table_start_marker: false,
        }
    }
}
