//! Section state machine.
//!
//! Blocks arrive in document order. A section is started by a custom header
//! label or an official heading style; ordinary content lands in the current
//! section, a pending heading, or a "Default" section.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use super::citation::Citations;
use super::options::{AllowedBlocks, ExtractOptions};
use crate::normalize::{label_key, normalize_whitespace};
use crate::similarity::similarity;

/// Name of the section that collects content before any header.
pub const DEFAULT_SECTION: &str = "Default";

/// A named group of extracted items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Section name, unique within one document
    pub name: String,
    /// Items in document order
    pub items: Vec<Item>,
}

impl Section {
    /// Create an empty section.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    /// Number of paragraph items.
    pub fn paragraph_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i, Item::Paragraph { .. }))
            .count()
    }

    /// Number of table items.
    pub fn table_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i, Item::Table { .. }))
            .count()
    }
}

/// One extracted item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Item {
    /// A blank paragraph
    Blank,

    /// A retained paragraph
    Paragraph {
        /// `[Paragraph<n>]`
        label: String,
        /// Formatted paragraph text
        content: String,
        /// Resolved citations
        citations: Citations,
    },

    /// A retained table
    Table {
        /// `[Table<n>]`
        label: String,
        /// Cell text, row-major
        rows: Vec<Vec<CellText>>,
        /// Resolved citations
        citations: Citations,
    },
}

impl Item {
    /// Item label, if any.
    pub fn label(&self) -> Option<&str> {
        match self {
            Item::Blank => None,
            Item::Paragraph { label, .. } | Item::Table { label, .. } => Some(label),
        }
    }

    /// Citations of the item, if any.
    pub fn citations(&self) -> Option<&Citations> {
        match self {
            Item::Blank => None,
            Item::Paragraph { citations, .. } | Item::Table { citations, .. } => Some(citations),
        }
    }
}

/// Formatted text of one table cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellText {
    /// Cell text, paragraphs joined with `\n`
    pub text: String,
    /// Whether any cell paragraph is a list item
    pub is_list: bool,
    /// Numbering of the first numbered paragraph
    pub numbering: Option<String>,
}

/// Content block kinds subject to the retention rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Ordinary paragraph
    Paragraph,
    /// Table
    Table,
}

#[derive(Debug)]
enum State {
    NoSection,
    Active,
    Pending(String),
}

/// Match a paragraph against the configured custom headers.
///
/// Returns the section name: the paragraph text without trailing colons.
pub fn match_custom_header(text: &str, options: &ExtractOptions) -> Option<String> {
    let key = label_key(text);
    if key.is_empty() {
        return None;
    }
    let matched = options
        .custom_headers
        .iter()
        .any(|header| similarity(&key, &label_key(header)) >= options.custom_header_threshold);
    matched.then(|| {
        normalize_whitespace(text)
            .trim_end_matches([':', '：'])
            .trim_end()
            .to_string()
    })
}

/// Builds the ordered section list for one document pass.
#[derive(Debug)]
pub struct SectionBuilder<'a> {
    options: &'a ExtractOptions,
    sections: Vec<Section>,
    state: State,
    allowed: AllowedBlocks,
    paragraph_count: usize,
    table_count: usize,
    name_uses: HashMap<String, usize>,
}

impl<'a> SectionBuilder<'a> {
    /// Create a builder with no section.
    pub fn new(options: &'a ExtractOptions) -> Self {
        Self {
            options,
            sections: Vec::new(),
            state: State::NoSection,
            allowed: options.default_allowed(),
            paragraph_count: 0,
            table_count: 0,
            name_uses: HashMap::new(),
        }
    }

    /// Block kinds currently retained.
    pub fn allowed(&self) -> AllowedBlocks {
        self.allowed
    }

    /// Check whether a block kind is retained in the current section.
    pub fn allows(&self, kind: BlockKind) -> bool {
        match kind {
            BlockKind::Paragraph => self.allowed.paragraphs,
            BlockKind::Table => self.allowed.tables,
        }
    }

    /// Name of the header waiting for data, if any.
    pub fn pending_header(&self) -> Option<&str> {
        match &self.state {
            State::Pending(name) => Some(name),
            State::NoSection | State::Active => None,
        }
    }

    /// Handle a blank paragraph.
    pub fn blank(&mut self) {
        if matches!(self.state, State::Active) && self.options.preserve_blank_paragraphs {
            if let Some(section) = self.sections.last_mut() {
                section.items.push(Item::Blank);
            }
        }
    }

    /// Start a section for a matched custom header.
    pub fn custom_header(&mut self, name: &str) {
        self.allowed = self.options.default_allowed();
        self.open_section(name);
    }

    /// Handle an official heading.
    ///
    /// `numbered` carries the list number prefix, `stripped` is the bare text.
    pub fn heading(&mut self, numbered: &str, stripped: &str) {
        let name = match self.options.section_rule(stripped) {
            Some(rule) => {
                self.allowed = rule;
                stripped
            }
            None => {
                self.allowed = self.options.default_allowed();
                numbered
            }
        };

        if self.options.only_headings_with_data {
            debug!("Deferring section '{}' until data follows", name);
            self.state = State::Pending(name.to_string());
        } else {
            self.open_section(name);
        }
    }

    /// Append a paragraph to the current section.
    ///
    /// Returns false if paragraphs are not retained here.
    pub fn push_paragraph(&mut self, content: String, citations: Citations) -> bool {
        if !self.allows(BlockKind::Paragraph) {
            return false;
        }
        self.ensure_section();
        self.paragraph_count += 1;
        let label = format!("[Paragraph{}]", self.paragraph_count);
        self.push(Item::Paragraph {
            label,
            content,
            citations,
        });
        true
    }

    /// Append a table to the current section.
    ///
    /// Returns false if tables are not retained here.
    pub fn push_table(&mut self, rows: Vec<Vec<CellText>>, citations: Citations) -> bool {
        if !self.allows(BlockKind::Table) {
            return false;
        }
        self.ensure_section();
        self.table_count += 1;
        let label = format!("[Table{}]", self.table_count);
        self.push(Item::Table {
            label,
            rows,
            citations,
        });
        true
    }

    /// Finish the pass and return the sections in creation order.
    pub fn finish(self) -> Vec<Section> {
        self.sections
    }

    fn push(&mut self, item: Item) {
        if let Some(section) = self.sections.last_mut() {
            section.items.push(item);
        }
    }

    fn ensure_section(&mut self) {
        match std::mem::replace(&mut self.state, State::Active) {
            State::Active => {}
            State::Pending(name) => self.open_section(&name),
            State::NoSection => self.open_section(DEFAULT_SECTION),
        }
    }

    fn open_section(&mut self, name: &str) {
        let name = self.unique_name(name);
        debug!("Starting section '{}'", name);
        self.sections.push(Section::new(name));
        self.state = State::Active;
        self.paragraph_count = 0;
        self.table_count = 0;
    }

    fn unique_name(&mut self, name: &str) -> String {
        let base = if name.trim().is_empty() {
            DEFAULT_SECTION
        } else {
            name
        };
        let uses = self.name_uses.entry(base.to_string()).or_insert(0);
        *uses += 1;
        let mut candidate = if *uses == 1 {
            base.to_string()
        } else {
            format!("{} ({})", base, uses)
        };
        // "Scope (2)" may also exist as a literal heading
        while self.sections.iter().any(|s| s.name == candidate) {
            *uses += 1;
            candidate = format!("{} ({})", base, uses);
        }
        candidate
    }
}
