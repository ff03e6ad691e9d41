//! Paragraph and text-level types.

use serde::{Deserialize, Serialize};

/// A paragraph of text content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paragraph {
    /// Inline content in reading order
    pub content: Vec<InlineContent>,

    /// Paragraph style
    pub style: ParagraphStyle,
}

impl Paragraph {
    /// Create a new empty paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a paragraph with plain text.
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut p = Self::new();
        p.add_text(text);
        p
    }

    /// Create a heading paragraph using Word's built-in heading style name.
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        let mut p = Self::with_text(text);
        p.style.style_name = Some(format!("Heading {}", level.clamp(1, 9)));
        p
    }

    /// Set the paragraph style name and return self.
    pub fn styled(mut self, style_name: impl Into<String>) -> Self {
        self.style.style_name = Some(style_name.into());
        self
    }

    /// Attach list numbering and return self.
    pub fn numbered(mut self, num_id: impl Into<String>, level: Option<u8>) -> Self {
        self.style.numbering = Some(NumberingRef {
            num_id: num_id.into(),
            level,
        });
        self
    }

    /// Add plain text to the paragraph.
    pub fn add_text(&mut self, text: impl Into<String>) {
        self.content.push(InlineContent::Text(TextRun::new(text)));
    }

    /// Add a styled text run.
    pub fn add_run(&mut self, run: TextRun) {
        self.content.push(InlineContent::Text(run));
    }

    /// Add any inline element.
    pub fn push(&mut self, item: InlineContent) {
        self.content.push(item);
    }

    /// Get plain text content of the paragraph.
    ///
    /// Field instructions are not part of the visible text; field results are.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for item in &self.content {
            match item {
                InlineContent::Text(run) => out.push_str(&run.text),
                InlineContent::Tab => out.push('\t'),
                InlineContent::LineBreak => out.push('\n'),
                InlineContent::SimpleField { runs, .. } => {
                    for run in runs {
                        out.push_str(&run.text);
                    }
                }
                InlineContent::FieldChar(_)
                | InlineContent::InstrText(_)
                | InlineContent::NoteReference { .. } => {}
            }
        }
        out
    }

    /// Check if the paragraph has no visible text.
    pub fn is_empty(&self) -> bool {
        self.plain_text().trim().is_empty()
    }

    /// Heading level derived from the style name.
    ///
    /// `Title` is level 0, `Heading N` / `headingN` is level N.
    pub fn heading_level(&self) -> Option<u8> {
        let name = self.style.style_name.as_deref()?;
        let compact: String = name
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        if compact == "title" {
            return Some(0);
        }
        compact
            .strip_prefix("heading")
            .filter(|rest| !rest.is_empty())
            .and_then(|rest| rest.parse::<u8>().ok())
    }

    /// Check if this paragraph carries an official heading style.
    pub fn is_heading(&self) -> bool {
        self.heading_level().is_some()
    }

    /// Check if this is a list item.
    pub fn is_list_item(&self) -> bool {
        self.style.numbering.is_some()
    }
}

/// Inline content within a paragraph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InlineContent {
    /// A text run with styling
    Text(TextRun),

    /// A tab character
    Tab,

    /// A line break
    LineBreak,

    /// Complex field marker (`w:fldChar`)
    FieldChar(FieldCharKind),

    /// Complex field instruction text (`w:instrText`)
    InstrText(String),

    /// A simple field (`w:fldSimple`) with its displayed result
    SimpleField {
        /// Field instruction, e.g. `CITATION Smi20 \l 1033`
        instruction: String,
        /// Displayed result runs
        runs: Vec<TextRun>,
    },

    /// A footnote or endnote reference mark
    NoteReference {
        /// Note store the id refers to
        kind: NoteKind,
        /// Note id
        id: String,
    },
}

/// Complex field marker type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldCharKind {
    /// Start of a field
    Begin,
    /// Separates instruction from result
    Separate,
    /// End of a field
    End,
}

/// Which note store a reference points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    /// `w:endnoteReference`
    Endnote,
    /// `w:footnoteReference`
    Footnote,
}

/// A run of text with consistent styling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRun {
    /// The text content
    pub text: String,

    /// Text styling
    pub style: TextStyle,
}

impl TextRun {
    /// Create a new text run with default style.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::default(),
        }
    }

    /// Create a bold text run.
    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle {
                bold: true,
                ..Default::default()
            },
        }
    }

    /// Create an italic text run.
    pub fn italic(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle {
                italic: true,
                ..Default::default()
            },
        }
    }

    /// Create a superscript text run.
    pub fn superscript(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle {
                superscript: true,
                ..Default::default()
            },
        }
    }

    /// Check if this run is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Text styling properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Bold text
    pub bold: bool,

    /// Italic text
    pub italic: bool,

    /// Superscript
    pub superscript: bool,
}

/// Paragraph styling properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParagraphStyle {
    /// Style name (e.g. "Heading 1"), or the style id when no name is known
    pub style_name: Option<String>,

    /// List numbering reference if this is a list item
    pub numbering: Option<NumberingRef>,
}

/// Reference from a paragraph to a numbering definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingRef {
    /// Numbering instance id (`w:numId`)
    pub num_id: String,

    /// Indent level (`w:ilvl`), 0-based
    pub level: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_plain_text() {
        let mut p = Paragraph::new();
        p.add_text("Hello ");
        p.add_run(TextRun::bold("world"));
        p.push(InlineContent::FieldChar(FieldCharKind::Begin));
        p.push(InlineContent::InstrText(" CITATION Smi20 ".into()));
        p.push(InlineContent::FieldChar(FieldCharKind::Separate));
        p.add_text(" (Smith)");
        p.push(InlineContent::FieldChar(FieldCharKind::End));

        assert_eq!(p.plain_text(), "Hello world (Smith)");
    }

    #[test]
    fn test_heading_levels() {
        assert_eq!(Paragraph::heading("Intro", 1).heading_level(), Some(1));
        assert_eq!(
            Paragraph::with_text("x").styled("heading2").heading_level(),
            Some(2)
        );
        assert_eq!(
            Paragraph::with_text("x").styled("Title").heading_level(),
            Some(0)
        );
        assert!(!Paragraph::with_text("x").styled("Normal").is_heading());
        assert!(!Paragraph::with_text("x").styled("Heading").is_heading());
    }

    #[test]
    fn test_blank_paragraph() {
        assert!(Paragraph::new().is_empty());
        assert!(Paragraph::with_text("  \t ").is_empty());
        assert!(!Paragraph::with_text("a").is_empty());
    }

    #[test]
    fn test_numbered_builder() {
        let p = Paragraph::with_text("item").numbered("3", Some(1));
        assert!(p.is_list_item());
        assert_eq!(
            p.style.numbering,
            Some(NumberingRef {
                num_id: "3".into(),
                level: Some(1)
            })
        );
    }
}
