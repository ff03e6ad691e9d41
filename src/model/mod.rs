//! Document model types for Word content representation.
//!
//! This module defines the intermediate representation that bridges DOCX
//! parsing and spreadsheet extraction. Blocks are immutable once read; all
//! derived state (numbering, sections, citations) lives in the extraction
//! pass.

mod block;
mod document;
mod paragraph;
mod table;

pub use block::Block;
pub use document::{Document, Metadata, Note, NumberFormat, NumberingDefinitions};
pub use paragraph::{
    FieldCharKind, InlineContent, NoteKind, NumberingRef, Paragraph, ParagraphStyle, TextRun,
    TextStyle,
};
pub use table::{MergeOrigin, Table, TableCell, TableRow};
