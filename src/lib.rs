//! # docsheet
//!
//! Structured extraction from Word documents into spreadsheets.
//!
//! This library reads DOCX documents, splits them into sections by heading
//! style or custom header labels, and lays each section out as a worksheet.
//! A second mode finds data tables, maps their headers onto a canonical
//! schema with a persistent memory of earlier decisions, and writes the
//! tables in canonical column order.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docsheet::{extract, parse_file, ExtractOptions};
//! use docsheet::workbook::{extraction_workbook, WorkbookWriter, XlsxWriter};
//!
//! fn main() -> docsheet::Result<()> {
//!     let doc = parse_file("report.docx")?;
//!
//!     let options = ExtractOptions::default();
//!     let extracted = extract(&doc, &options);
//!     let workbook = extraction_workbook(&extracted, &options);
//!     XlsxWriter::new().write(&workbook, "report.xlsx".as_ref())?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Section extraction**: official heading styles, fuzzy custom headers,
//!   per-section block rules
//! - **List numbering**: hierarchical numbers as Word displays them
//! - **Citations**: endnotes, footnotes, citation fields and superscript
//!   references resolved per paragraph and table
//! - **Header mapping**: fuzzy matching against a canonical schema with a
//!   persisted, undoable decision store

pub mod config;
pub mod convert;
pub mod detect;
pub mod error;
pub mod extract;
pub mod mapping;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod render;
pub mod similarity;
pub mod table;
pub mod workbook;

// Re-export commonly used types
pub use config::Config;
pub use convert::{Batch, BatchIssue, BatchReport, ExtractSummary, MapSummary};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_docx, DocxFormat};
pub use error::{Error, Result};
pub use extract::{extract, ExtractOptions, ExtractedDocument, Item, Section};
pub use mapping::{
    map_tables, CanonicalSchema, HeaderResolver, MappingOptions, MappingOutcome, MappingStore,
};
pub use model::{
    Block, Document, InlineContent, Metadata, Paragraph, ParagraphStyle, Table, TableCell,
    TableRow, TextRun, TextStyle,
};
pub use parser::{DocxParser, ErrorMode, ParseOptions};
pub use render::JsonFormat;
pub use workbook::{Workbook, WorkbookWriter, XlsxWriter};

use std::io::Read;
use std::path::Path;

/// Parse a DOCX file and return a structured document.
///
/// # Example
///
/// ```no_run
/// use docsheet::parse_file;
///
/// let doc = parse_file("report.docx").unwrap();
/// println!("Blocks: {}", doc.blocks.len());
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    let parser = DocxParser::open(path)?;
    parser.parse()
}

/// Parse a DOCX file with custom options.
///
/// # Example
///
/// ```no_run
/// use docsheet::{parse_file_with_options, ParseOptions};
///
/// let options = ParseOptions::new().lenient().with_metadata(false);
/// let doc = parse_file_with_options("report.docx", options).unwrap();
/// ```
pub fn parse_file_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Document> {
    let parser = DocxParser::open_with_options(path, options)?;
    parser.parse()
}

/// Parse a DOCX from bytes.
pub fn parse_bytes(data: &[u8]) -> Result<Document> {
    let parser = DocxParser::from_bytes(data)?;
    parser.parse()
}

/// Parse a DOCX from bytes with custom options.
pub fn parse_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Document> {
    let parser = DocxParser::from_bytes_with_options(data, options)?;
    parser.parse()
}

/// Parse a DOCX from a reader.
pub fn parse_reader<R: Read>(reader: R) -> Result<Document> {
    let parser = DocxParser::from_reader(reader)?;
    parser.parse()
}

/// Parse a DOCX from a reader with custom options.
pub fn parse_reader_with_options<R: Read>(reader: R, options: ParseOptions) -> Result<Document> {
    let parser = DocxParser::from_reader_with_options(reader, options)?;
    parser.parse()
}

/// Parse a DOCX file, reading it without blocking the runtime.
///
/// Parsing itself runs on the calling task.
#[cfg(feature = "async")]
pub async fn parse_file_async<P: AsRef<Path>>(path: P) -> Result<Document> {
    let data = tokio::fs::read(path).await?;
    parse_bytes(&data)
}

/// Extract plain text from a DOCX file.
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let doc = parse_file(path)?;
    Ok(doc.plain_text())
}

/// Extract sections from a DOCX file and render them as JSON.
///
/// # Example
///
/// ```no_run
/// use docsheet::{to_json, JsonFormat};
///
/// let json = to_json("report.docx", JsonFormat::Pretty).unwrap();
/// std::fs::write("report.json", json).unwrap();
/// ```
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let doc = parse_file(path)?;
    let extracted = extract(&doc, &ExtractOptions::default());
    render::to_json(&extracted, format)
}

/// Builder for parsing and extracting Word documents.
///
/// # Example
///
/// ```no_run
/// use docsheet::Docsheet;
///
/// Docsheet::new()
///     .lenient()
///     .with_custom_header("Document Info")
///     .parse("report.docx")?
///     .write_xlsx("report.xlsx")?;
/// # Ok::<(), docsheet::Error>(())
/// ```
pub struct Docsheet {
    parse_options: ParseOptions,
    extract_options: ExtractOptions,
}

impl Docsheet {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::default(),
            extract_options: ExtractOptions::default(),
        }
    }

    /// Enable lenient parsing mode.
    pub fn lenient(mut self) -> Self {
        self.parse_options = self.parse_options.lenient();
        self
    }

    /// Replace the extraction options.
    pub fn with_extract_options(mut self, options: ExtractOptions) -> Self {
        self.extract_options = options;
        self
    }

    /// Use the extraction options of a loaded configuration.
    pub fn with_config(mut self, config: &Config) -> Self {
        self.extract_options = config.extract.clone();
        self
    }

    /// Add a custom section header label.
    pub fn with_custom_header(mut self, label: impl Into<String>) -> Self {
        self.extract_options = self.extract_options.with_custom_header(label);
        self
    }

    /// Disable citation resolution.
    pub fn without_references(mut self) -> Self {
        self.extract_options = self.extract_options.with_references(false);
        self
    }

    /// Parse a DOCX file and extract its sections.
    pub fn parse<P: AsRef<Path>>(self, path: P) -> Result<DocsheetResult> {
        let parser = DocxParser::open_with_options(path, self.parse_options)?;
        Ok(DocsheetResult::new(parser.parse()?, self.extract_options))
    }

    /// Parse a DOCX from bytes and extract its sections.
    pub fn parse_bytes(self, data: &[u8]) -> Result<DocsheetResult> {
        let parser = DocxParser::from_bytes_with_options(data, self.parse_options)?;
        Ok(DocsheetResult::new(parser.parse()?, self.extract_options))
    }
}

impl Default for Docsheet {
    fn default() -> Self {
        Self::new()
    }
}

/// A parsed document with its extracted sections.
pub struct DocsheetResult {
    /// The parsed document
    pub document: Document,
    /// Sections extracted from it
    pub extracted: ExtractedDocument,
    extract_options: ExtractOptions,
}

impl DocsheetResult {
    fn new(document: Document, extract_options: ExtractOptions) -> Self {
        let extracted = extract(&document, &extract_options);
        Self {
            document,
            extracted,
            extract_options,
        }
    }

    /// Lay the sections out as a workbook.
    pub fn workbook(&self) -> Workbook {
        workbook::extraction_workbook(&self.extracted, &self.extract_options)
    }

    /// Write the section workbook as XLSX.
    pub fn write_xlsx<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        XlsxWriter::new().write(&self.workbook(), path.as_ref())
    }

    /// Render the extracted sections as JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.extracted, format)
    }

    /// Get the document.
    pub fn document(&self) -> &Document {
        &self.document
    }
}
