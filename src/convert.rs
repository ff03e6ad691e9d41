//! Document-to-workbook conversion.
//!
//! Two modes are offered per document: extraction writes one sheet per
//! section to `<stem>.xlsx`, mapping writes the raw tables plus canonical
//! tables to `<stem>_mapped.xlsx`. A [`Batch`] runs either mode over many
//! documents strictly in order, recording failures instead of stopping.
//!
//! # Example
//!
//! ```no_run
//! use docsheet::convert::{extract_file, extraction_output_path};
//! use docsheet::{ExtractOptions, ParseOptions};
//! use std::path::Path;
//!
//! fn main() -> docsheet::Result<()> {
//!     let input = Path::new("report.docx");
//!     let output = extraction_output_path(input, None);
//!     let summary = extract_file(input, &output, &ParseOptions::default(), &ExtractOptions::default())?;
//!     println!("{} sections", summary.sections);
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::Result;
use crate::extract::{extract, ExtractOptions};
use crate::mapping::{map_tables, HeaderResolver, MappingOptions, MappingStore, ReconcileReport};
use crate::model::Document;
use crate::parser::{DocxParser, ParseOptions};
use crate::workbook::{extraction_workbook, mapping_workbook, WorkbookWriter, XlsxWriter};

const MAPPED_SUFFIX: &str = "_mapped";
const OUTPUT_EXTENSION: &str = "xlsx";

/// Output path for extraction mode: `<stem>.xlsx` next to the input or in `output_dir`.
pub fn extraction_output_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    output_path(input, output_dir, "")
}

/// Output path for mapping mode: `<stem>_mapped.xlsx`.
pub fn mapping_output_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    output_path(input, output_dir, MAPPED_SUFFIX)
}

fn output_path(input: &Path, output_dir: Option<&Path>, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let name = format!("{}{}.{}", stem, suffix, OUTPUT_EXTENSION);
    match output_dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

/// What an extraction run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Written workbook
    pub output: PathBuf,
    /// Number of sections (sheets)
    pub sections: usize,
    /// Number of items across all sections
    pub items: usize,
}

/// What a mapping run produced.
#[derive(Debug, Clone)]
pub struct MapSummary {
    /// Written workbook
    pub output: PathBuf,
    /// Tables found in the document
    pub tables: usize,
    /// Tables with a detectable header row
    pub analyzed: usize,
    /// Tables written as canonical sheets
    pub mapped: usize,
    /// Reconciliation summary
    pub report: ReconcileReport,
}

fn parse(input: &Path, parse_options: &ParseOptions) -> Result<Document> {
    DocxParser::open_with_options(input, parse_options.clone())?.parse()
}

/// Extract sections from one document and write the workbook.
pub fn extract_file(
    input: &Path,
    output: &Path,
    parse_options: &ParseOptions,
    options: &ExtractOptions,
) -> Result<ExtractSummary> {
    let doc = parse(input, parse_options)?;
    let extracted = extract(&doc, options);
    let workbook = extraction_workbook(&extracted, options);
    XlsxWriter::new().write(&workbook, output)?;

    info!(
        "{} -> {} ({} sheets)",
        input.display(),
        output.display(),
        workbook.sheet_count()
    );
    Ok(ExtractSummary {
        output: output.to_path_buf(),
        sections: extracted.section_count(),
        items: extracted.item_count(),
    })
}

/// Map the tables of one document and write the workbook.
///
/// Header decisions are persisted to `store` as they are made, so they hold
/// even if writing the workbook fails afterwards.
pub fn map_file<R>(
    input: &Path,
    output: &Path,
    parse_options: &ParseOptions,
    options: &MappingOptions,
    store: &mut MappingStore,
    resolver: &mut R,
) -> Result<MapSummary>
where
    R: HeaderResolver + ?Sized,
{
    let doc = parse(input, parse_options)?;
    let tables: Vec<_> = doc.tables().collect();
    let outcome = map_tables(&tables, options, store, resolver)?;
    if outcome.mapped.is_empty() {
        info!("{}: no table met the minimum mapping score", input.display());
    }

    let workbook = mapping_workbook(&outcome);
    XlsxWriter::new().write(&workbook, output)?;

    Ok(MapSummary {
        output: output.to_path_buf(),
        tables: tables.len(),
        analyzed: outcome.structures.iter().flatten().count(),
        mapped: outcome.mapped.len(),
        report: outcome.report,
    })
}

/// A document that could not be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchIssue {
    /// Input document
    pub path: PathBuf,
    /// Error description
    pub message: String,
}

/// Result of a batch run.
#[derive(Debug, Clone)]
pub struct BatchReport<T> {
    /// Per-document summaries of successful conversions, in input order
    pub completed: Vec<T>,
    /// Failed documents, in input order
    pub issues: Vec<BatchIssue>,
}

impl<T> BatchReport<T> {
    fn new() -> Self {
        Self {
            completed: Vec::new(),
            issues: Vec::new(),
        }
    }

    fn record(&mut self, path: &Path, result: Result<T>) {
        match result {
            Ok(summary) => self.completed.push(summary),
            Err(e) => {
                warn!("skipping {}: {}", path.display(), e);
                self.issues.push(BatchIssue {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
            }
        }
    }

    /// Check if every document converted.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Sequential conversion of many documents.
///
/// Documents are processed one at a time in input order. In mapping mode
/// the same store is shared by all documents, so decisions made for one
/// document are reused for the next.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    inputs: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
    parse_options: ParseOptions,
}

impl Batch {
    /// Create a batch over the given documents.
    pub fn new(inputs: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            inputs: inputs.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Write outputs to a directory instead of next to each input.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Set parse options.
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }

    /// Input documents.
    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Check if the batch has no documents.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Run extraction over every document.
    ///
    /// `observe` is called after each document, for progress reporting.
    pub fn extract<F>(&self, options: &ExtractOptions, mut observe: F) -> BatchReport<ExtractSummary>
    where
        F: FnMut(&Path, Option<&ExtractSummary>),
    {
        let mut report = BatchReport::new();
        for input in &self.inputs {
            let output = extraction_output_path(input, self.output_dir.as_deref());
            let result = extract_file(input, &output, &self.parse_options, options);
            observe(input, result.as_ref().ok());
            report.record(input, result);
        }
        report
    }

    /// Run mapping over every document with a shared store.
    pub fn map<R, F>(
        &self,
        options: &MappingOptions,
        store: &mut MappingStore,
        resolver: &mut R,
        mut observe: F,
    ) -> BatchReport<MapSummary>
    where
        R: HeaderResolver + ?Sized,
        F: FnMut(&Path, Option<&MapSummary>),
    {
        let mut report = BatchReport::new();
        for input in &self.inputs {
            let output = mapping_output_path(input, self.output_dir.as_deref());
            let result = map_file(
                input,
                &output,
                &self.parse_options,
                options,
                store,
                resolver,
            );
            observe(input, result.as_ref().ok());
            report.record(input, result);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_paths() {
        let input = Path::new("docs/report.docx");
        assert_eq!(
            extraction_output_path(input, None),
            PathBuf::from("docs/report.xlsx")
        );
        assert_eq!(
            mapping_output_path(input, Some(Path::new("out"))),
            PathBuf::from("out/report_mapped.xlsx")
        );
    }

    #[test]
    fn test_batch_records_issues_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.docx");
        std::fs::write(&bad, b"not a zip").unwrap();
        let missing = dir.path().join("missing.docx");

        let batch = Batch::new(vec![bad.clone(), missing.clone()]);
        let mut seen = Vec::new();
        let report = batch.extract(&ExtractOptions::default(), |path, summary| {
            seen.push((path.to_path_buf(), summary.is_some()));
        });

        assert!(report.completed.is_empty());
        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.issues[0].path, bad);
        assert!(!report.is_clean());
        assert_eq!(seen, vec![(bad, false), (missing, false)]);
    }
}
