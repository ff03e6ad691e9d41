//! DOCX format detection and validation.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// Package part every Word document contains.
pub const MAIN_DOCUMENT_PART: &str = "word/document.xml";

/// ZIP local file header magic: PK\x03\x04
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// DOCX format information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocxFormat {
    /// Number of parts in the package
    pub part_count: usize,
    /// Whether the package has an endnotes part
    pub has_endnotes: bool,
    /// Whether the package has a footnotes part
    pub has_footnotes: bool,
}

impl std::fmt::Display for DocxFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DOCX ({} parts)", self.part_count)
    }
}

/// Detect DOCX format from a file path.
///
/// # Example
/// ```no_run
/// use docsheet::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("report.docx").unwrap();
/// println!("{}", format);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<DocxFormat> {
    let file = File::open(path)?;
    inspect_package(BufReader::new(file))
}

/// Detect DOCX format from the complete package bytes.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<DocxFormat> {
    inspect_package(std::io::Cursor::new(data))
}

fn inspect_package<R: Read + Seek>(mut reader: R) -> Result<DocxFormat> {
    let mut magic = [0u8; 4];
    if reader.read_exact(&mut magic).is_err() || !has_zip_magic(&magic) {
        return Err(Error::UnknownFormat);
    }
    reader.rewind()?;

    let archive = zip::ZipArchive::new(reader)?;
    let names: Vec<&str> = archive.file_names().collect();
    if !names.contains(&MAIN_DOCUMENT_PART) {
        return Err(Error::InvalidDocx(format!(
            "package has no {}",
            MAIN_DOCUMENT_PART
        )));
    }

    Ok(DocxFormat {
        part_count: names.len(),
        has_endnotes: names.contains(&"word/endnotes.xml"),
        has_footnotes: names.contains(&"word/footnotes.xml"),
    })
}

/// Check if bytes start with the ZIP local file header.
pub fn has_zip_magic(data: &[u8]) -> bool {
    data.starts_with(ZIP_MAGIC)
}

/// Check if a file is a readable DOCX package.
pub fn is_docx<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok()
}

/// Check if bytes are a readable DOCX package.
pub fn is_docx_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}

/// Check if a path has a `.docx` extension, skipping Word lock files (`~$name.docx`).
pub fn has_docx_extension<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    let is_lock_file = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("~$"));
    !is_lock_file
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("docx"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn package(parts: &[&str]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for part in parts {
            zip.start_file(*part, SimpleFileOptions::default()).unwrap();
            zip.write_all(b"<x/>").unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_detect_valid_docx() {
        let data = package(&["[Content_Types].xml", MAIN_DOCUMENT_PART, "word/endnotes.xml"]);
        let format = detect_format_from_bytes(&data).unwrap();
        assert_eq!(format.part_count, 3);
        assert!(format.has_endnotes);
        assert!(!format.has_footnotes);
    }

    #[test]
    fn test_detect_invalid_format() {
        let result = detect_format_from_bytes(b"%PDF-1.7\n");
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_detect_too_short() {
        assert!(matches!(
            detect_format_from_bytes(b"PK"),
            Err(Error::UnknownFormat)
        ));
    }

    #[test]
    fn test_zip_without_document_part() {
        let data = package(&["xl/workbook.xml"]);
        assert!(matches!(
            detect_format_from_bytes(&data),
            Err(Error::InvalidDocx(_))
        ));
    }

    #[test]
    fn test_is_docx_bytes() {
        assert!(is_docx_bytes(&package(&[MAIN_DOCUMENT_PART])));
        assert!(!is_docx_bytes(b"Not a DOCX"));
    }

    #[test]
    fn test_docx_extension() {
        assert!(has_docx_extension("a/report.DOCX"));
        assert!(!has_docx_extension("a/~$report.docx"));
        assert!(!has_docx_extension("report.doc"));
    }
}
