//! Error types for docsheet library.

use std::io;
use thiserror::Error;

/// Result type alias for docsheet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during document extraction and mapping.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as a Word document.
    #[error("Unknown file format: not a valid DOCX package")]
    UnknownFormat,

    /// The package is a ZIP archive but not a usable Word document.
    #[error("Invalid DOCX document: {0}")]
    InvalidDocx(String),

    /// A required package part is missing.
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// Malformed XML inside a package part.
    #[error("XML error: {0}")]
    Xml(String),

    /// Error reading or writing the ZIP container.
    #[error("ZIP container error: {0}")]
    Zip(String),

    /// The persisted header mapping store could not be read or written.
    #[error("Mapping store error: {0}")]
    MappingStore(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error while laying out or serializing output.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            zip::result::ZipError::InvalidArchive(_) => Error::UnknownFormat,
            zip::result::ZipError::FileNotFound => Error::MissingPart(err.to_string()),
            _ => Error::Zip(err.to_string()),
        }
    }
}

impl From<roxmltree::Error> for Error {
    fn from(err: roxmltree::Error) -> Self {
        Error::Xml(err.to_string())
    }
}
