//! Error types for the redeck library.

use std::io;
use thiserror::Error;

/// Result type alias for redeck operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building a presentation.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error reading or writing the ZIP archive.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// Error parsing or writing XML content.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// The template bytes are not a usable presentation container.
    #[error("Template load error: {0}")]
    TemplateLoad(String),

    /// The package is a recognized Office format, but not a presentation.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A required package part is missing.
    #[error("Missing component: {0}")]
    MissingComponent(String),

    /// A replacement value cannot be written as slide text.
    #[error("Invalid replacement value for {key}: expected string or number, found {found}")]
    InvalidReplacementValue {
        /// Token the value was supplied for
        key: String,
        /// Kind of value that was supplied
        found: String,
    },

    /// A slide relationship does not resolve to an existing part.
    #[error("Dangling relationship {rel_id}: {target}")]
    DanglingRelationship {
        /// Relationship ID (e.g., "rId7")
        rel_id: String,
        /// Target that could not be resolved
        target: String,
    },

    /// Invalid configuration (manifest, options).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The external converter failed or produced no output.
    #[error("Conversion failed: {0}")]
    Conversion(String),
}

impl Error {
    /// Whether the error came from rendering to a fixed-layout format
    /// rather than from generating the presentation itself.
    pub fn is_conversion(&self) -> bool {
        matches!(self, Error::Conversion(_))
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipArchive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<quick_xml::escape::EscapeError> for Error {
    fn from(err: quick_xml::escape::EscapeError) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
