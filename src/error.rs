//! Error types for the redaction engine.
//!
//! Errors are categorized by the stage that produced them so the request
//! layer can decide what to surface and when to mark a document as failed.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for redaction operations.
pub type RedactorResult<T> = Result<T, RedactorError>;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Error type for all redaction operations.
#[derive(Debug, Error)]
pub enum RedactorError {
    /// Error occurred while reading or writing files
    #[error("IO error for path '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Document type could not be recognized from its name or signature
    #[error("Unsupported document format: {format}")]
    UnsupportedFormat { format: String },

    /// The parser for a recognized format could not open the byte stream
    #[error("Corrupt {format} document: {message}")]
    CorruptDocument {
        format: String,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Error occurred while redacting a PDF page
    #[error("PDF processing error{}: {message}", page.map(|p| format!(" on page {}", p)).unwrap_or_default())]
    PdfProcessing {
        message: String,
        page: Option<usize>,
        #[source]
        source: Option<BoxedSource>,
    },

    /// A rule could not be compiled (malformed regex, missing field)
    #[error("Invalid rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },

    /// Entity or prompt detector failed; callers degrade to zero matches
    #[error("{detector} detector unavailable: {reason}")]
    DetectorUnavailable { detector: String, reason: String },

    /// Document retrieval failed (non-2xx or transport failure)
    #[error("Failed to fetch '{url}': {reason}")]
    FetchError { url: String, reason: String },

    /// No stored report exists for the document
    #[error("No redaction report found for document '{document_id}'")]
    NotFound { document_id: String },

    /// Report or blob persistence failed
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Configuration file could not be parsed
    #[error("Invalid configuration '{}': {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    /// Backend-specific error (MuPDF, zip, etc.)
    #[error("{backend} backend error: {message}")]
    BackendError {
        backend: String,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
}

impl RedactorError {
    /// Builds a `CorruptDocument` error wrapping the parser failure.
    pub fn corrupt(
        format: impl Into<String>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::CorruptDocument {
            format: format.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns false only for errors that degrade to an empty result.
    ///
    /// Every other kind aborts the whole request with no partial report.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::DetectorUnavailable { .. })
    }
}

impl From<io::Error> for RedactorError {
    fn from(err: io::Error) -> Self {
        Self::BackendError {
            backend: "std::io".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<regex::Error> for RedactorError {
    fn from(err: regex::Error) -> Self {
        Self::InvalidRule {
            rule: "<unknown>".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for RedactorError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::BackendError {
            backend: "zip".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for RedactorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage {
            message: format!("JSON serialization failed: {}", err),
            source: Some(Box::new(err)),
        }
    }
}
