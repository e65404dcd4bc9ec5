//! Documents and their extracted text.
//!
//! A [`Document`] is an owned byte buffer tagged with its format. Extraction
//! and redaction each produce fresh values; the source buffer is never
//! mutated in place.

use crate::error::{RedactorError, RedactorResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::path::Path;

/// Supported native formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Paginated format; structural unit is the page
    Pdf,
    /// Flow format; structural unit is the paragraph
    Docx,
}

impl DocumentFormat {
    /// Detects the format from a file name or URL, ignoring any query string.
    pub fn from_name(name: &str) -> Option<Self> {
        let path = name.split(['?', '#']).next().unwrap_or(name).trim();
        let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    /// Detects the format from the leading bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF-") {
            return Some(Self::Pdf);
        }
        if bytes.starts_with(b"PK\x03\x04") {
            let archive = zip::ZipArchive::new(Cursor::new(bytes)).ok()?;
            if archive.index_for_name("word/document.xml").is_some() {
                return Some(Self::Docx);
            }
        }
        None
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
        })
    }
}

/// Document bytes plus their format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    format: DocumentFormat,
    bytes: Vec<u8>,
}

impl Document {
    pub fn new(format: DocumentFormat, bytes: Vec<u8>) -> Self {
        Self { format, bytes }
    }

    /// Wraps bytes, detecting the format from `name` first and the byte
    /// signature second.
    pub fn from_bytes(bytes: Vec<u8>, name: Option<&str>) -> RedactorResult<Self> {
        let format = name
            .and_then(DocumentFormat::from_name)
            .or_else(|| DocumentFormat::sniff(&bytes))
            .ok_or_else(|| RedactorError::UnsupportedFormat {
                format: name
                    .and_then(|n| Path::new(n.split('?').next().unwrap_or(n)).extension())
                    .map(|e| format!(".{}", e.to_string_lossy()))
                    .unwrap_or_else(|| "unknown".to_string()),
            })?;
        Ok(Self::new(format, bytes))
    }

    /// Reads a document from disk.
    pub fn open(path: &Path) -> RedactorResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| RedactorError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_bytes(bytes, path.to_str())
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Location of a structural unit, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitLocator {
    Page(usize),
    Paragraph(usize),
}

impl UnitLocator {
    pub fn number(&self) -> usize {
        match self {
            Self::Page(n) | Self::Paragraph(n) => *n,
        }
    }
}

impl fmt::Display for UnitLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(n) => write!(f, "page {}", n),
            Self::Paragraph(n) => write!(f, "paragraph {}", n),
        }
    }
}

/// One structural unit's text and where it sits in the full text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUnit {
    pub locator: UnitLocator,
    pub text: String,
    /// Byte offset of `text` within the full document text
    pub offset: usize,
}

/// Flat text of a document plus its per-unit breakdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    full_text: String,
    units: Vec<TextUnit>,
}

impl Extraction {
    /// Builds an extraction by appending each unit's text followed by
    /// `separator`.
    pub fn from_units<I>(units: I, separator: &str) -> Self
    where
        I: IntoIterator<Item = (UnitLocator, String)>,
    {
        let mut extraction = Self::default();
        for (locator, text) in units {
            let offset = extraction.full_text.len();
            extraction.full_text.push_str(&text);
            extraction.full_text.push_str(separator);
            extraction.units.push(TextUnit {
                locator,
                text,
                offset,
            });
        }
        extraction
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    pub fn units(&self) -> &[TextUnit] {
        &self.units
    }

    pub fn into_full_text(self) -> String {
        self.full_text
    }
}
