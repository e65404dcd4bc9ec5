//! Error handling tests.
//!
//! Verify user-facing messages, conversions and how errors surface from the
//! public entry points.

use docredact::error::{RedactorError, RedactorResult};
use docredact::{Document, RedactionRule, RedactionService};
use std::error::Error as StdError;
use std::io;
use std::path::{Path, PathBuf};

mod common;
use common::*;

#[test]
fn test_io_error_display() {
    let err = RedactorError::Io {
        path: PathBuf::from("/test/path.docx"),
        source: io::Error::new(io::ErrorKind::NotFound, "file not found"),
    };

    let display = err.to_string();
    assert!(display.contains("/test/path.docx"));
    assert!(display.contains("IO error"));
    assert!(display.contains("file not found"));
    assert!(err.source().is_some());
}

#[test]
fn test_invalid_rule_display_names_rule() {
    let err = RedactorError::InvalidRule {
        rule: "Account numbers".to_string(),
        reason: "unclosed group".to_string(),
    };
    let display = err.to_string();
    assert!(display.contains("Account numbers"));
    assert!(display.contains("unclosed group"));
}

#[test]
fn test_corrupt_helper_keeps_source() {
    let cause = io::Error::new(io::ErrorKind::InvalidData, "bad header");
    let err = RedactorError::corrupt("PDF", "failed to parse", cause);

    assert!(matches!(err, RedactorError::CorruptDocument { ref format, .. } if format == "PDF"));
    let source = err.source().expect("source preserved");
    assert!(source.to_string().contains("bad header"));
}

#[test]
fn test_regex_error_converts_to_invalid_rule() {
    fn compile() -> RedactorResult<regex::Regex> {
        Ok(regex::Regex::new("(")?)
    }
    assert!(matches!(compile(), Err(RedactorError::InvalidRule { .. })));
}

#[test]
fn test_json_error_converts_to_storage() {
    fn parse() -> RedactorResult<serde_json::Value> {
        Ok(serde_json::from_str("{not json")?)
    }
    assert!(matches!(parse(), Err(RedactorError::Storage { .. })));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = Document::open(Path::new("/nonexistent/input.docx")).unwrap_err();
    assert!(matches!(err, RedactorError::Io { .. }));
}

#[test]
fn test_unsupported_extension() {
    let err = Document::from_bytes(b"plain text".to_vec(), Some("notes.txt")).unwrap_err();
    match err {
        RedactorError::UnsupportedFormat { format } => assert_eq!(format, ".txt"),
        other => panic!("expected UnsupportedFormat, got {:?}", other),
    }
}

#[test]
fn test_unknown_bytes_without_name() {
    let err = Document::from_bytes(b"plain text".to_vec(), None).unwrap_err();
    assert!(matches!(err, RedactorError::UnsupportedFormat { ref format } if format == "unknown"));
}

#[test]
fn test_invalid_regex_aborts_without_output() {
    let doc = TestDocxBuilder::new()
        .with_paragraph("Sensitive")
        .build_document()
        .unwrap();
    let rules = vec![
        RedactionRule::literal("Sensitive", "Word", "r1"),
        RedactionRule::regex("[unclosed", "Broken", "r2"),
    ];

    let err = RedactionService::with_secure_strategy()
        .redact(&doc, &rules, "t")
        .unwrap_err();

    match err {
        RedactorError::InvalidRule { rule, .. } => assert_eq!(rule, "Broken"),
        other => panic!("expected InvalidRule, got {:?}", other),
    }
}

#[test]
fn test_fatal_classification() {
    let fatal = [
        RedactorError::NotFound {
            document_id: "d".into(),
        },
        RedactorError::FetchError {
            url: "u".into(),
            reason: "HTTP 500".into(),
        },
        RedactorError::InvalidRule {
            rule: "r".into(),
            reason: "x".into(),
        },
    ];
    assert!(fatal.iter().all(RedactorError::is_fatal));

    let degraded = RedactorError::DetectorUnavailable {
        detector: "ner".into(),
        reason: "timeout".into(),
    };
    assert!(!degraded.is_fatal());
}
