//! Custom assertions for redaction testing.
//!
//! Domain-specific checks over extracted text and reports, with failure
//! messages that show what leaked.

use docredact::{Document, RedactionReport, RedactionService};

/// Extracts the flat text of a document, panicking on failure.
pub fn extract_text_or_panic(document: &Document) -> String {
    RedactionService::with_secure_strategy()
        .extract_text(document)
        .unwrap_or_else(|e| panic!("Failed to extract {} text: {}", document.format(), e))
}

/// Asserts that none of `patterns` survives in the document's text.
///
/// # Panics
/// Panics listing every pattern still present.
pub fn assert_all_redacted(document: &Document, patterns: &[&str]) {
    let text = extract_text_or_panic(document);
    let found: Vec<&str> = patterns
        .iter()
        .copied()
        .filter(|p| text.contains(p))
        .collect();
    assert!(
        found.is_empty(),
        "Patterns {:?} should be redacted but were found in output {}.\nExtracted text: {:?}",
        found,
        document.format(),
        text
    );
}

/// Asserts that `pattern` is still present in the document's text.
pub fn assert_preserved(document: &Document, pattern: &str) {
    let text = extract_text_or_panic(document);
    assert!(
        text.contains(pattern),
        "Pattern '{}' should be preserved but was not found.\nExtracted text: {:?}",
        pattern,
        text
    );
}

/// Asserts event indices run `offset, offset+1, ...` and the count matches.
pub fn assert_sequential(report: &RedactionReport, offset: usize) {
    let indices: Vec<usize> = report.events.iter().map(|e| e.index).collect();
    assert!(
        report.is_sequential_from(offset),
        "Event indices should start at {} and be contiguous, got {:?}",
        offset,
        indices
    );
    assert_eq!(
        report.total_redactions,
        offset + report.events.len(),
        "total_redactions should equal the last index + 1"
    );
}
