//! Redaction strategy trait and supporting types.
//!
//! A strategy owns one native format: it extracts per-unit text and applies
//! irreversible removal of located spans, re-serializing the document.

use crate::document::{DocumentFormat, Extraction};
use crate::domain::MatchSpan;
use crate::error::RedactorResult;

/// All spans located in one structural unit, across every rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitMatches {
    /// Index into [`Extraction::units`]
    pub unit: usize,

    /// Spans in rule-then-match order; may overlap across rules
    pub spans: Vec<MatchSpan>,
}

/// Statistics about the physical side of a redaction.
///
/// Event counts live in the report; these count marks actually written into
/// the document, where overlapping spans collapse into one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedactionResult {
    /// Number of physical marks applied
    pub marks_applied: usize,

    /// Units processed
    pub units_processed: usize,

    /// Units with at least one mark
    pub units_modified: usize,

    /// Whether content was removed (vs visually obscured)
    pub secure: bool,
}

impl RedactionResult {
    /// Creates a result indicating no redactions were needed.
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns true if any marks were applied.
    pub fn has_redactions(&self) -> bool {
        self.marks_applied > 0
    }
}

/// Strategy for extracting and redacting one native document format.
pub trait RedactionStrategy: Send + Sync {
    /// Format this strategy handles.
    fn format(&self) -> DocumentFormat;

    /// Extracts full text and per-unit text without touching `bytes`.
    ///
    /// Fails with `CorruptDocument` when the bytes cannot be opened.
    fn extract(&self, bytes: &[u8]) -> RedactorResult<Extraction>;

    /// Removes every span's content and returns freshly serialized bytes.
    ///
    /// `extraction` must come from [`extract`](Self::extract) on the same bytes.
    fn apply(
        &self,
        bytes: &[u8],
        extraction: &Extraction,
        matches: &[UnitMatches],
    ) -> RedactorResult<(Vec<u8>, RedactionResult)>;

    /// Returns a human-readable name for this strategy.
    fn name(&self) -> &str;

    /// Returns whether this strategy removes content rather than covering it.
    fn is_secure(&self) -> bool;
}
