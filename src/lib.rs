//! Rule-driven redaction for PDF and DOCX documents.
//!
//! Given a document and an ordered set of rules (literal strings, regular
//! expressions, entity categories), the engine locates every match in each
//! page or paragraph, physically removes it, and returns the redacted bytes
//! together with an audit report. A later prompt-driven pass can append to
//! an existing report without renumbering its events.
//!
//! # Features
//!
//! - **Secure PDF Redaction**: MuPDF redaction annotations remove content under each match
//! - **DOCX Blackout**: Matched characters are overwritten with block glyphs inside `<w:t>` runs
//! - **Audit Reports**: Ordered events, highlighted "before" text and re-extracted "after" text
//! - **Report Merging**: Follow-up passes continue the event index sequence
//!
//! # Architecture
//!
//! - [`domain`]: Rules, match spans, the match locator and detector boundaries
//! - [`document`]: Format detection and per-unit text extraction types
//! - [`redaction`]: Format strategies and the redaction service
//! - [`report`]: Report building, highlighting and merging
//! - [`pipeline`]: Fetch, upload, persistence and status flows
//! - [`error`]: Error taxonomy
//!
//! # Quick Start
//!
//! ```no_run
//! use docredact::{Document, RedactionRule, RedactionService};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = RedactionService::with_secure_strategy();
//! let document = Document::open(Path::new("contract.docx"))?;
//!
//! let rules = vec![
//!     RedactionRule::literal("John Doe", "Client name", "r1"),
//!     RedactionRule::regex(r"\d{3}-\d{2}-\d{4}", "SSN", "r2"),
//! ];
//! let outcome = service.redact(&document, &rules, "template-1")?;
//!
//! std::fs::write("contract_redacted.docx", outcome.document.bytes())?;
//! println!("{} redactions", outcome.report.total_redactions);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod document;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod redaction;
pub mod report;

pub use config::Config;
pub use document::{Document, DocumentFormat, Extraction, TextUnit, UnitLocator};
pub use domain::{
    EntityDetector, MatchSpan, PatternEntityDetector, PromptDetector, PromptMatch, RedactionRule,
    RuleKind, RuleRecord,
};
pub use error::{RedactorError, RedactorResult};
pub use pipeline::{PromptRedactRequest, RedactRequest, RedactionPipeline};
pub use redaction::{
    DocxRedactionStrategy, RedactionOutcome, RedactionResult, RedactionService,
    RedactionStrategy, SecureRedactionStrategy,
};
pub use report::{RedactionEvent, RedactionRecord, RedactionReport};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_creation() {
        let service = RedactionService::with_secure_strategy();
        assert_eq!(service.strategy(DocumentFormat::Pdf).format(), DocumentFormat::Pdf);
        assert_eq!(service.strategy(DocumentFormat::Docx).format(), DocumentFormat::Docx);
    }
}
