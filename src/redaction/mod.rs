//! Redaction strategies and the engine that drives them.
//!
//! The service runs one stateless pass: extract per-unit text, locate matches
//! for every rule in every unit, apply physical redaction through the
//! format's strategy, and build the report from the original and redacted
//! text. Any fatal error aborts the pass; no partial document is returned.

pub mod docx;
pub mod secure;
pub mod strategy;

pub use docx::DocxRedactionStrategy;
pub use secure::SecureRedactionStrategy;
pub use strategy::{RedactionResult, RedactionStrategy, UnitMatches};

use crate::config::{Config, EngineConfig};
use crate::document::{Document, DocumentFormat, Extraction};
use crate::domain::{locate, CompiledRule, EntityDetector, LocateContext, RedactionRule};
use crate::error::RedactorResult;
use crate::report::{HighlightStyle, RedactionReport, ReportBuilder};
use std::sync::Arc;

/// Result of one redaction pass.
#[derive(Debug, Clone)]
pub struct RedactionOutcome {
    /// Freshly serialized redacted document
    pub document: Document,

    pub report: RedactionReport,

    /// Physical mark statistics
    pub stats: RedactionResult,
}

/// Redaction service coordinating strategy execution.
///
/// Holds no per-request state; the entity detector is injected and owned by
/// the host application.
pub struct RedactionService {
    pdf: Box<dyn RedactionStrategy>,
    docx: Box<dyn RedactionStrategy>,
    entity_detector: Option<Arc<dyn EntityDetector>>,
    strict_rules: bool,
    highlight: HighlightStyle,
}

impl Default for RedactionService {
    fn default() -> Self {
        Self::new(Box::new(SecureRedactionStrategy::new()), Box::new(DocxRedactionStrategy::new()))
    }
}

impl RedactionService {
    /// Creates a service with explicit paginated and flow strategies.
    pub fn new(pdf: Box<dyn RedactionStrategy>, docx: Box<dyn RedactionStrategy>) -> Self {
        Self {
            pdf,
            docx,
            entity_detector: None,
            strict_rules: EngineConfig::default().strict_rules,
            highlight: HighlightStyle::default(),
        }
    }

    /// Creates a service with secure (physical removal) strategies.
    pub fn with_secure_strategy() -> Self {
        Self::default()
    }

    /// Creates a service configured from `config`.
    pub fn from_config(config: &Config) -> Self {
        let pdf = SecureRedactionStrategy::new().with_max_hits(config.engine.max_hits_per_text);
        let docx = DocxRedactionStrategy::new().with_glyph(config.engine.block_glyph);
        Self::new(Box::new(pdf), Box::new(docx))
            .with_strict_rules(config.engine.strict_rules)
            .with_highlight(config.report.highlight_style())
    }

    pub fn with_entity_detector(mut self, detector: Arc<dyn EntityDetector>) -> Self {
        self.entity_detector = Some(detector);
        self
    }

    pub fn with_strict_rules(mut self, strict: bool) -> Self {
        self.strict_rules = strict;
        self
    }

    pub fn with_highlight(mut self, style: HighlightStyle) -> Self {
        self.highlight = style;
        self
    }

    /// Returns the strategy handling `format`.
    pub fn strategy(&self, format: DocumentFormat) -> &dyn RedactionStrategy {
        match format {
            DocumentFormat::Pdf => self.pdf.as_ref(),
            DocumentFormat::Docx => self.docx.as_ref(),
        }
    }

    /// Extracts text from a document for analysis.
    pub fn extract(&self, document: &Document) -> RedactorResult<Extraction> {
        self.strategy(document.format()).extract(document.bytes())
    }

    /// Extracts the flat text of a document.
    pub fn extract_text(&self, document: &Document) -> RedactorResult<String> {
        self.extract(document).map(Extraction::into_full_text)
    }

    /// Redacts `document` with `rules`, producing a fresh report.
    ///
    /// Event order is unit order, then the order of `rules`, then match order
    /// within the rule; indices start at 0.
    pub fn redact(
        &self,
        document: &Document,
        rules: &[RedactionRule],
        template_id: &str,
    ) -> RedactorResult<RedactionOutcome> {
        let strategy = self.strategy(document.format());
        let extraction = strategy.extract(document.bytes())?;
        let compiled = self.compile_rules(rules)?;

        let ctx = LocateContext::new(extraction.full_text(), self.entity_detector.as_deref());
        let mut builder = ReportBuilder::new(template_id).with_highlight(self.highlight.clone());
        let mut unit_matches = Vec::new();

        for (unit_index, unit) in extraction.units().iter().enumerate() {
            let mut spans = Vec::new();
            for rule in &compiled {
                let found = locate(&unit.text, rule, &ctx);
                if !found.is_empty() {
                    tracing::debug!(
                        unit = %unit.locator,
                        rule = rule.rule().name(),
                        matches = found.len(),
                        "rule matched"
                    );
                }
                for span in &found {
                    builder.record(unit, rule.rule(), span);
                }
                spans.extend(found);
            }
            if !spans.is_empty() {
                unit_matches.push(UnitMatches {
                    unit: unit_index,
                    spans,
                });
            }
        }

        let (bytes, stats) = if unit_matches.is_empty() {
            (document.bytes().to_vec(), RedactionResult::none())
        } else {
            strategy.apply(document.bytes(), &extraction, &unit_matches)?
        };

        let after_text = if unit_matches.is_empty() {
            extraction.full_text().to_string()
        } else {
            strategy.extract(&bytes)?.into_full_text()
        };

        let report = builder.build(extraction.full_text(), after_text);
        tracing::info!(
            format = %document.format(),
            strategy = strategy.name(),
            template_id,
            units = extraction.units().len(),
            events = report.total_redactions,
            marks = stats.marks_applied,
            "redaction pass complete"
        );

        Ok(RedactionOutcome {
            document: Document::new(document.format(), bytes),
            report,
            stats,
        })
    }

    /// Compiles rules, skipping unrecognized kinds.
    ///
    /// Invalid rules abort in strict mode and are skipped otherwise.
    fn compile_rules<'r>(&self, rules: &'r [RedactionRule]) -> RedactorResult<Vec<CompiledRule<'r>>> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            match CompiledRule::compile(rule) {
                Ok(Some(c)) => compiled.push(c),
                Ok(None) => {
                    tracing::warn!(rule = rule.name(), kind = ?rule.kind(), "skipping rule of unrecognized kind");
                }
                Err(err) if self.strict_rules => return Err(err),
                Err(err) => {
                    tracing::warn!(rule = rule.name(), error = %err, "skipping invalid rule");
                }
            }
        }
        Ok(compiled)
    }
}

impl std::fmt::Debug for RedactionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedactionService")
            .field("pdf", &self.pdf.name())
            .field("docx", &self.docx.name())
            .field(
                "entity_detector",
                &self.entity_detector.as_ref().map(|d| d.name().to_string()),
            )
            .field("strict_rules", &self.strict_rules)
            .finish()
    }
}
