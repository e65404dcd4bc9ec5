//! Match Locator.
//!
//! Finds ordered, non-overlapping match spans for one rule inside one
//! structural unit. Rules are compiled once per request; entity lookups hit
//! the detector at most once per document.

use super::entity::{Entity, EntityDetector};
use super::rule::{RedactionRule, RuleKind};
use super::span::MatchSpan;
use crate::error::{RedactorError, RedactorResult};
use once_cell::unsync::OnceCell;
use regex::Regex;

/// A rule prepared for matching.
#[derive(Debug, Clone)]
pub struct CompiledRule<'r> {
    rule: &'r RedactionRule,
    matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    Literal(String),
    Regex(Option<Regex>),
    Entity(Vec<String>),
}

impl<'r> CompiledRule<'r> {
    /// Compiles a rule.
    ///
    /// Returns `Ok(None)` for rule kinds the engine does not understand, and
    /// `InvalidRule` for a malformed regex.
    pub fn compile(rule: &'r RedactionRule) -> RedactorResult<Option<Self>> {
        let matcher = match rule.kind() {
            RuleKind::Literal(value) => Matcher::Literal(value.clone()),
            RuleKind::Regex(pattern) if pattern.is_empty() => Matcher::Regex(None),
            RuleKind::Regex(pattern) => {
                let regex = Regex::new(pattern).map_err(|e| RedactorError::InvalidRule {
                    rule: rule.name().to_string(),
                    reason: e.to_string(),
                })?;
                Matcher::Regex(Some(regex))
            }
            RuleKind::Entity(categories) => Matcher::Entity(categories.clone()),
            RuleKind::Unrecognized(_) => return Ok(None),
        };
        Ok(Some(Self { rule, matcher }))
    }

    pub fn rule(&self) -> &'r RedactionRule {
        self.rule
    }
}

/// Per-document state shared by every `locate` call of one request.
pub struct LocateContext<'a> {
    full_text: &'a str,
    detector: Option<&'a dyn EntityDetector>,
    entities: OnceCell<Vec<Entity>>,
}

impl<'a> LocateContext<'a> {
    pub fn new(full_text: &'a str, detector: Option<&'a dyn EntityDetector>) -> Self {
        Self {
            full_text,
            detector,
            entities: OnceCell::new(),
        }
    }

    /// Entities for the whole document, fetched on first use.
    ///
    /// A missing or failing detector yields no entities.
    pub fn entities(&self) -> &[Entity] {
        self.entities.get_or_init(|| {
            let Some(detector) = self.detector else {
                tracing::warn!("entity rule present but no entity detector is configured");
                return Vec::new();
            };
            match detector.extract_entities(self.full_text) {
                Ok(entities) => {
                    tracing::debug!(
                        detector = detector.name(),
                        count = entities.len(),
                        "entity detection complete"
                    );
                    entities
                }
                Err(err) => {
                    tracing::warn!(
                        detector = detector.name(),
                        error = %err,
                        "entity detector unavailable, treating as no matches"
                    );
                    Vec::new()
                }
            }
        })
    }

    /// Whether the detector has been consulted yet.
    pub fn entities_loaded(&self) -> bool {
        self.entities.get().is_some()
    }
}

/// Locates all matches of `rule` in `unit_text`, left to right.
pub fn locate(unit_text: &str, rule: &CompiledRule<'_>, ctx: &LocateContext<'_>) -> Vec<MatchSpan> {
    match &rule.matcher {
        Matcher::Literal(value) => find_literal(unit_text, value),
        Matcher::Regex(None) => Vec::new(),
        Matcher::Regex(Some(regex)) => regex
            .find_iter(unit_text)
            .filter(|m| !m.is_empty())
            .map(|m| MatchSpan::new(m.start(), m.end(), m.as_str()))
            .collect(),
        Matcher::Entity(categories) => {
            let mut texts: Vec<&str> = Vec::new();
            for entity in ctx.entities() {
                if entity.matches_any(categories)
                    && !entity.text.is_empty()
                    && !texts.contains(&entity.text.as_str())
                {
                    texts.push(&entity.text);
                }
            }

            let mut spans: Vec<MatchSpan> = texts
                .into_iter()
                .flat_map(|text| find_literal(unit_text, text))
                .collect();
            spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
            drop_overlapping(spans)
        }
    }
}

/// Non-overlapping occurrences of `needle`, scanning forward past each match.
pub fn find_literal(haystack: &str, needle: &str) -> Vec<MatchSpan> {
    if needle.is_empty() {
        return Vec::new();
    }
    haystack
        .match_indices(needle)
        .map(|(start, text)| MatchSpan::new(start, start + text.len(), text))
        .collect()
}

/// Keeps the first of any overlapping spans; input must be sorted by start.
fn drop_overlapping(spans: Vec<MatchSpan>) -> Vec<MatchSpan> {
    let mut kept: Vec<MatchSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        if kept.last().map_or(true, |last| !last.overlaps(&span)) {
            kept.push(span);
        }
    }
    kept
}
