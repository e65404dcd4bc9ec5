//! Named-entity detection boundary.
//!
//! The engine consumes an injected [`EntityDetector`]; the host application
//! owns its lifecycle. Failures come back as
//! [`RedactorError::DetectorUnavailable`](crate::RedactorError) and are
//! treated as "no entities" by the Match Locator.

use crate::error::RedactorResult;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A category-labeled text span reported by a detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    #[serde(rename = "type")]
    pub category: String,
}

impl Entity {
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
        }
    }

    /// Case-insensitive category filter; an empty filter accepts everything.
    pub fn matches_any(&self, categories: &[String]) -> bool {
        categories.is_empty()
            || categories
                .iter()
                .any(|c| c.eq_ignore_ascii_case(&self.category))
    }
}

/// External named-entity recognition service.
pub trait EntityDetector: Send + Sync {
    /// Returns entities found in `text`, in detector order.
    fn extract_entities(&self, text: &str) -> RedactorResult<Vec<Entity>>;

    /// Human-readable name used in logs and errors.
    fn name(&self) -> &str;
}

/// Regex-backed detector for well-formed categories (emails, phone numbers).
///
/// Usable wherever a model-backed detector is unavailable.
#[derive(Debug, Clone, Default)]
pub struct PatternEntityDetector {
    patterns: Vec<(String, Regex)>,
}

impl PatternEntityDetector {
    /// Creates a detector with no categories.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detector with the built-in `EMAIL` and `PHONE` categories.
    pub fn with_builtin() -> Self {
        Self::new()
            .with_pattern("EMAIL", email_regex().clone())
            .with_pattern("PHONE", phone_regex().clone())
    }

    pub fn with_pattern(mut self, category: impl Into<String>, pattern: Regex) -> Self {
        self.patterns.push((category.into(), pattern));
        self
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|(c, _)| c.as_str())
    }
}

impl EntityDetector for PatternEntityDetector {
    fn extract_entities(&self, text: &str) -> RedactorResult<Vec<Entity>> {
        let mut found: Vec<(usize, Entity)> = Vec::new();
        for (category, pattern) in &self.patterns {
            for m in pattern.find_iter(text) {
                if category == "PHONE" && !is_valid_nanp(m.as_str()) {
                    continue;
                }
                found.push((m.start(), Entity::new(m.as_str(), category.as_str())));
            }
        }
        found.sort_by_key(|(start, _)| *start);
        Ok(found.into_iter().map(|(_, e)| e).collect())
    }

    fn name(&self) -> &str {
        "pattern"
    }
}

fn email_regex() -> &'static Regex {
    static PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("Valid email regex")
    });
    &PATTERN
}

/// Ten-digit phone shapes: (555) 234-5678, 555-234-5678, 555.234.5678,
/// +1 555 234 5678. Candidates still need [`is_valid_nanp`].
fn phone_regex() -> &'static Regex {
    static PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?:\+?1[-.\s]?)?\(?\b(\d{3})\)?[-.\s]?(\d{3})[-.\s]?(\d{4})\b")
            .expect("Valid phone number regex")
    });
    &PATTERN
}

/// Area code and exchange must both start with 2-9.
fn is_valid_nanp(candidate: &str) -> bool {
    phone_regex().captures(candidate).is_some_and(|caps| {
        let area = caps.get(1).map_or("", |m| m.as_str());
        let exchange = caps.get(2).map_or("", |m| m.as_str());
        let subscriber = caps.get(3).map_or("", |m| m.as_str());
        area.len() == 3
            && exchange.len() == 3
            && subscriber.len() == 4
            && area.starts_with(|c: char| ('2'..='9').contains(&c))
            && exchange.starts_with(|c: char| ('2'..='9').contains(&c))
    })
}
