//! Redaction rules.
//!
//! Rules are immutable once constructed. The closed [`RuleKind`] variant makes
//! the "rule type we do not understand" case an explicit branch rather than a
//! silent fallthrough.

use serde::{Deserialize, Serialize};

/// Rule criterion, carrying the data each kind needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    /// Exact, case-sensitive substring
    Literal(String),

    /// Regular expression pattern
    Regex(String),

    /// Entity categories (e.g. `PERSON`, `EMAIL`); empty means every category
    Entity(Vec<String>),

    /// Rule type tag the engine does not know; skipped during location
    Unrecognized(String),
}

/// Stable label for a rule kind, as written into reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKindLabel {
    #[serde(alias = "text")]
    Literal,
    Regex,
    #[serde(alias = "spacy")]
    Entity,
    Unrecognized,
}

impl RuleKind {
    pub fn label(&self) -> RuleKindLabel {
        match self {
            Self::Literal(_) => RuleKindLabel::Literal,
            Self::Regex(_) => RuleKindLabel::Regex,
            Self::Entity(_) => RuleKindLabel::Entity,
            Self::Unrecognized(_) => RuleKindLabel::Unrecognized,
        }
    }
}

/// A named criterion identifying content to redact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactionRule {
    kind: RuleKind,
    name: String,
    id: String,
    ai_detected: bool,
}

impl RedactionRule {
    pub fn new(kind: RuleKind, name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            id: id.into(),
            ai_detected: false,
        }
    }

    pub fn literal(value: impl Into<String>, name: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(RuleKind::Literal(value.into()), name, id)
    }

    pub fn regex(pattern: impl Into<String>, name: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(RuleKind::Regex(pattern.into()), name, id)
    }

    pub fn entity<I, S>(categories: I, name: impl Into<String>, id: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let categories = categories.into_iter().map(Into::into).collect();
        Self::new(RuleKind::Entity(categories), name, id)
    }

    /// Marks the rule as produced by a model rather than a person.
    pub fn ai_detected(mut self, ai_detected: bool) -> Self {
        self.ai_detected = ai_detected;
        self
    }

    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_ai_detected(&self) -> bool {
        self.ai_detected
    }
}

/// Rule value as stored: one string, or a list for multi-category entity rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    One(String),
    Many(Vec<String>),
}

impl RuleValue {
    fn is_empty(&self) -> bool {
        match self {
            Self::One(s) => s.is_empty(),
            Self::Many(v) => v.is_empty(),
        }
    }

    fn into_single(self) -> String {
        match self {
            Self::One(s) => s,
            Self::Many(v) => v.join(""),
        }
    }

    fn into_list(self) -> Vec<String> {
        match self {
            Self::One(s) => vec![s],
            Self::Many(v) => v,
        }
    }
}

/// Rule as it arrives from rule storage or a JSON rules file.
///
/// Pattern rules keep their value under `pattern`, entity rules under `key`;
/// `value` is accepted for either.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleRecord {
    #[serde(rename = "type", default)]
    pub rule_type: Option<String>,

    #[serde(default, alias = "pattern", alias = "key")]
    pub value: Option<RuleValue>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, alias = "rule_id")]
    pub id: Option<String>,

    #[serde(default)]
    pub is_ai_detected: bool,
}

impl RuleRecord {
    /// Converts the record to a rule.
    ///
    /// Returns `None` when the type or value is missing; such records are
    /// dropped before they ever reach the engine.
    pub fn into_rule(self) -> Option<RedactionRule> {
        let rule_type = self.rule_type.filter(|t| !t.is_empty())?;
        let value = self.value.filter(|v| !v.is_empty())?;

        let kind = match rule_type.as_str() {
            "text" | "literal" => RuleKind::Literal(value.into_single()),
            "regex" => RuleKind::Regex(value.into_single()),
            "spacy" | "entity" => RuleKind::Entity(value.into_list()),
            _ => RuleKind::Unrecognized(rule_type),
        };

        let name = self.name.unwrap_or_else(|| "Unnamed Rule".to_string());
        let id = self.id.unwrap_or_else(|| "No ID".to_string());
        Some(RedactionRule::new(kind, name, id).ai_detected(self.is_ai_detected))
    }
}

/// Converts stored records into rules, dropping incomplete ones.
pub fn rules_from_records(records: Vec<RuleRecord>) -> Vec<RedactionRule> {
    records.into_iter().filter_map(RuleRecord::into_rule).collect()
}
