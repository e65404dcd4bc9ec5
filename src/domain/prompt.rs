//! Prompt-driven detection boundary.
//!
//! A language-model-backed service answers "what should be redacted for this
//! prompt?" with candidate strings. Candidates become literal rules and go
//! through the normal engine path.

use super::rule::{RedactionRule, RuleKind};
use crate::error::RedactorResult;
use serde::{Deserialize, Serialize};

/// Template identifier recorded on reports produced by a prompt pass.
pub const PROMPT_TEMPLATE_ID: &str = "ai_prompt";

/// A candidate returned by the prompt detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMatch {
    pub text: String,
    #[serde(rename = "type", default)]
    pub category: String,
    #[serde(rename = "reason", default)]
    pub rationale: String,
}

/// External prompt-based detector.
pub trait PromptDetector: Send + Sync {
    fn find_matches(&self, text: &str, prompt: &str) -> RedactorResult<Vec<PromptMatch>>;

    fn name(&self) -> &str;
}

#[derive(Deserialize)]
struct PromptResponse {
    #[serde(default)]
    matches: Vec<PromptMatch>,
}

/// Parses a free-form model reply into matches.
///
/// The reply may wrap its JSON object in prose or code fences; the object is
/// taken from the first `{` to the last `}`. Anything unparseable yields an
/// empty list.
pub fn parse_prompt_response(raw: &str) -> Vec<PromptMatch> {
    let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) else {
        tracing::warn!("prompt detector reply contained no JSON object");
        return Vec::new();
    };
    if end < start {
        return Vec::new();
    }

    match serde_json::from_str::<PromptResponse>(&raw[start..=end]) {
        Ok(response) => response.matches,
        Err(err) => {
            tracing::warn!(error = %err, "failed to parse prompt detector reply");
            Vec::new()
        }
    }
}

/// Turns prompt matches into literal rules, one per match.
pub fn rules_from_prompt_matches(matches: &[PromptMatch]) -> Vec<RedactionRule> {
    matches
        .iter()
        .enumerate()
        .map(|(i, m)| {
            RedactionRule::new(
                RuleKind::Literal(m.text.clone()),
                format!("AI Detected {}", m.category),
                format!("ai_{}", i),
            )
            .ai_detected(true)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fenced_reply() {
        let raw = "Here you go:\n```json\n{\"matches\": [{\"text\": \"Jane Roe\", \"type\": \"name\", \"reason\": \"personal\"}]}\n```";
        let matches = parse_prompt_response(raw);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "Jane Roe");
        assert_eq!(matches[0].category, "name");
        assert_eq!(matches[0].rationale, "personal");
    }

    #[test]
    fn test_malformed_reply_degrades_to_empty() {
        assert!(parse_prompt_response("no json here").is_empty());
        assert!(parse_prompt_response("{ not: valid }").is_empty());
        assert!(parse_prompt_response("} backwards {").is_empty());
    }

    #[test]
    fn test_rules_from_matches() {
        let matches = vec![
            PromptMatch {
                text: "Acme".into(),
                category: "company".into(),
                rationale: String::new(),
            },
            PromptMatch {
                text: "42 Elm St".into(),
                category: "address".into(),
                rationale: String::new(),
            },
        ];
        let rules = rules_from_prompt_matches(&matches);
        assert_eq!(rules[1].name(), "AI Detected address");
        assert_eq!(rules[1].id(), "ai_1");
        assert!(rules[1].is_ai_detected());
        assert_eq!(rules[0].kind(), &RuleKind::Literal("Acme".into()));
    }
}
