//! Incremental merge of reports across redaction passes.
//!
//! A second pass over an already-redacted document appends to the prior
//! report so the result reads as one continuous audit trail.

use super::RedactionReport;
use crate::domain::PromptMatch;
use serde::{Deserialize, Serialize};

/// Folds `fresh` onto `prior`.
///
/// Fresh events are renumbered to continue from `prior.total_redactions`,
/// keeping their relative order. The rendered texts and template id come
/// from `fresh`.
pub fn merge(prior: &RedactionReport, fresh: RedactionReport) -> RedactionReport {
    let offset = prior.total_redactions;
    let added = fresh.events.len();

    let mut events = Vec::with_capacity(prior.events.len() + added);
    events.extend(prior.events.iter().cloned());
    events.extend(fresh.events.into_iter().enumerate().map(|(i, mut event)| {
        event.index = offset + i;
        event
    }));

    RedactionReport {
        before_text: fresh.before_text,
        after_text: fresh.after_text,
        events,
        total_redactions: offset + added,
        template_id: fresh.template_id,
    }
}

/// Persisted outcome of a redaction request: the report plus the document
/// references needed to re-open and extend it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionRecord {
    pub document_id: String,

    #[serde(default)]
    pub user_id: String,

    pub template_id: String,

    /// Where the unredacted source came from
    pub original_url: String,

    pub original_filename: String,

    /// Latest redacted document location
    #[serde(rename = "file_url")]
    pub redacted_url: String,

    pub redacted_filename: String,

    pub report: RedactionReport,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ai_detected_matches: Vec<PromptMatch>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_previous_redactions: Option<usize>,
}

impl RedactionRecord {
    /// Produces the record for a follow-up pass.
    ///
    /// Original-document references survive; the requesting user, report,
    /// template id and redacted location are replaced by the new pass.
    pub fn merged_with(
        &self,
        user_id: impl Into<String>,
        fresh: RedactionReport,
        redacted_url: impl Into<String>,
        prompt: Option<String>,
        ai_detected_matches: Vec<PromptMatch>,
    ) -> RedactionRecord {
        let report = merge(&self.report, fresh);
        RedactionRecord {
            document_id: self.document_id.clone(),
            user_id: user_id.into(),
            template_id: report.template_id.clone(),
            original_url: self.original_url.clone(),
            original_filename: self.original_filename.clone(),
            redacted_url: redacted_url.into(),
            redacted_filename: self.redacted_filename.clone(),
            report,
            prompt,
            ai_detected_matches,
            total_previous_redactions: Some(self.report.total_redactions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::UnitLocator;
    use crate::domain::RuleKindLabel;
    use crate::report::RedactionEvent;

    fn event(text: &str, index: usize) -> RedactionEvent {
        RedactionEvent {
            rule_name: "r".into(),
            rule_kind: RuleKindLabel::Literal,
            matched_text: text.into(),
            unit: UnitLocator::Page(1),
            rule_id: "id".into(),
            index,
            ai_detected: false,
        }
    }

    fn report(texts: &[&str], template: &str) -> RedactionReport {
        RedactionReport {
            before_text: format!("before {}", template),
            after_text: format!("after {}", template),
            events: texts.iter().enumerate().map(|(i, t)| event(t, i)).collect(),
            total_redactions: texts.len(),
            template_id: template.into(),
        }
    }

    #[test]
    fn test_merge_continues_numbering() {
        let prior = report(&["a", "b", "c", "d", "e"], "tpl");
        let fresh = report(&["x", "y", "z"], "ai_prompt");

        let merged = merge(&prior, fresh);
        assert_eq!(merged.total_redactions, 8);
        assert!(merged.is_sequential_from(0));
        let tail: Vec<(&str, usize)> = merged.events[5..]
            .iter()
            .map(|e| (e.matched_text.as_str(), e.index))
            .collect();
        assert_eq!(tail, vec![("x", 5), ("y", 6), ("z", 7)]);
        assert_eq!(merged.before_text, "before ai_prompt");
        assert_eq!(merged.template_id, "ai_prompt");
    }

    #[test]
    fn test_merge_with_empty_fresh_keeps_prior_events() {
        let prior = report(&["a"], "tpl");
        let merged = merge(&prior, report(&[], "ai_prompt"));
        assert_eq!(merged.events, prior.events);
        assert_eq!(merged.total_redactions, 1);
    }

    #[test]
    fn test_record_merge_preserves_original_reference() {
        let record = RedactionRecord {
            document_id: "doc".into(),
            user_id: "u".into(),
            template_id: "tpl".into(),
            original_url: "https://store/doc.pdf".into(),
            original_filename: "doc.pdf".into(),
            redacted_url: "https://store/u/redacted/doc.pdf?v=1".into(),
            redacted_filename: "doc_redacted.pdf".into(),
            report: report(&["a", "b"], "tpl"),
            prompt: None,
            ai_detected_matches: Vec::new(),
            total_previous_redactions: None,
        };

        let next = record.merged_with(
            "u2",
            report(&["c"], "ai_prompt"),
            "https://store/u/redacted/doc.pdf?v=2",
            Some("names".into()),
            Vec::new(),
        );
        assert_eq!(next.original_url, record.original_url);
        assert_eq!(next.user_id, "u2");
        assert_eq!(next.redacted_url, "https://store/u/redacted/doc.pdf?v=2");
        assert_eq!(next.total_previous_redactions, Some(2));
        assert_eq!(next.report.total_redactions, 3);
        assert_eq!(next.template_id, "ai_prompt");

        let json = serde_json::to_value(&next).unwrap();
        assert_eq!(json["file_url"], "https://store/u/redacted/doc.pdf?v=2");
        assert_eq!(json["report"]["redactions"][2]["index"], 2);
    }
}
