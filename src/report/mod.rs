//! Redaction reports.
//!
//! A report is the audit record of one redaction invocation: one event per
//! located match in unit-then-rule-then-match order, a highlighted "before"
//! rendition and the text a reader sees afterwards.

pub mod merge;

pub use merge::{merge, RedactionRecord};

use crate::document::{TextUnit, UnitLocator};
use crate::domain::{merge_ranges, MatchSpan, RedactionRule, RuleKindLabel};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// One logged instance of a matched span being blacked out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionEvent {
    #[serde(rename = "rule")]
    pub rule_name: String,

    #[serde(rename = "type")]
    pub rule_kind: RuleKindLabel,

    #[serde(rename = "text")]
    pub matched_text: String,

    /// Serialized as `"page": n` or `"paragraph": n`
    #[serde(flatten)]
    pub unit: UnitLocator,

    pub rule_id: String,

    pub index: usize,

    #[serde(rename = "is_ai_detected")]
    pub ai_detected: bool,
}

/// The audit record of a redaction pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionReport {
    /// Original text with every redacted span wrapped in highlight markers
    pub before_text: String,

    /// Text re-extracted from the redacted document
    pub after_text: String,

    #[serde(rename = "redactions")]
    pub events: Vec<RedactionEvent>,

    pub total_redactions: usize,

    pub template_id: String,
}

impl RedactionReport {
    /// Events recorded against `unit`, in index order.
    pub fn events_for(&self, unit: UnitLocator) -> impl Iterator<Item = &RedactionEvent> {
        self.events.iter().filter(move |e| e.unit == unit)
    }

    /// True when `events[i].index == offset + i` for every event.
    pub fn is_sequential_from(&self, offset: usize) -> bool {
        self.events
            .iter()
            .enumerate()
            .all(|(i, e)| e.index == offset + i)
    }
}

/// Markers placed around highlighted spans in the "before" text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightStyle {
    pub open: String,
    pub close: String,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            open: "<span style='background-color: yellow;'>".to_string(),
            close: "</span>".to_string(),
        }
    }
}

/// Wraps each range of `text` in highlight markers.
///
/// Ranges are byte offsets; overlapping ranges collapse into one highlight.
/// Only the given offsets are marked, so repeated strings elsewhere in the
/// document stay unhighlighted.
pub fn highlight(text: &str, ranges: Vec<Range<usize>>, style: &HighlightStyle) -> String {
    let ranges = merge_ranges(ranges);
    let extra = ranges.len() * (style.open.len() + style.close.len());
    let mut out = String::with_capacity(text.len() + extra);

    let mut cursor = 0;
    for range in ranges {
        let (start, end) = (range.start.min(text.len()), range.end.min(text.len()));
        if start < cursor || !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            continue;
        }
        out.push_str(&text[cursor..start]);
        out.push_str(&style.open);
        out.push_str(&text[start..end]);
        out.push_str(&style.close);
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Accumulates events in the order they are recorded and renders the report.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    template_id: String,
    next_index: usize,
    style: HighlightStyle,
    events: Vec<RedactionEvent>,
    marks: Vec<Range<usize>>,
}

impl ReportBuilder {
    pub fn new(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            next_index: 0,
            style: HighlightStyle::default(),
            events: Vec::new(),
            marks: Vec::new(),
        }
    }

    pub fn with_highlight(mut self, style: HighlightStyle) -> Self {
        self.style = style;
        self
    }

    /// Records one event for `span` found by `rule` in `unit`.
    ///
    /// Callers must record in unit order, then rule order, then match order.
    pub fn record(&mut self, unit: &TextUnit, rule: &RedactionRule, span: &MatchSpan) {
        self.events.push(RedactionEvent {
            rule_name: rule.name().to_string(),
            rule_kind: rule.kind().label(),
            matched_text: span.text.clone(),
            unit: unit.locator,
            rule_id: rule.id().to_string(),
            index: self.next_index,
            ai_detected: rule.is_ai_detected(),
        });
        self.next_index += 1;
        self.marks.push(span.shifted(unit.offset));
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Renders the report from the original full text and the re-extracted
    /// text of the redacted document.
    pub fn build(self, before_text: &str, after_text: String) -> RedactionReport {
        let before_text = highlight(before_text, self.marks, &self.style);
        RedactionReport {
            before_text,
            after_text,
            total_redactions: self.events.len(),
            events: self.events,
            template_id: self.template_id,
        }
    }
}
