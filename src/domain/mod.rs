//! Domain models and matching logic.
//!
//! Rules, match spans, the Match Locator, and the detector boundaries the
//! locator consumes.

pub mod entity;
pub mod locator;
pub mod prompt;
pub mod rule;
pub mod span;

pub use entity::{Entity, EntityDetector, PatternEntityDetector};
pub use locator::{find_literal, locate, CompiledRule, LocateContext};
pub use prompt::{
    parse_prompt_response, rules_from_prompt_matches, PromptDetector, PromptMatch,
    PROMPT_TEMPLATE_ID,
};
pub use rule::{rules_from_records, RedactionRule, RuleKind, RuleKindLabel, RuleRecord, RuleValue};
pub use span::{merge_ranges, MatchSpan};
