//! Property-based tests for event ordering and report merging.
//!
//! DOCX fixtures keep these fast; no MuPDF is involved.

use docredact::report::merge;
use docredact::{RedactionReport, RedactionRule, RedactionService};
use proptest::prelude::*;

mod common;
use common::*;

fn paragraphs() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-e ]{0,24}", 1..6)
}

fn docx(paragraphs: &[String]) -> docredact::Document {
    paragraphs
        .iter()
        .fold(TestDocxBuilder::new(), |b, p| b.with_paragraph(p))
        .build_document()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_indices_are_sequential_from_zero(
        paragraphs in paragraphs(),
        needles in prop::collection::vec("[a-e]{1,2}", 0..4),
    ) {
        let rules: Vec<RedactionRule> = needles
            .iter()
            .enumerate()
            .map(|(i, n)| RedactionRule::literal(n.clone(), format!("n{}", i), format!("r{}", i)))
            .collect();

        let outcome = RedactionService::with_secure_strategy()
            .redact(&docx(&paragraphs), &rules, "t")
            .unwrap();

        prop_assert!(outcome.report.is_sequential_from(0));
        prop_assert_eq!(outcome.report.total_redactions, outcome.report.events.len());

        let units: Vec<usize> = outcome.report.events.iter().map(|e| e.unit.number()).collect();
        let mut sorted = units.clone();
        sorted.sort();
        prop_assert_eq!(units, sorted);
    }

    #[test]
    fn prop_literal_occurrences_each_logged_and_removed(
        count in 0usize..6,
        filler in "[a-e ]{0,8}",
    ) {
        let text = std::iter::repeat("XYZ")
            .take(count)
            .collect::<Vec<_>>()
            .join(&format!(" {} ", filler));
        let rules = vec![RedactionRule::literal("XYZ", "token", "r1")];

        let outcome = RedactionService::with_secure_strategy()
            .redact(&docx(&[text]), &rules, "t")
            .unwrap();

        prop_assert_eq!(outcome.report.total_redactions, count);
        prop_assert!(!outcome.report.after_text.contains("XYZ"));
    }

    #[test]
    fn prop_empty_rules_leave_text_identical(paragraphs in paragraphs()) {
        let outcome = RedactionService::with_secure_strategy()
            .redact(&docx(&paragraphs), &[], "t")
            .unwrap();

        prop_assert_eq!(outcome.report.total_redactions, 0);
        prop_assert_eq!(&outcome.report.before_text, &outcome.report.after_text);
    }

    #[test]
    fn prop_merge_continues_numbering(prior_len in 0usize..8, fresh_len in 0usize..8) {
        let prior = fixture_report(prior_len, "first");
        let fresh = fixture_report(fresh_len, "second");

        let merged = merge(&prior, fresh);

        prop_assert_eq!(merged.total_redactions, prior_len + fresh_len);
        prop_assert!(merged.is_sequential_from(0));
        prop_assert_eq!(&merged.events[..prior_len], &prior.events[..]);
        prop_assert_eq!(merged.template_id.as_str(), "second");
    }
}

/// A report with `len` events produced by a real pass.
fn fixture_report(len: usize, template: &str) -> RedactionReport {
    let text = vec!["Q"; len].join(" ");
    RedactionService::with_secure_strategy()
        .redact(
            &docx(&[text]),
            &[RedactionRule::literal("Q", "q", "rq")],
            template,
        )
        .unwrap()
        .report
}
