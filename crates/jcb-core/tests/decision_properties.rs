//! Property-based tests for list ordering and precedence.

use jcb_common::ListKind;
use jcb_core::decision::{evaluate, Verdict};
use jcb_core::lists::{escape_pattern, is_representable, PatternList, PatternLists};
use proptest::prelude::*;
use std::path::Path;

fn list(kind: ListKind, patterns: &[String]) -> PatternList {
    let text: String = patterns.iter().map(|p| format!("{p};;\n")).collect();
    PatternList::parse(kind, &text, Path::new("prop.dat"))
}

/// Regex fragments, including the ones that need escaping in a list file.
fn pattern_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec!["a", "5", ".", ";", " ", r"\\", r"\d", "[0-9]"]),
        1..8,
    )
    .prop_map(|parts| parts.concat())
}

fn digits(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[0-9]{1,3}", 0..max)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn allow_always_wins_over_block(
        number in "[0-9]{7,10}",
        allow in digits(6),
        block in digits(6),
    ) {
        let lists = PatternLists::new(list(ListKind::Allow, &allow), list(ListKind::Block, &block));
        let verdict = evaluate(&lists, "", &number);
        if allow.iter().any(|p| number.contains(p.as_str())) {
            prop_assert!(matches!(verdict, Verdict::Allowed(_)));
        }
    }

    #[test]
    fn first_match_follows_file_order(
        number in "[0-9]{7,10}",
        allow in digits(6),
        block in digits(6),
    ) {
        let lists = PatternLists::new(list(ListKind::Allow, &allow), list(ListKind::Block, &block));
        let expected = allow
            .iter()
            .find(|p| number.contains(p.as_str()))
            .map(|p| (ListKind::Allow, p.clone()))
            .or_else(|| {
                block
                    .iter()
                    .find(|p| number.contains(p.as_str()))
                    .map(|p| (ListKind::Block, p.clone()))
            });

        let got = evaluate(&lists, "", &number)
            .matched()
            .map(|m| (m.list, m.pattern.clone()));
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn evaluation_is_deterministic(number in "[0-9]{7,10}", block in digits(8)) {
        let lists = PatternLists::new(list(ListKind::Allow, &[]), list(ListKind::Block, &block));
        prop_assert_eq!(evaluate(&lists, "", &number), evaluate(&lists, "", &number));
    }

    #[test]
    fn representable_patterns_survive_a_rewrite(pattern in pattern_text()) {
        prop_assume!(is_representable(&pattern));
        prop_assume!(regex::Regex::new(&pattern).is_ok());
        let text = format!("{};p;note\n", escape_pattern(&pattern));
        let parsed = PatternList::parse(ListKind::Block, &text, Path::new("prop.dat"));
        prop_assert_eq!(parsed.len(), 1);
        prop_assert_eq!(parsed.entries()[0].pattern(), pattern.as_str());
        prop_assert_eq!(parsed.render(), text);
    }
}
