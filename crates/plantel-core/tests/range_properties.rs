//! Property-based tests for ring range expansion.
//!
//! 1. A valid range under the ceiling yields exactly `end - start + 1`
//!    unique, padded, ordered codes
//! 2. A range over the ceiling yields nothing

// Integration tests have relaxed clippy settings for test ergonomics.
// Production code (src/) must use strict zero-unwrap/panic patterns.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::uninlined_format_args,
    clippy::cast_possible_truncation
)]

use std::collections::HashSet;

use plantel_core::{
    inventory::{expand_range, RangeError},
    RingStatusKind,
};
use plantel_core::domain::RingAttributes;
use proptest::prelude::*;

const CEILING: u64 = 2000;

fn standard_config() -> ProptestConfig {
    ProptestConfig {
        cases: 100,
        ..ProptestConfig::default()
    }
}

/// A start value, a range length within the ceiling, and extra padding digits.
fn range_strategy() -> impl Strategy<Value = (u64, u64, usize)> {
    (0_u64..1_000_000, 0_u64..CEILING, 0_usize..4)
}

fn padded(n: u64, extra: usize) -> String {
    format!("{}{}", "0".repeat(extra), n)
}

proptest! {
    #![proptest_config(standard_config())]

    #[test]
    fn prop_range_count_and_padding((start, span, extra) in range_strategy()) {
        let end = start + span;
        let start_str = padded(start, extra);
        let end_str = end.to_string();
        let width = start_str.len().max(end_str.len());

        let drafts = expand_range(&start_str, &end_str, &RingAttributes::default(), None, CEILING)
            .expect("valid range");
        let codes: Vec<&str> = drafts.iter().map(|d| d.code.as_str()).collect();

        prop_assert_eq!(codes.len() as u64, span + 1);
        prop_assert!(codes.iter().all(|c| c.len() == width));
        let expected_first = format!("{start:0width$}");
        let expected_last = format!("{end:0width$}");
        prop_assert_eq!(codes.first().copied(), Some(expected_first.as_str()));
        prop_assert_eq!(codes.last().copied(), Some(expected_last.as_str()));

        let unique: HashSet<&str> = codes.iter().copied().collect();
        prop_assert_eq!(unique.len(), codes.len());
        prop_assert!(codes.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn prop_over_ceiling_yields_nothing(start in 0_u64..1_000_000, excess in 1_u64..10_000) {
        let end = start + CEILING - 1 + excess;
        let result = expand_range(
            &start.to_string(),
            &end.to_string(),
            &RingAttributes::default(),
            None,
            CEILING,
        );
        prop_assert_eq!(
            result,
            Err(RangeError::RangeTooLarge { requested: CEILING + excess, ceiling: CEILING })
        );
    }

    #[test]
    fn prop_reversed_range_rejected(start in 1_u64..1_000_000, back in 1_u64..1000) {
        let end = start.saturating_sub(back);
        prop_assume!(end < start);
        let result = expand_range(
            &start.to_string(),
            &end.to_string(),
            &RingAttributes::default(),
            None,
            CEILING,
        );
        let is_invalid_range = matches!(result, Err(RangeError::InvalidRange { .. }));
        prop_assert!(is_invalid_range);
    }
}

#[test]
fn test_one_to_five_thousand_is_too_large() {
    let result = expand_range("1", "5000", &RingAttributes::default(), None, CEILING);
    assert_eq!(
        result,
        Err(RangeError::RangeTooLarge {
            requested: 5000,
            ceiling: 2000
        })
    );
}

#[test]
fn test_expanded_rings_start_in_stock() {
    let drafts = expand_range("007", "010", &RingAttributes::default(), None, CEILING)
        .expect("valid range");
    let codes: Vec<&str> = drafts.iter().map(|d| d.code.as_str()).collect();
    assert_eq!(codes, ["007", "008", "009", "010"]);

    let now = chrono::Utc::now();
    assert!(drafts
        .into_iter()
        .map(|d| d.into_item(plantel_core::RingId::generate(), now))
        .all(|ring| ring.kind() == RingStatusKind::Estoque));
}
