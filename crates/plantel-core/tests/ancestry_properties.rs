//! Property-based tests for the ancestor path codec.
//!
//! 1. `is_valid_path` accepts exactly `^[fm]{1,6}$`
//! 2. Depth and side agree with the string
//! 3. Enumeration sizes match the binary tree

// Integration tests have relaxed clippy settings for test ergonomics.
// Production code (src/) must use strict zero-unwrap/panic patterns.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::uninlined_format_args,
    clippy::doc_markdown
)]

use std::collections::BTreeSet;

use plantel_core::domain::ancestry::{
    all_paths_at_depth, all_paths_up_to_depth, depth_of, is_valid_path, side_of, tree_key_count,
    AncestorPath, Side, MAX_DEPTH,
};
use proptest::prelude::*;
use regex::Regex;

fn fast_config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        max_shrink_iters: 256,
        ..ProptestConfig::default()
    }
}

// =============================================================================
// STRATEGIES
// =============================================================================

fn valid_path_strategy() -> impl Strategy<Value = String> {
    "[fm]{1,6}"
}

/// Arbitrary short strings, biased towards the path alphabet.
fn any_path_like_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[fm]{0,9}",
        "[fmFMx0 ]{0,8}",
        any::<String>(),
    ]
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(fast_config())]

    #[test]
    fn prop_validity_matches_pattern(path in any_path_like_strategy()) {
        let pattern = Regex::new("^[fm]{1,6}$").expect("valid regex");
        prop_assert_eq!(is_valid_path(&path), pattern.is_match(&path));
        prop_assert_eq!(AncestorPath::parse(path.clone()).is_ok(), pattern.is_match(&path));
    }

    #[test]
    fn prop_depth_is_length(path in valid_path_strategy()) {
        prop_assert_eq!(depth_of(&path).expect("valid path"), path.len());
    }

    #[test]
    fn prop_side_is_first_step(path in valid_path_strategy()) {
        let expected = if path.starts_with('f') { Side::Father } else { Side::Mother };
        prop_assert_eq!(side_of(&path).expect("valid path"), expected);
    }

    #[test]
    fn prop_child_then_parent_is_identity(path in "[fm]{1,5}", father in any::<bool>()) {
        let side = if father { Side::Father } else { Side::Mother };
        let p = AncestorPath::parse(path).expect("valid path");
        let child = p.child(side).expect("below max depth");
        prop_assert_eq!(child.depth(), p.depth() + 1);
        prop_assert_eq!(child.last_side(), side);
        prop_assert_eq!(child.parent(), Some(p));
    }

    #[test]
    fn prop_serde_rejects_invalid(path in "[a-z]{7,10}") {
        let json = format!("\"{path}\"");
        prop_assert!(serde_json::from_str::<AncestorPath>(&json).is_err());
    }
}

// =============================================================================
// ENUMERATION
// =============================================================================

#[test]
fn test_paths_at_each_depth() {
    for depth in 1..=MAX_DEPTH {
        let paths = all_paths_at_depth(depth).expect("depth in range");
        assert_eq!(paths.len(), 1 << depth);
        assert!(paths.iter().all(|p| p.depth() == depth));
    }
}

#[test]
fn test_depth_two_paths() {
    let paths: BTreeSet<String> = all_paths_at_depth(2)
        .expect("depth in range")
        .into_iter()
        .map(String::from)
        .collect();
    let expected: BTreeSet<String> = ["ff", "fm", "mf", "mm"].iter().map(|s| (*s).to_string()).collect();
    assert_eq!(paths, expected);
}

#[test]
fn test_full_tree_key_count() {
    for depth in 1..=MAX_DEPTH {
        let all = all_paths_up_to_depth(depth).expect("depth in range");
        assert_eq!(Ok(all.len()), tree_key_count(depth));
    }
    assert_eq!(tree_key_count(6), Ok(126));
}

#[test]
fn test_out_of_range_depths_rejected() {
    assert!(all_paths_at_depth(0).is_err());
    assert!(all_paths_at_depth(7).is_err());
    assert!(all_paths_up_to_depth(7).is_err());
}

#[test]
fn test_invalid_paths_report_reason() {
    for path in ["", "fx", "fffffff", "F"] {
        assert!(depth_of(path).is_err(), "{path:?} should be rejected");
        assert!(side_of(path).is_err(), "{path:?} should be rejected");
    }
}
