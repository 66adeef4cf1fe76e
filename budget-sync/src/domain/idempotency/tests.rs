//! Tests for the idempotency building blocks.

use std::time::Duration;

use rstest::rstest;
use serde_json::json;

use super::*;

#[test]
fn generated_keys_are_distinct_v4_uuids() {
    let first = IdempotencyKey::generate();
    let second = IdempotencyKey::generate();

    assert_ne!(first, second);
    assert_eq!(first.as_uuid().get_version_num(), 4);
    assert_eq!(first.to_string(), first.as_uuid().hyphenated().to_string());
}

#[test]
fn key_order_and_nesting_order_do_not_change_the_hash() {
    let a = json!({"amountMinor": 7550, "meta": {"b": 1, "a": [2, {"y": 1, "x": 0}]}});
    let b = json!({"meta": {"a": [2, {"x": 0, "y": 1}], "b": 1}, "amountMinor": 7550});

    assert_eq!(
        canonicalize_and_hash(&a).expect("hash"),
        canonicalize_and_hash(&b).expect("hash")
    );
}

#[rstest]
#[case(json!({"amountMinor": 7550}), json!({"amountMinor": 7551}))]
#[case(json!([1, 2]), json!([2, 1]))]
#[case(json!({"a": null}), json!({}))]
#[case(json!("1"), json!(1))]
fn different_bodies_hash_differently(#[case] left: serde_json::Value, #[case] right: serde_json::Value) {
    assert_ne!(
        canonicalize_and_hash(&left).expect("hash"),
        canonicalize_and_hash(&right).expect("hash")
    );
}

#[test]
fn hash_matches_compact_sorted_json() {
    use sha2::{Digest, Sha256};

    let body = json!({"b": [true, "x"], "a": 1.5});
    let expected = hex::encode(Sha256::digest(br#"{"a":1.5,"b":[true,"x"]}"#));

    assert_eq!(canonicalize_and_hash(&body).expect("hash").to_hex(), expected);
}

#[rstest]
#[case(None, 24)]
#[case(Some(0), 1)]
#[case(Some(12), 12)]
#[case(Some(u64::MAX), 24 * 365 * 10)]
fn ttl_hours_are_clamped(#[case] hours: Option<u64>, #[case] expected: u64) {
    assert_eq!(
        IdempotencyConfig::from_hours(hours).ttl(),
        Duration::from_secs(expected * 3600)
    );
}

#[test]
fn a_key_lapses_exactly_at_the_ttl() {
    let config = IdempotencyConfig::with_ttl(Duration::from_secs(60));

    assert!(!config.has_lapsed(Duration::from_secs(59)));
    assert!(config.has_lapsed(Duration::from_secs(60)));
}
