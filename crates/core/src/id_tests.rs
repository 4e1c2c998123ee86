// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn new_ids_carry_prefix_and_fit_inline() {
    let id = JobExecutionId::new();
    assert!(id.as_str().starts_with("jex-"));
    assert_eq!(id.as_str().len(), 23);
    assert!(!id.0.is_heap_allocated());
}

#[test]
fn new_ids_are_unique() {
    assert_ne!(IdentityId::new(), IdentityId::new());
}

#[test]
fn external_ids_are_kept_verbatim() {
    let id = JobExecutionId::from("E1");
    assert_eq!(id.to_string(), "E1");
    assert_eq!(id.suffix(), "E1");
    assert_eq!(id, "E1");
}

#[test]
fn serde_is_transparent() {
    let id = IdentityId::from("idt-abc");
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"idt-abc\"");
    let parsed: IdentityId = serde_json::from_str("\"idt-abc\"").unwrap();
    assert_eq!(parsed, id);
}

#[parameterized(
    shorter = { "abc", 5, "abc" },
    exact = { "abcde", 5, "abcde" },
    truncated = { "abcdefgh", 3, "abc" },
    multibyte = { "héllo", 2, "hé" },
)]
fn short_truncates(input: &str, n: usize, expected: &str) {
    assert_eq!(short(input, n), expected);
}

#[test]
fn id_short_uses_suffix() {
    let id = JobExecutionId::from("jex-0123456789");
    assert_eq!(id.short(4), "0123");
}
