// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use evl_identity::{GenericPassword, IdentityData};

#[test]
fn describe_masks_secrets() {
    let identity = Identity::new(
        "login",
        IdentityData::GenericPassword(GenericPassword { login: "alice".into(), password: "hunter2".into() }),
    );
    let text = describe(&identity);
    let mask = evl_identity::SECRET_MASK;
    assert_eq!(text, format!("login (generic/password): ready\n  Login: alice\n  Password: {mask}\n"));
    assert!(!text.contains("hunter2"));
}

#[test]
fn loads_identity_array() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("identities.json");
    std::fs::write(
        &path,
        r#"[
            {"name": "hub", "connector": "dockerhub", "type": "token", "data": {"username": "u", "token": "t"}},
            {"name": "key", "connector": "generic", "type": "api_key", "data": {"key": "k"}}
        ]"#,
    )
    .unwrap();

    let identities = load_identities(&path).unwrap();
    let names: Vec<&str> = identities.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["hub", "key"]);
}

#[test]
fn unknown_identity_type_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("identities.json");
    std::fs::write(&path, r#"[{"name": "x", "connector": "generic", "type": "kerberos", "data": {}}]"#).unwrap();
    let err = load_identities(&path).unwrap_err();
    assert!(format!("{err:#}").contains("unknown identity type generic/kerberos"), "{err:#}");
}
