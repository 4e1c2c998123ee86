// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::data::{ApiKey, SshKey, UsernameToken};
use crate::test_support::fixtures;
use serde_json::json;

#[test]
fn new_identity_status_follows_readiness() {
    let token = Identity::new("hub", IdentityData::DockerhubToken(UsernameToken::default()));
    assert_eq!(token.status, IdentityStatus::Ready);

    let oauth = Identity::new("auth", IdentityData::GenericOAuth2(fixtures::oauth2_identity()));
    assert_eq!(oauth.status, IdentityStatus::Pending);
    assert!(!oauth.is_ready());
}

#[test]
fn deserializes_tagged_payload() {
    let identity: Identity = serde_json::from_value(json!({
        "id": "idt-1",
        "name": "registry",
        "connector": "github",
        "type": "token",
        "data": {"username": "octocat", "token": "ghp_x"}
    }))
    .unwrap();

    assert_eq!(identity.id, "idt-1");
    assert_eq!(identity.status, IdentityStatus::Ready);
    assert_eq!(identity.identity_type().to_string(), "github/token");
}

#[test]
fn unknown_type_fails_to_deserialize() {
    let result = serde_json::from_value::<Identity>(json!({
        "name": "x",
        "connector": "generic",
        "type": "kerberos",
        "data": {}
    }));
    let err = result.unwrap_err().to_string();
    assert!(err.contains("unknown identity type generic/kerberos"), "{err}");
}

#[test]
fn serializes_connector_type_and_data() {
    let mut identity = Identity::new("key", IdentityData::GenericApiKey(ApiKey { key: "abc".into() }));
    identity.id = "idt-2".into();
    let value = serde_json::to_value(&identity).unwrap();

    assert_eq!(value["connector"], "generic");
    assert_eq!(value["type"], "api_key");
    assert_eq!(value["status"], "ready");
    assert_eq!(value["data"], json!({"key": "abc"}));
    assert!(value.get("refresh_time").is_none());

    let back: Identity = serde_json::from_value(value).unwrap();
    assert_eq!(back, identity);
}

#[test]
fn validate_normalizes_payload() {
    let mut identity = Identity::new(
        "deploy-key",
        IdentityData::GenericSshKey(SshKey { private_key: "key".into(), ..Default::default() }),
    );
    identity.validate().unwrap();

    let IdentityData::GenericSshKey(key) = &identity.data else { panic!("kind changed") };
    assert_eq!(key.private_key, "key\n");
}

#[test]
fn validate_reports_name_and_data_errors() {
    let mut identity = Identity::new("Bad Name", IdentityData::GenericApiKey(ApiKey::default()));
    let errors = identity.validate().unwrap_err();
    assert_eq!(errors.pointers(), vec!["/name", "/data/key"]);
}

#[test]
fn mark_error_and_ready() {
    let mut identity = Identity::new("auth", IdentityData::GenericOAuth2(fixtures::oauth2_identity()));
    identity.mark_error("invalid_grant");
    assert_eq!(identity.status, IdentityStatus::Error);
    assert_eq!(identity.error_message.as_deref(), Some("invalid_grant"));

    identity.mark_ready();
    assert!(identity.is_ready());
    assert!(identity.error_message.is_none());
}
