// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential resolution specs

use evl_identity::{registry_auth_key, transport_auth, Identity, IdentityData, ResolveError, SshKey, UsernameToken};

#[test]
fn registry_key_joins_username_and_token() {
    let identity = Identity::new(
        "hub",
        IdentityData::DockerhubToken(UsernameToken { username: "u".into(), token: "t".into() }),
    );
    assert_eq!(registry_auth_key(&identity).unwrap(), "u:t");
}

#[test]
fn ssh_key_cannot_authenticate_a_registry() {
    let identity = Identity::new("deploy", IdentityData::GenericSshKey(SshKey::default()));
    let err = registry_auth_key(&identity).unwrap_err();
    assert!(matches!(err, ResolveError::Unsupported { .. }), "{err}");
}

#[test]
fn token_cannot_authenticate_a_transport() {
    let identity = Identity::new(
        "gh",
        IdentityData::GithubToken(UsernameToken { username: "octocat".into(), token: "ghp".into() }),
    );
    assert!(transport_auth(&identity).is_err());
}
