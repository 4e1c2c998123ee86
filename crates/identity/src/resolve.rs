// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential resolution: turn an identity into what a backend consumes

use crate::data::IdentityData;
use crate::error::ResolveError;
use crate::identity::Identity;
use russh_keys::key::KeyPair;
use std::fmt;
use std::sync::Arc;

/// Authentication material for a remote shell.
#[derive(Clone)]
pub enum TransportAuth {
    Password(String),
    PrivateKey(Arc<KeyPair>),
}

impl fmt::Debug for TransportAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password(_) => f.write_str("Password(..)"),
            Self::PrivateKey(key) => write!(f, "PrivateKey({})", key.name()),
        }
    }
}

/// `user:secret` string for container registries.
///
/// Only dockerhub password and token identities and github token identities
/// can authenticate against a registry.
pub fn registry_auth_key(identity: &Identity) -> Result<String, ResolveError> {
    match &identity.data {
        IdentityData::DockerhubPassword(p) => Ok(format!("{}:{}", p.username, p.password)),
        IdentityData::DockerhubToken(t) | IdentityData::GithubToken(t) => Ok(format!("{}:{}", t.username, t.token)),
        IdentityData::GenericPassword(_)
        | IdentityData::GenericApiKey(_)
        | IdentityData::GenericSshKey(_)
        | IdentityData::GenericGpgKey(_)
        | IdentityData::GenericOAuth2(_)
        | IdentityData::GithubOAuth2(_)
        | IdentityData::PostgresqlPassword(_)
        | IdentityData::EventlineApiKey(_) => Err(unsupported(identity, "container registry authentication")),
    }
}

/// Password or parsed private key for a remote shell.
pub fn transport_auth(identity: &Identity) -> Result<TransportAuth, ResolveError> {
    match &identity.data {
        IdentityData::GenericPassword(p) => Ok(TransportAuth::Password(p.password.clone())),
        IdentityData::GenericSshKey(k) => russh_keys::decode_secret_key(&k.private_key, None)
            .map(|key| TransportAuth::PrivateKey(Arc::new(key)))
            .map_err(|e| ResolveError::InvalidPrivateKey { identity: identity.name.clone(), reason: e.to_string() }),
        IdentityData::GenericApiKey(_)
        | IdentityData::GenericGpgKey(_)
        | IdentityData::GenericOAuth2(_)
        | IdentityData::DockerhubPassword(_)
        | IdentityData::DockerhubToken(_)
        | IdentityData::GithubToken(_)
        | IdentityData::GithubOAuth2(_)
        | IdentityData::PostgresqlPassword(_)
        | IdentityData::EventlineApiKey(_) => Err(unsupported(identity, "ssh authentication")),
    }
}

fn unsupported(identity: &Identity, purpose: &'static str) -> ResolveError {
    ResolveError::Unsupported { identity: identity.name.clone(), identity_type: identity.identity_type(), purpose }
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod tests;
