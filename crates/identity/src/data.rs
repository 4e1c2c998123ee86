// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identity payloads.
//!
//! [`IdentityData`] is a closed sum over every supported `(connector, kind)`
//! pair. Each operation matches exhaustively, so adding a kind forces every
//! consumer (validation, schema, resolution) to handle it.

use crate::error::IdentityError;
use crate::kind::{Connector, IdentityKind, IdentityType};
use crate::schema::{FieldEntry, FieldType, FieldValue, Schema};
use chrono::{DateTime, Utc};
use evl_core::{ValidationErrors, Validator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenericPassword {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApiKey {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SshKey {
    pub private_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub public_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub certificate: String,
}

impl SshKey {
    /// Copy where every present key or certificate ends with a newline.
    ///
    /// Some SSH implementations reject key material without one.
    pub fn normalized(&self) -> Self {
        Self {
            private_key: with_trailing_newline(&self.private_key),
            public_key: with_trailing_newline(&self.public_key),
            certificate: with_trailing_newline(&self.certificate),
        }
    }
}

fn with_trailing_newline(s: &str) -> String {
    if s.is_empty() || s.ends_with('\n') {
        s.to_string()
    } else {
        format!("{s}\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GpgKey {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub private_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub public_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UsernamePassword {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UsernameToken {
    pub username: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostgresqlPassword {
    pub user: String,
    pub password: String,
}

/// Generic OAuth2 client registration plus the token state it produced.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OAuth2Identity {
    pub issuer: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub discovery: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,
    /// Lifetime in seconds of the current access token.
    #[serde(default)]
    pub ttl: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<DateTime<Utc>>,
}

/// GitHub OAuth App registration and the access token it produced.
///
/// GitHub endpoints are fixed and its tokens are not refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GithubOAuth2Identity {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access_token: String,
    #[serde(default)]
    pub ttl: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityData {
    GenericPassword(GenericPassword),
    GenericApiKey(ApiKey),
    GenericSshKey(SshKey),
    GenericGpgKey(GpgKey),
    GenericOAuth2(OAuth2Identity),
    DockerhubPassword(UsernamePassword),
    DockerhubToken(UsernameToken),
    GithubToken(UsernameToken),
    GithubOAuth2(GithubOAuth2Identity),
    PostgresqlPassword(PostgresqlPassword),
    EventlineApiKey(ApiKey),
}

impl IdentityData {
    pub fn identity_type(&self) -> IdentityType {
        let (connector, kind) = match self {
            Self::GenericPassword(_) => (Connector::Generic, IdentityKind::Password),
            Self::GenericApiKey(_) => (Connector::Generic, IdentityKind::ApiKey),
            Self::GenericSshKey(_) => (Connector::Generic, IdentityKind::SshKey),
            Self::GenericGpgKey(_) => (Connector::Generic, IdentityKind::GpgKey),
            Self::GenericOAuth2(_) => (Connector::Generic, IdentityKind::OAuth2),
            Self::DockerhubPassword(_) => (Connector::Dockerhub, IdentityKind::Password),
            Self::DockerhubToken(_) => (Connector::Dockerhub, IdentityKind::Token),
            Self::GithubToken(_) => (Connector::Github, IdentityKind::Token),
            Self::GithubOAuth2(_) => (Connector::Github, IdentityKind::OAuth2),
            Self::PostgresqlPassword(_) => (Connector::Postgresql, IdentityKind::Password),
            Self::EventlineApiKey(_) => (Connector::Eventline, IdentityKind::ApiKey),
        };
        IdentityType { connector, kind }
    }

    /// Decode a payload stored under `connector` and `kind`.
    pub fn decode(connector: &str, kind: &str, data: serde_json::Value) -> Result<Self, IdentityError> {
        let unknown = || IdentityError::UnknownKind { connector: connector.to_string(), kind: kind.to_string() };
        let c: Connector = connector.parse().map_err(|_| unknown())?;
        let k: IdentityKind = kind.parse().map_err(|_| unknown())?;

        let decoded = match (c, k) {
            (Connector::Generic, IdentityKind::Password) => serde_json::from_value(data).map(Self::GenericPassword),
            (Connector::Generic, IdentityKind::ApiKey) => serde_json::from_value(data).map(Self::GenericApiKey),
            (Connector::Generic, IdentityKind::SshKey) => serde_json::from_value(data).map(Self::GenericSshKey),
            (Connector::Generic, IdentityKind::GpgKey) => serde_json::from_value(data).map(Self::GenericGpgKey),
            (Connector::Generic, IdentityKind::OAuth2) => serde_json::from_value(data).map(Self::GenericOAuth2),
            (Connector::Dockerhub, IdentityKind::Password) => {
                serde_json::from_value(data).map(Self::DockerhubPassword)
            }
            (Connector::Dockerhub, IdentityKind::Token) => serde_json::from_value(data).map(Self::DockerhubToken),
            (Connector::Github, IdentityKind::Token) => serde_json::from_value(data).map(Self::GithubToken),
            (Connector::Github, IdentityKind::OAuth2) => serde_json::from_value(data).map(Self::GithubOAuth2),
            (Connector::Postgresql, IdentityKind::Password) => {
                serde_json::from_value(data).map(Self::PostgresqlPassword)
            }
            (Connector::Eventline, IdentityKind::ApiKey) => serde_json::from_value(data).map(Self::EventlineApiKey),
            _ => return Err(unknown()),
        };
        decoded.map_err(|source| IdentityError::Decode { identity_type: IdentityType { connector: c, kind: k }, source })
    }

    /// JSON form of the payload, without the connector and kind.
    pub fn encode(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::GenericPassword(p) => serde_json::to_value(p),
            Self::GenericApiKey(p) | Self::EventlineApiKey(p) => serde_json::to_value(p),
            Self::GenericSshKey(p) => serde_json::to_value(p),
            Self::GenericGpgKey(p) => serde_json::to_value(p),
            Self::GenericOAuth2(p) => serde_json::to_value(p),
            Self::DockerhubPassword(p) => serde_json::to_value(p),
            Self::DockerhubToken(p) | Self::GithubToken(p) => serde_json::to_value(p),
            Self::GithubOAuth2(p) => serde_json::to_value(p),
            Self::PostgresqlPassword(p) => serde_json::to_value(p),
        }
    }

    /// Identities that only become usable after an external step, such as an
    /// OAuth2 authorization.
    pub fn deferred_readiness(&self) -> bool {
        matches!(self, Self::GenericOAuth2(_) | Self::GithubOAuth2(_))
    }

    /// Identities whose secret must be renewed periodically.
    pub fn refreshable(&self) -> bool {
        matches!(self, Self::GenericOAuth2(_))
    }

    pub fn oauth2(&self) -> Option<&OAuth2Identity> {
        match self {
            Self::GenericOAuth2(o) => Some(o),
            _ => None,
        }
    }

    pub fn oauth2_mut(&mut self) -> Option<&mut OAuth2Identity> {
        match self {
            Self::GenericOAuth2(o) => Some(o),
            _ => None,
        }
    }

    /// Environment variables exported to steps for this identity.
    ///
    /// No kind exports anything yet; identity fields reach steps as files.
    pub fn environment(&self) -> BTreeMap<String, String> {
        match self {
            Self::GenericPassword(_)
            | Self::GenericApiKey(_)
            | Self::GenericSshKey(_)
            | Self::GenericGpgKey(_)
            | Self::GenericOAuth2(_)
            | Self::DockerhubPassword(_)
            | Self::DockerhubToken(_)
            | Self::GithubToken(_)
            | Self::GithubOAuth2(_)
            | Self::PostgresqlPassword(_)
            | Self::EventlineApiKey(_) => BTreeMap::new(),
        }
    }

    /// Normalized copy of the payload. Idempotent.
    pub fn normalized(&self) -> Self {
        match self {
            Self::GenericSshKey(key) => Self::GenericSshKey(key.normalized()),
            other => other.clone(),
        }
    }

    /// Check every field and return the normalized payload.
    ///
    /// Field errors point at payload keys (`/private_key`), or under
    /// `prefix` when the payload is nested in a larger document.
    pub fn validate_with_prefix(&self, prefix: &str) -> Result<Self, ValidationErrors> {
        let mut v = Validator::with_prefix(prefix);
        match self {
            Self::GenericPassword(p) => {
                v.check_string_not_empty("password", &p.password);
            }
            Self::GenericApiKey(p) | Self::EventlineApiKey(p) => {
                v.check_string_not_empty("key", &p.key);
            }
            Self::GenericSshKey(p) => {
                v.check_string_not_empty("private_key", &p.private_key);
            }
            Self::GenericGpgKey(p) => {
                if p.private_key.is_empty() && p.public_key.is_empty() {
                    v.add("private_key", "missing_value", "private key or public key required");
                    v.add("public_key", "missing_value", "private key or public key required");
                }
            }
            Self::GenericOAuth2(p) => {
                v.check_uri("issuer", &p.issuer);
                v.check_optional_uri("discovery_endpoint", p.discovery_endpoint.as_deref());
                v.check_optional_uri("authorization_endpoint", p.authorization_endpoint.as_deref());
                v.check_optional_uri("token_endpoint", p.token_endpoint.as_deref());
                v.check_string_not_empty("client_id", &p.client_id);
                v.check_string_not_empty("client_secret", &p.client_secret);
                v.check_array_not_empty("scopes", &p.scopes);
            }
            Self::DockerhubPassword(p) => {
                v.check_string_not_empty("username", &p.username);
                v.check_string_not_empty("password", &p.password);
            }
            Self::DockerhubToken(p) | Self::GithubToken(p) => {
                v.check_string_not_empty("username", &p.username);
                v.check_string_not_empty("token", &p.token);
            }
            Self::GithubOAuth2(p) => {
                v.check_string_not_empty("client_id", &p.client_id);
                v.check_string_not_empty("client_secret", &p.client_secret);
                v.check_array_not_empty("scopes", &p.scopes);
            }
            Self::PostgresqlPassword(p) => {
                v.check_string_not_empty("user", &p.user);
                v.check_string_not_empty("password", &p.password);
            }
        }
        v.finish().map(|()| self.normalized())
    }

    pub fn validate(&self) -> Result<Self, ValidationErrors> {
        self.validate_with_prefix("")
    }

    /// Ordered description of every payload field.
    pub fn schema(&self) -> Schema {
        use FieldType as T;
        use FieldValue as V;

        let text = |s: &str| V::Text(s.to_string());
        let opt = |s: &Option<String>| V::Text(s.clone().unwrap_or_default());

        match self {
            Self::GenericPassword(p) => [
                FieldEntry::new("login", "Login", T::String, text(&p.login)).optional(),
                FieldEntry::new("password", "Password", T::String, text(&p.password)).secret(),
            ]
            .into_iter()
            .collect(),
            Self::GenericApiKey(p) | Self::EventlineApiKey(p) => {
                [FieldEntry::new("key", "API key", T::String, text(&p.key)).verbatim().secret()]
                    .into_iter()
                    .collect()
            }
            Self::GenericSshKey(p) => [
                FieldEntry::new("private_key", "Private key", T::TextBlock, text(&p.private_key))
                    .secret()
                    .verbatim(),
                FieldEntry::new("public_key", "Public key", T::TextBlock, text(&p.public_key))
                    .optional()
                    .verbatim(),
                FieldEntry::new("certificate", "Certificate", T::TextBlock, text(&p.certificate))
                    .optional()
                    .verbatim(),
            ]
            .into_iter()
            .collect(),
            Self::GenericGpgKey(p) => [
                FieldEntry::new("private_key", "Private key", T::TextBlock, text(&p.private_key))
                    .optional()
                    .secret()
                    .verbatim(),
                FieldEntry::new("public_key", "Public key", T::TextBlock, text(&p.public_key))
                    .optional()
                    .verbatim(),
                FieldEntry::new("password", "Password", T::String, text(&p.password)).optional().secret(),
            ]
            .into_iter()
            .collect(),
            Self::GenericOAuth2(p) => [
                FieldEntry::new("issuer", "Issuer", T::Uri, text(&p.issuer)),
                FieldEntry::new("discovery", "Discovery", T::Boolean, V::Bool(p.discovery)).optional(),
                FieldEntry::new("discovery_endpoint", "Discovery endpoint", T::Uri, opt(&p.discovery_endpoint))
                    .optional(),
                FieldEntry::new(
                    "authorization_endpoint",
                    "Authorization endpoint",
                    T::Uri,
                    opt(&p.authorization_endpoint),
                )
                .optional(),
                FieldEntry::new("token_endpoint", "Token endpoint", T::Uri, opt(&p.token_endpoint)).optional(),
                FieldEntry::new("client_id", "Client id", T::String, text(&p.client_id)).verbatim(),
                FieldEntry::new("client_secret", "Client secret", T::String, text(&p.client_secret))
                    .secret()
                    .verbatim(),
                FieldEntry::new("scopes", "Scopes", T::StringList, V::List(p.scopes.clone())),
                FieldEntry::new("access_token", "Access token", T::String, text(&p.access_token))
                    .optional()
                    .secret()
                    .verbatim()
                    .internal(),
                FieldEntry::new("refresh_token", "Refresh token", T::String, text(&p.refresh_token))
                    .optional()
                    .secret()
                    .verbatim()
                    .internal(),
                FieldEntry::new("ttl", "Token lifetime (seconds)", T::String, V::Number(p.ttl))
                    .optional()
                    .internal(),
                FieldEntry::new("expiration_time", "Expiration date", T::Date, V::Date(p.expiration_time))
                    .optional()
                    .internal(),
            ]
            .into_iter()
            .collect(),
            Self::DockerhubPassword(p) => [
                FieldEntry::new("username", "Username", T::String, text(&p.username)),
                FieldEntry::new("password", "Password", T::String, text(&p.password)).secret(),
            ]
            .into_iter()
            .collect(),
            Self::DockerhubToken(p) | Self::GithubToken(p) => [
                FieldEntry::new("username", "Username", T::String, text(&p.username)),
                FieldEntry::new("token", "Token", T::String, text(&p.token)).verbatim().secret(),
            ]
            .into_iter()
            .collect(),
            Self::GithubOAuth2(p) => [
                FieldEntry::new("username", "Username", T::String, text(&p.username)).optional(),
                FieldEntry::new("client_id", "Client id", T::String, text(&p.client_id)).verbatim(),
                FieldEntry::new("client_secret", "Client secret", T::String, text(&p.client_secret))
                    .secret()
                    .verbatim(),
                FieldEntry::new("scopes", "Scopes", T::StringList, V::List(p.scopes.clone())),
                FieldEntry::new("access_token", "Access token", T::String, text(&p.access_token))
                    .optional()
                    .secret()
                    .verbatim()
                    .internal(),
                FieldEntry::new("ttl", "Token lifetime (seconds)", T::String, V::Number(p.ttl))
                    .optional()
                    .internal(),
                FieldEntry::new("expiration_time", "Expiration date", T::Date, V::Date(p.expiration_time))
                    .optional()
                    .internal(),
            ]
            .into_iter()
            .collect(),
            Self::PostgresqlPassword(p) => [
                FieldEntry::new("user", "User", T::String, text(&p.user)),
                FieldEntry::new("password", "Password", T::String, text(&p.password)).secret(),
            ]
            .into_iter()
            .collect(),
        }
    }
}

#[cfg(test)]
#[path = "data_tests.rs"]
mod tests;
