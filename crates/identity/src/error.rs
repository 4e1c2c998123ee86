// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for identities, credential resolution and OAuth2

use crate::kind::IdentityType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("unknown identity type {connector}/{kind}")]
    UnknownKind { connector: String, kind: String },

    #[error("invalid {identity_type} identity data: {source}")]
    Decode {
        identity_type: IdentityType,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot encode identity data: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] evl_core::ValidationErrors),
}

/// Failure to turn an identity into a backend credential.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("identity {identity:?} of type {identity_type} cannot be used for {purpose}")]
    Unsupported {
        identity: String,
        identity_type: IdentityType,
        purpose: &'static str,
    },

    #[error("cannot parse private key of identity {identity:?}: {reason}")]
    InvalidPrivateKey { identity: String, reason: String },
}

#[derive(Debug, Error)]
pub enum OAuth2Error {
    #[error("identity {0:?} is not an oauth2 identity")]
    NotOAuth2(String),

    #[error("missing refresh token")]
    MissingRefreshToken,

    #[error("missing {0} endpoint and discovery is disabled")]
    MissingEndpoint(&'static str),

    #[error("invalid {field} uri {value:?}: {source}")]
    InvalidUri {
        field: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("oauth2 endpoint returned {status}: {error}{}", .description.as_deref().map(|d| format!(" ({d})")).unwrap_or_default())]
    Endpoint {
        status: u16,
        error: String,
        description: Option<String>,
    },

    #[error("invalid token response: {0}")]
    InvalidResponse(String),
}
