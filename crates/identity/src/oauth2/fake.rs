// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake OAuth2 client for testing

use super::client::{parse_uri, Endpoints, OAuth2Client, TokenGrant, TokenResponse};
use crate::data::OAuth2Identity;
use crate::error::OAuth2Error;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Default)]
struct FakeState {
    responses: VecDeque<Result<TokenResponse, String>>,
    grants: Vec<TokenGrant>,
}

/// Serves queued token responses and records every grant.
///
/// Endpoints come from the identity, defaulting to `<issuer>/authorize` and
/// `<issuer>/token`.
#[derive(Clone, Default)]
pub struct FakeOAuth2Client {
    state: Arc<Mutex<FakeState>>,
}

impl FakeOAuth2Client {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_token(&self, access_token: &str, refresh_token: Option<&str>, expires_in: Option<u64>) {
        self.state.lock().responses.push_back(Ok(TokenResponse {
            access_token: access_token.to_string(),
            token_type: Some("bearer".to_string()),
            expires_in,
            refresh_token: refresh_token.map(str::to_string),
        }));
    }

    /// Queue an OAuth2 error response (`invalid_grant`, ...).
    pub fn push_error(&self, error: &str) {
        self.state.lock().responses.push_back(Err(error.to_string()));
    }

    pub fn grants(&self) -> Vec<TokenGrant> {
        self.state.lock().grants.clone()
    }
}

#[async_trait]
impl OAuth2Client for FakeOAuth2Client {
    async fn endpoints(&self, identity: &OAuth2Identity) -> Result<Endpoints, OAuth2Error> {
        let issuer = identity.issuer.trim_end_matches('/');
        let authorization =
            identity.authorization_endpoint.clone().unwrap_or_else(|| format!("{issuer}/authorize"));
        let token = identity.token_endpoint.clone().unwrap_or_else(|| format!("{issuer}/token"));
        Ok(Endpoints {
            authorization: parse_uri("authorization_endpoint", &authorization)?,
            token: parse_uri("token_endpoint", &token)?,
        })
    }

    async fn request_token(&self, _identity: &OAuth2Identity, grant: &TokenGrant) -> Result<TokenResponse, OAuth2Error> {
        let mut state = self.state.lock();
        state.grants.push(grant.clone());
        match state.responses.pop_front() {
            Some(Ok(token)) => Ok(token),
            Some(Err(error)) => Err(OAuth2Error::Endpoint { status: 400, error, description: None }),
            None => Err(OAuth2Error::Endpoint {
                status: 500,
                error: "no token response queued".to_string(),
                description: None,
            }),
        }
    }
}
