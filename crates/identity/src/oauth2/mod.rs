// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OAuth2 token lifecycle for generic OAuth2 identities.
//!
//! Authorize builds the URI the user is sent to; Exchange trades the
//! returned code for tokens; Refresh renews them. Token state is only
//! written after a successful response, so a failed call leaves the
//! identity unchanged.

mod client;
#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use client::{Endpoints, HttpOAuth2Client, OAuth2Client, TokenGrant, TokenResponse, DISCOVERY_PATH};
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeOAuth2Client;

use crate::data::{GithubOAuth2Identity, IdentityData, OAuth2Identity};
use crate::error::OAuth2Error;
use crate::identity::Identity;
use chrono::{DateTime, Duration, Utc};
use evl_core::Clock;
use url::Url;

pub const GITHUB_ISSUER: &str = "https://github.com/login/oauth";
pub const GITHUB_AUTHORIZATION_ENDPOINT: &str = "https://github.com/login/oauth/authorize";
pub const GITHUB_TOKEN_ENDPOINT: &str = "https://github.com/login/oauth/access_token";

/// Client registration used to authorize a GitHub OAuth App.
pub fn github_registration(identity: &GithubOAuth2Identity) -> OAuth2Identity {
    OAuth2Identity {
        issuer: GITHUB_ISSUER.to_string(),
        authorization_endpoint: Some(GITHUB_AUTHORIZATION_ENDPOINT.to_string()),
        token_endpoint: Some(GITHUB_TOKEN_ENDPOINT.to_string()),
        client_id: identity.client_id.clone(),
        client_secret: identity.client_secret.clone(),
        scopes: identity.scopes.clone(),
        ..OAuth2Identity::default()
    }
}

/// Next refresh: halfway through the token lifetime, rounded up to the second.
///
/// `None` when the result does not fit in a timestamp.
pub fn refresh_time(ttl: u64, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    offset(now, ttl.div_ceil(2))
}

fn offset(now: DateTime<Utc>, seconds: u64) -> Option<DateTime<Utc>> {
    let seconds = i64::try_from(seconds).ok()?;
    now.checked_add_signed(Duration::try_seconds(seconds)?)
}

/// Authorization request URI for the authorization-code flow.
pub fn authorization_url(endpoint: &Url, identity: &OAuth2Identity, state: &str, redirect_uri: &str) -> Url {
    let mut url = endpoint.clone();
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("response_type", "code");
        query.append_pair("client_id", &identity.client_id);
        query.append_pair("redirect_uri", redirect_uri);
        if !identity.scopes.is_empty() {
            query.append_pair("scope", &identity.scopes.join(" "));
        }
        query.append_pair("state", state);
    }
    url
}

/// Apply a token response issued at `now` and return the next refresh time.
///
/// A response without a refresh token keeps the current one: servers
/// commonly omit it on refresh when the old token stays valid. A lifetime
/// that cannot be scheduled is rejected before anything is written.
fn apply_token(
    identity: &mut OAuth2Identity,
    token: TokenResponse,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, OAuth2Error> {
    let ttl = token.expires_in.unwrap_or(0);
    let out_of_range = || OAuth2Error::InvalidResponse("token lifetime out of range".to_string());
    let expiration_time = offset(now, ttl).ok_or_else(out_of_range)?;
    let next = refresh_time(ttl, now).ok_or_else(out_of_range)?;

    identity.access_token = token.access_token;
    if let Some(refresh_token) = token.refresh_token.filter(|t| !t.is_empty()) {
        identity.refresh_token = refresh_token;
    }
    identity.ttl = ttl;
    identity.expiration_time = Some(expiration_time);
    Ok(next)
}

/// Drives authorize, exchange and refresh against an [`OAuth2Client`].
#[derive(Clone)]
pub struct TokenLifecycle<O, C> {
    client: O,
    clock: C,
}

impl<O: OAuth2Client, C: Clock> TokenLifecycle<O, C> {
    pub fn new(client: O, clock: C) -> Self {
        Self { client, clock }
    }

    pub fn client(&self) -> &O {
        &self.client
    }

    /// URI to redirect the user to. Does not touch token state.
    pub async fn authorize(&self, identity: &OAuth2Identity, state: &str, redirect_uri: &str) -> Result<Url, OAuth2Error> {
        let endpoints = self.client.endpoints(identity).await?;
        Ok(authorization_url(&endpoints.authorization, identity, state, redirect_uri))
    }

    /// Trade an authorization code for tokens. Returns the next refresh time.
    pub async fn exchange(
        &self,
        identity: &mut OAuth2Identity,
        code: &str,
        redirect_uri: &str,
    ) -> Result<DateTime<Utc>, OAuth2Error> {
        let grant = TokenGrant::AuthorizationCode { code: code.to_string(), redirect_uri: redirect_uri.to_string() };
        let token = self.client.request_token(identity, &grant).await?;
        apply_token(identity, token, self.clock.utc_now())
    }

    /// Renew tokens with the stored refresh token. Returns the next refresh time.
    pub async fn refresh(&self, identity: &mut OAuth2Identity) -> Result<DateTime<Utc>, OAuth2Error> {
        if identity.refresh_token.is_empty() {
            return Err(OAuth2Error::MissingRefreshToken);
        }
        let grant = TokenGrant::RefreshToken { refresh_token: identity.refresh_token.clone() };
        let token = self.client.request_token(identity, &grant).await?;
        apply_token(identity, token, self.clock.utc_now())
    }

    /// Complete the authorization of a stored identity: exchange the code,
    /// mark the identity ready and schedule its first refresh.
    ///
    /// GitHub tokens are not refreshed; a lifetime of 0 means the token
    /// does not expire.
    pub async fn complete_authorization(
        &self,
        identity: &mut Identity,
        code: &str,
        redirect_uri: &str,
    ) -> Result<(), OAuth2Error> {
        let next = match &mut identity.data {
            IdentityData::GenericOAuth2(oauth) => Some(self.exchange(oauth, code, redirect_uri).await?),
            IdentityData::GithubOAuth2(github) => {
                let mut registration = github_registration(github);
                self.exchange(&mut registration, code, redirect_uri).await?;
                github.access_token = registration.access_token;
                github.ttl = registration.ttl;
                github.expiration_time = registration.expiration_time.filter(|_| registration.ttl > 0);
                None
            }
            _ => return Err(OAuth2Error::NotOAuth2(identity.name.clone())),
        };
        identity.refresh_time = next;
        identity.mark_ready();
        tracing::info!(identity_id = %identity.id, refresh_time = ?next, "identity authorized");
        Ok(())
    }

    /// Refresh a stored identity and reschedule it.
    pub async fn refresh_identity(&self, identity: &mut Identity) -> Result<(), OAuth2Error> {
        let name = identity.name.clone();
        let oauth = identity.data.oauth2_mut().ok_or(OAuth2Error::NotOAuth2(name))?;
        let next = self.refresh(oauth).await?;
        identity.refresh_time = Some(next);
        tracing::info!(identity_id = %identity.id, refresh_time = %next, "identity refreshed");
        Ok(())
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
