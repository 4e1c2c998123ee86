// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OAuth2 HTTP client: endpoint discovery and token requests

use crate::data::OAuth2Identity;
use crate::error::OAuth2Error;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Path appended to the issuer when no discovery endpoint is configured.
pub const DISCOVERY_PATH: &str = "/.well-known/oauth-authorization-server";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub authorization: Url,
    pub token: Url,
}

/// Grant sent to the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenGrant {
    AuthorizationCode { code: String, redirect_uri: String },
    RefreshToken { refresh_token: String },
}

impl TokenGrant {
    pub fn grant_type(&self) -> &'static str {
        match self {
            Self::AuthorizationCode { .. } => "authorization_code",
            Self::RefreshToken { .. } => "refresh_token",
        }
    }

    fn form(&self) -> Vec<(&'static str, &str)> {
        let mut form = vec![("grant_type", self.grant_type())];
        match self {
            Self::AuthorizationCode { code, redirect_uri } => {
                form.push(("code", code.as_str()));
                form.push(("redirect_uri", redirect_uri.as_str()));
            }
            Self::RefreshToken { refresh_token } => form.push(("refresh_token", refresh_token.as_str())),
        }
        form
    }
}

/// Successful token endpoint response (RFC 6749 section 5.1).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServerMetadata {
    authorization_endpoint: Option<String>,
    token_endpoint: Option<String>,
}

/// Talks to an authorization server on behalf of an OAuth2 identity.
#[async_trait]
pub trait OAuth2Client: Send + Sync {
    async fn endpoints(&self, identity: &OAuth2Identity) -> Result<Endpoints, OAuth2Error>;

    async fn request_token(&self, identity: &OAuth2Identity, grant: &TokenGrant) -> Result<TokenResponse, OAuth2Error>;
}

/// [`OAuth2Client`] over HTTP with client credentials sent as basic auth.
#[derive(Debug, Clone)]
pub struct HttpOAuth2Client {
    http: reqwest::Client,
}

impl HttpOAuth2Client {
    pub fn new(timeout: Duration) -> Result<Self, OAuth2Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn discover(&self, identity: &OAuth2Identity) -> Result<ServerMetadata, OAuth2Error> {
        let endpoint = match identity.discovery_endpoint.as_deref().filter(|s| !s.is_empty()) {
            Some(endpoint) => endpoint.to_string(),
            None => format!("{}{DISCOVERY_PATH}", identity.issuer.trim_end_matches('/')),
        };
        let url = parse_uri("discovery", &endpoint)?;
        tracing::debug!(%url, "fetching authorization server metadata");

        let response = self.http.get(url).send().await?.error_for_status()?;
        let metadata = response.json::<ServerMetadata>().await?;
        Ok(metadata)
    }
}

#[async_trait]
impl OAuth2Client for HttpOAuth2Client {
    async fn endpoints(&self, identity: &OAuth2Identity) -> Result<Endpoints, OAuth2Error> {
        let configured = |value: &Option<String>| value.clone().filter(|s| !s.is_empty());
        let mut authorization = configured(&identity.authorization_endpoint);
        let mut token = configured(&identity.token_endpoint);

        if (authorization.is_none() || token.is_none()) && identity.discovery {
            let metadata = self.discover(identity).await?;
            authorization = authorization.or(metadata.authorization_endpoint);
            token = token.or(metadata.token_endpoint);
        }

        let authorization = authorization.ok_or(OAuth2Error::MissingEndpoint("authorization"))?;
        let token = token.ok_or(OAuth2Error::MissingEndpoint("token"))?;
        Ok(Endpoints {
            authorization: parse_uri("authorization_endpoint", &authorization)?,
            token: parse_uri("token_endpoint", &token)?,
        })
    }

    async fn request_token(&self, identity: &OAuth2Identity, grant: &TokenGrant) -> Result<TokenResponse, OAuth2Error> {
        let endpoints = self.endpoints(identity).await?;
        tracing::debug!(url = %endpoints.token, grant_type = grant.grant_type(), "requesting token");

        let response = self
            .http
            .post(endpoints.token)
            .basic_auth(&identity.client_id, Some(&identity.client_secret))
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&grant.form())
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(match serde_json::from_slice::<ErrorResponse>(&body) {
                Ok(e) => OAuth2Error::Endpoint {
                    status: status.as_u16(),
                    error: e.error,
                    description: e.error_description,
                },
                Err(_) => OAuth2Error::Endpoint {
                    status: status.as_u16(),
                    error: String::from_utf8_lossy(&body).into_owned(),
                    description: None,
                },
            });
        }

        let token: TokenResponse =
            serde_json::from_slice(&body).map_err(|e| OAuth2Error::InvalidResponse(e.to_string()))?;
        if token.access_token.is_empty() {
            return Err(OAuth2Error::InvalidResponse("empty access token".to_string()));
        }
        Ok(token)
    }
}

pub(crate) fn parse_uri(field: &'static str, value: &str) -> Result<Url, OAuth2Error> {
    Url::parse(value).map_err(|source| OAuth2Error::InvalidUri { field, value: value.to_string(), source })
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
