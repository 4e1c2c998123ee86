// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Providers and credential kinds

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Provider an identity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connector {
    Generic,
    Dockerhub,
    Github,
    Postgresql,
    Eventline,
}

evl_core::simple_display! {
    Connector {
        Generic => "generic",
        Dockerhub => "dockerhub",
        Github => "github",
        Postgresql => "postgresql",
        Eventline => "eventline",
    }
}

impl FromStr for Connector {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generic" => Ok(Self::Generic),
            "dockerhub" => Ok(Self::Dockerhub),
            "github" => Ok(Self::Github),
            "postgresql" => Ok(Self::Postgresql),
            "eventline" => Ok(Self::Eventline),
            _ => Err(()),
        }
    }
}

/// Shape of a credential, independent of the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    Password,
    Token,
    ApiKey,
    SshKey,
    GpgKey,
    #[serde(rename = "oauth2")]
    OAuth2,
}

evl_core::simple_display! {
    IdentityKind {
        Password => "password",
        Token => "token",
        ApiKey => "api_key",
        SshKey => "ssh_key",
        GpgKey => "gpg_key",
        OAuth2 => "oauth2",
    }
}

impl FromStr for IdentityKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "password" => Ok(Self::Password),
            "token" => Ok(Self::Token),
            "api_key" => Ok(Self::ApiKey),
            "ssh_key" => Ok(Self::SshKey),
            "gpg_key" => Ok(Self::GpgKey),
            "oauth2" => Ok(Self::OAuth2),
            _ => Err(()),
        }
    }
}

/// `(connector, kind)` pair, displayed as `connector/kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityType {
    pub connector: Connector,
    pub kind: IdentityKind,
}

impl fmt::Display for IdentityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.connector, self.kind)
    }
}
