// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stored identity records

use crate::data::IdentityData;
use crate::error::IdentityError;
use crate::kind::IdentityType;
use chrono::{DateTime, Utc};
use evl_core::{IdentityId, ValidationErrors, Validator};
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStatus {
    /// Waiting for an external step (e.g. OAuth2 authorization).
    Pending,
    Ready,
    Error,
}

evl_core::simple_display! {
    IdentityStatus {
        Pending => "pending",
        Ready => "ready",
        Error => "error",
    }
}

/// A named credential.
///
/// Serialized as `{id, name, status, connector, type, data, ...}` where
/// `data` is the payload for the `(connector, type)` pair.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawIdentity")]
pub struct Identity {
    pub id: IdentityId,
    pub name: String,
    pub status: IdentityStatus,
    pub error_message: Option<String>,
    /// Next time a refreshable identity must be renewed.
    pub refresh_time: Option<DateTime<Utc>>,
    pub data: IdentityData,
}

impl Identity {
    /// New identity, pending when its kind has deferred readiness.
    pub fn new(name: impl Into<String>, data: IdentityData) -> Self {
        let status = if data.deferred_readiness() { IdentityStatus::Pending } else { IdentityStatus::Ready };
        Self { id: IdentityId::new(), name: name.into(), status, error_message: None, refresh_time: None, data }
    }

    pub fn identity_type(&self) -> IdentityType {
        self.data.identity_type()
    }

    pub fn is_ready(&self) -> bool {
        self.status == IdentityStatus::Ready
    }

    pub fn refreshable(&self) -> bool {
        self.data.refreshable()
    }

    /// Check the name and payload; on success the payload is replaced by its
    /// normalized form.
    pub fn validate(&mut self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.check_name("name", &self.name);
        let data = match self.data.validate_with_prefix("/data") {
            Ok(data) => Some(data),
            Err(errors) => {
                v.extend(errors);
                None
            }
        };
        v.finish()?;
        if let Some(data) = data {
            self.data = data;
        }
        Ok(())
    }

    pub fn mark_ready(&mut self) {
        self.status = IdentityStatus::Ready;
        self.error_message = None;
    }

    pub fn mark_error(&mut self, message: impl Into<String>) {
        self.status = IdentityStatus::Error;
        self.error_message = Some(message.into());
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RawIdentity {
    #[serde(default)]
    id: IdentityId,
    name: String,
    #[serde(default)]
    status: Option<IdentityStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_time: Option<DateTime<Utc>>,
    connector: String,
    #[serde(rename = "type")]
    kind: String,
    data: serde_json::Value,
}

impl TryFrom<RawIdentity> for Identity {
    type Error = IdentityError;

    fn try_from(raw: RawIdentity) -> Result<Self, Self::Error> {
        let data = IdentityData::decode(&raw.connector, &raw.kind, raw.data)?;
        let status = raw.status.unwrap_or(if data.deferred_readiness() {
            IdentityStatus::Pending
        } else {
            IdentityStatus::Ready
        });
        Ok(Self {
            id: raw.id,
            name: raw.name,
            status,
            error_message: raw.error_message,
            refresh_time: raw.refresh_time,
            data,
        })
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let identity_type = self.identity_type();
        let raw = RawIdentity {
            id: self.id.clone(),
            name: self.name.clone(),
            status: Some(self.status),
            error_message: self.error_message.clone(),
            refresh_time: self.refresh_time,
            connector: identity_type.connector.to_string(),
            kind: identity_type.kind.to_string(),
            data: self.data.encode().map_err(serde::ser::Error::custom)?,
        };
        raw.serialize(serializer)
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
