// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::error::RunnerError;
use evl_core::{ValidationErrors, Validator};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_URI: &str = "unix:///var/run/docker.sock";

/// Server-side configuration of the docker runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerConfig {
    /// Engine endpoint, `unix://<socket>` or `tcp://<host>:<port>`.
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_certificate_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_path: Option<PathBuf>,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self { uri: DEFAULT_URI.to_string(), ca_certificate_path: None, certificate_path: None, private_key_path: None }
    }
}

impl DockerConfig {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::with_prefix("/docker");
        if v.check_string_not_empty("uri", &self.uri) {
            v.check(
                "uri",
                self.uri.starts_with("unix://") || self.uri.starts_with("tcp://"),
                "invalid_uri",
                "uri must use the unix or tcp scheme",
            );
        }
        v.finish()
    }
}

/// Per-job parameters of the docker runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockerParameters {
    pub image: String,
    /// Number of CPUs, 0 for no limit.
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub cpu_limit: f64,
    /// Memory limit in megabytes, 0 for no limit.
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub memory_limit: i64,
}

fn is_zero_f64(v: &f64) -> bool {
    *v == 0.0
}

fn is_zero_i64(v: &i64) -> bool {
    *v == 0
}

impl DockerParameters {
    pub fn new(image: impl Into<String>) -> Self {
        Self { image: image.into(), cpu_limit: 0.0, memory_limit: 0 }
    }

    evl_core::setters! {
        set {
            cpu_limit: f64,
            memory_limit: i64,
        }
    }

    /// Limits are only checked when set; they catch clearly wrong values.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.check_string_not_empty("image", &self.image);
        if self.cpu_limit != 0.0 {
            v.check_float_min_max("cpu_limit", self.cpu_limit, 0.1, 1024.0);
        }
        if self.memory_limit != 0 {
            v.check_int_min_max("memory_limit", self.memory_limit, 10, 10_000_000);
        }
        v.finish()
    }

    pub fn nano_cpus(&self) -> Option<i64> {
        (self.cpu_limit != 0.0).then(|| (self.cpu_limit * 1e9) as i64)
    }

    pub fn memory_bytes(&self) -> Option<i64> {
        (self.memory_limit != 0).then(|| self.memory_limit * 1_000_000)
    }
}

/// Registry login split out of a `user:secret` authentication key.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: String,
}

impl RegistryCredentials {
    pub fn from_key(key: &str) -> Result<Self, RunnerError> {
        match key.split_once(':') {
            Some((username, password)) => {
                Ok(Self { username: username.to_string(), password: password.to_string() })
            }
            None => Err(RunnerError::Config("invalid registry authentication key format".into())),
        }
    }
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials").field("username", &self.username).finish_non_exhaustive()
    }
}

/// Split an image reference into name and tag, defaulting to `latest` so a
/// pull never fetches every tag. Digest references keep an empty tag.
pub fn split_image_reference(image: &str) -> (&str, &str) {
    if image.contains('@') {
        return (image, "");
    }
    let name_start = image.rfind('/').map_or(0, |i| i + 1);
    match image[name_start..].rfind(':') {
        Some(i) => (&image[..name_start + i], &image[name_start + i + 1..]),
        None => (image, "latest"),
    }
}

#[cfg(test)]
#[path = "params_tests.rs"]
mod tests;
