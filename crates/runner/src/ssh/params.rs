// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use evl_core::{ValidationErrors, Validator};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ROOT_DIRECTORY: &str = "/tmp/eventline/execution";

/// Host key algorithms accepted for pinned host keys.
pub const HOST_KEY_ALGORITHMS: &[&str] = &[
    "ssh-dss",
    "ssh-rsa",
    "ecdsa-sha2-nistp256",
    "ecdsa-sha2-nistp384",
    "ecdsa-sha2-nistp521",
    "ssh-ed25519",
];

/// Server-side configuration of the ssh runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SshConfig {
    /// Shared directory under which every execution gets
    /// `<user>/<job-execution-id>`.
    pub root_directory: String,
    /// Extra mounts known to the target; informational only.
    pub mount_points: Vec<String>,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self { root_directory: DEFAULT_ROOT_DIRECTORY.to_string(), mount_points: Vec::new() }
    }
}

impl SshConfig {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::with_prefix("/ssh");
        v.check_absolute_path("root_directory", &self.root_directory);
        v.finish()
    }
}

fn default_port() -> i64 {
    22
}

fn default_user() -> String {
    "root".to_string()
}

/// Per-job parameters of the ssh runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshParameters {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: i64,
    #[serde(default = "default_user")]
    pub user: String,
    /// Base64 public key blob the server must present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_key_algorithm: Option<String>,
}

impl SshParameters {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into(), port: default_port(), user: default_user(), host_key: None, host_key_algorithm: None }
    }

    evl_core::setters! {
        into { user: String }
        set { port: i64 }
    }

    pub fn with_host_key(mut self, algorithm: &str, key: &str) -> Self {
        self.host_key_algorithm = Some(algorithm.to_string());
        self.host_key = Some(key.to_string());
        self
    }

    /// `host:port`, the address dialed and the target named in errors.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.check_string_not_empty("host", &self.host);
        v.check_int_min_max("port", self.port, 1, 65535);
        v.check_string_not_empty("user", &self.user);
        match (&self.host_key, &self.host_key_algorithm) {
            (Some(_), None) => {
                v.add("host_key_algorithm", "missing_value", "missing host key algorithm");
            }
            (_, Some(algorithm)) => {
                v.check_string_value("host_key_algorithm", algorithm, HOST_KEY_ALGORITHMS);
            }
            (None, None) => {}
        }
        v.finish()
    }
}

#[cfg(test)]
#[path = "params_tests.rs"]
mod tests;
