// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner configuration and per-job parameters.
//!
//! Configuration is server-wide and read from TOML; parameters come with
//! each job and are decoded according to the runner name.

use crate::docker::{BollardEngine, DockerConfig, DockerParameters, DockerRunner};
use crate::error::RunnerError;
use crate::local::{LocalConfig, LocalRunner};
use crate::runner::{Runner, RunnerContext};
use crate::ssh::{RusshConnector, SshConfig, SshParameters, SshRunner};
use evl_core::{ValidationErrors, Validator};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration of every runner backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfigs {
    pub local: LocalConfig,
    pub ssh: SshConfig,
    pub docker: DockerConfig,
}

impl RunnerConfigs {
    pub fn from_toml(content: &str) -> Result<Self, RunnerError> {
        let configs: Self =
            toml::from_str(content).map_err(|e| RunnerError::Config(format!("cannot parse configuration: {e}")))?;
        configs.validate()?;
        Ok(configs)
    }

    pub fn load(path: &Path) -> Result<Self, RunnerError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RunnerError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        for result in [self.local.validate(), self.ssh.validate(), self.docker.validate()] {
            if let Err(errors) = result {
                v.extend(errors);
            }
        }
        v.finish()
    }
}

/// Per-job parameters, one variant per backend.
#[derive(Debug, Clone, PartialEq)]
pub enum RunnerParameters {
    Local,
    Ssh(SshParameters),
    Docker(DockerParameters),
}

impl RunnerParameters {
    pub const NAMES: &'static [&'static str] = &["local", "ssh", "docker"];

    /// Decode and validate the parameters of the runner called `name`.
    pub fn decode(name: &str, value: serde_json::Value) -> Result<Self, RunnerError> {
        let invalid = |e: serde_json::Error| RunnerError::Config(format!("invalid {name} runner parameters: {e}"));
        let params = match name {
            "local" => RunnerParameters::Local,
            "ssh" => RunnerParameters::Ssh(serde_json::from_value(value).map_err(invalid)?),
            "docker" => RunnerParameters::Docker(serde_json::from_value(value).map_err(invalid)?),
            other => return Err(RunnerError::UnhandledVariant(other.to_string())),
        };
        params.validate()?;
        Ok(params)
    }

    pub fn name(&self) -> &'static str {
        match self {
            RunnerParameters::Local => "local",
            RunnerParameters::Ssh(_) => "ssh",
            RunnerParameters::Docker(_) => "docker",
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            RunnerParameters::Local => Ok(()),
            RunnerParameters::Ssh(params) => params.validate(),
            RunnerParameters::Docker(params) => params.validate(),
        }
    }

    /// Instantiate the production backend for these parameters.
    pub fn build(self, ctx: RunnerContext, configs: &RunnerConfigs) -> Result<Box<dyn Runner>, RunnerError> {
        Ok(match self {
            RunnerParameters::Local => Box::new(LocalRunner::new(ctx, &configs.local)?),
            RunnerParameters::Ssh(params) => {
                Box::new(SshRunner::new(ctx, configs.ssh.clone(), params, RusshConnector::new())?)
            }
            RunnerParameters::Docker(params) => {
                configs.docker.validate()?;
                let engine = BollardEngine::connect(&configs.docker)?;
                Box::new(DockerRunner::new(ctx, params, engine)?)
            }
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
