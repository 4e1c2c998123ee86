// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job files: what to run, where, and with which identity.
//!
//! ```toml
//! name = "build"
//!
//! [runner]
//! name = "docker"
//! identity = "dockerhub"
//! parameters = { image = "alpine:3.20" }
//!
//! [environment]
//! CI = "true"
//!
//! [[steps]]
//! label = "test"
//! command = { name = "make", arguments = ["test"] }
//!
//! [[steps]]
//! code = "echo done"
//! on_failure = "continue"
//! ```

use anyhow::{Context, Result};
use evl_core::{Step, StepAction, ValidationErrors, Validator};
use evl_runner::RunnerParameters;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobFile {
    pub name: String,
    pub runner: RunnerSection,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerSection {
    pub name: String,
    /// Identity the runner authenticates with.
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default)]
    pub parameters: toml::Table,
}

impl JobFile {
    pub fn parse(content: &str) -> Result<Self> {
        let mut job: JobFile = toml::from_str(content).context("cannot parse job file")?;
        for (i, step) in job.steps.iter_mut().enumerate() {
            step.position = i + 1;
        }
        job.validate()?;
        Ok(job)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid job file {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.check_name("name", &self.name);
        v.check_string_not_empty("runner/name", &self.runner.name);
        v.check_array_not_empty("steps", &self.steps);
        for (i, step) in self.steps.iter().enumerate() {
            let key = format!("steps/{i}");
            match &step.action {
                StepAction::Command { name, .. } => {
                    v.check_string_not_empty(&format!("{key}/command/name"), name);
                }
                StepAction::Code(code) => {
                    v.check_string_not_empty(&format!("{key}/code"), code);
                }
                StepAction::Script { path, .. } => {
                    v.check_string_not_empty(&format!("{key}/script/path"), path);
                }
            }
        }
        v.finish()
    }

    /// Decode the runner parameters for the named backend.
    pub fn runner_parameters(&self) -> Result<RunnerParameters> {
        let value = serde_json::to_value(&self.runner.parameters).context("cannot convert runner parameters")?;
        Ok(RunnerParameters::decode(&self.runner.name, value)?)
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
