// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner contract shared by every backend.
//!
//! A runner owns one job execution's resources on its backend. The
//! [`RunnerSession`](crate::RunnerSession) driver calls `init` once, then
//! `execute_step` for each step in order, then `terminate` exactly once.

use crate::error::{CleanupError, RunnerError};
use async_trait::async_trait;
use evl_core::{FileSet, JobExecutionId, Step, DEFAULT_CODE_HEADER};
use evl_identity::Identity;
use std::collections::BTreeMap;
use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;

/// Directory, relative to the execution root, holding identity field files.
pub const IDENTITIES_DIR: &str = "identities";

/// Sinks receiving a step's output streams.
pub struct StepOutput<'a> {
    pub stdout: &'a mut (dyn AsyncWrite + Send + Unpin),
    pub stderr: &'a mut (dyn AsyncWrite + Send + Unpin),
}

impl<'a> StepOutput<'a> {
    pub fn new(stdout: &'a mut (dyn AsyncWrite + Send + Unpin), stderr: &'a mut (dyn AsyncWrite + Send + Unpin)) -> Self {
        Self { stdout, stderr }
    }
}

#[async_trait]
pub trait Runner: Send {
    /// Backend name (`ssh`, `docker`, `local`).
    fn name(&self) -> &'static str;

    /// Workspace root of the execution on the target.
    fn dir_path(&self) -> String;

    /// Acquire backend resources and stage the file set.
    async fn init(&mut self, cancel: &CancellationToken) -> Result<(), RunnerError>;

    async fn execute_step(
        &mut self,
        step: &Step,
        output: &mut StepOutput<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), RunnerError>;

    /// Release everything `init` acquired. Must tolerate partial
    /// initialization and repeated calls.
    async fn terminate(&mut self) -> Vec<CleanupError>;
}

#[async_trait]
impl<R: Runner + ?Sized> Runner for Box<R> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn dir_path(&self) -> String {
        (**self).dir_path()
    }

    async fn init(&mut self, cancel: &CancellationToken) -> Result<(), RunnerError> {
        (**self).init(cancel).await
    }

    async fn execute_step(
        &mut self,
        step: &Step,
        output: &mut StepOutput<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), RunnerError> {
        (**self).execute_step(step, output, cancel).await
    }

    async fn terminate(&mut self) -> Vec<CleanupError> {
        (**self).terminate().await
    }
}

/// Everything a backend needs to know about the job execution it runs.
#[derive(Debug, Clone)]
pub struct RunnerContext {
    pub job_execution_id: JobExecutionId,
    pub job_name: String,
    /// Identity the backend authenticates with (ssh login, registry auth).
    pub identity: Option<Identity>,
    pub environment: BTreeMap<String, String>,
    pub file_set: FileSet,
}

impl RunnerContext {
    /// Context for `steps`, with their code staged and the execution
    /// variables exported.
    pub fn new(job_execution_id: JobExecutionId, job_name: impl Into<String>, steps: &[Step]) -> Self {
        let job_name = job_name.into();
        let mut environment = BTreeMap::new();
        environment.insert("EVENTLINE".to_string(), "true".to_string());
        environment.insert("EVENTLINE_JOB_NAME".to_string(), job_name.clone());
        environment.insert("EVENTLINE_JOB_EXECUTION_ID".to_string(), job_execution_id.to_string());
        Self {
            job_execution_id,
            job_name,
            identity: None,
            environment,
            file_set: FileSet::from_steps(steps, DEFAULT_CODE_HEADER),
        }
    }

    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(name.into(), value.into());
        self
    }

    /// Attach the runner identity.
    pub fn with_identity(mut self, identity: Identity) -> Result<Self, serde_json::Error> {
        self.add_identity_files(&identity)?;
        self.identity = Some(identity);
        Ok(self)
    }

    /// Stage each payload field of `identity` as `identities/<name>/<field>`
    /// and export its environment. Strings are written raw, other values as
    /// JSON.
    pub fn add_identity_files(&mut self, identity: &Identity) -> Result<(), serde_json::Error> {
        let encoded = identity.data.encode()?;
        if let serde_json::Value::Object(fields) = encoded {
            for (field, value) in fields {
                let content = match value {
                    serde_json::Value::String(s) => s,
                    other => serde_json::to_string(&other)?,
                };
                let path = format!("{IDENTITIES_DIR}/{}/{field}", identity.name);
                self.file_set.add_file(path, content, 0o600);
            }
        }
        for (name, value) in identity.data.environment() {
            self.environment.entry(name).or_insert(value);
        }
        Ok(())
    }

    /// Environment of every step: the job environment plus `EVENTLINE_DIR`.
    pub fn step_environment(&self, dir_path: &str) -> BTreeMap<String, String> {
        let mut env = self.environment.clone();
        env.insert("EVENTLINE_DIR".to_string(), dir_path.to_string());
        env
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
