// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container runner.
//!
//! Each job execution gets one long-lived container named
//! `eventline-job-<id>` running `sleep`. The file set is copied to
//! `/eventline` before the container starts and every step is an exec.

mod client;
mod engine;
#[cfg(any(test, feature = "test-support"))]
mod fake;
mod params;

pub use client::BollardEngine;
pub use engine::{ContainerEngine, ContainerSpec, EngineError, ExecHandle, ExecSpec, OutputChunk};
#[cfg(any(test, feature = "test-support"))]
pub use fake::{EngineCall, FakeContainerExec, FakeEngine};
pub use params::{split_image_reference, DockerConfig, DockerParameters, RegistryCredentials, DEFAULT_URI};

use crate::error::{CleanupError, RunnerError};
use crate::runner::{Runner, RunnerContext, StepOutput};
use async_trait::async_trait;
use evl_core::Step;
use futures_util::StreamExt;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

/// Workspace root inside the container.
pub const CONTAINER_ROOT: &str = "/eventline";

/// Seconds the engine waits before killing the container on stop.
const STOP_TIMEOUT: i64 = 1;
const PIDS_LIMIT: i64 = 4096;
const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(100);
const CREATE_TIMEOUT: Duration = Duration::from_secs(60);

pub fn container_name(ctx: &RunnerContext) -> String {
    format!("eventline-job-{}", ctx.job_execution_id)
}

fn env_list(env: &BTreeMap<String, String>) -> Vec<String> {
    env.iter().map(|(k, v)| format!("{k}={v}")).collect()
}

pub struct DockerRunner<E> {
    ctx: RunnerContext,
    params: DockerParameters,
    engine: E,
    name: String,
    container_id: Option<String>,
}

impl<E: ContainerEngine> DockerRunner<E> {
    pub fn new(ctx: RunnerContext, params: DockerParameters, engine: E) -> Result<Self, RunnerError> {
        params.validate()?;
        let name = container_name(&ctx);
        Ok(Self { ctx, params, engine, name, container_id: None })
    }

    pub fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }

    fn container_spec(&self) -> ContainerSpec {
        let mut labels = BTreeMap::new();
        labels.insert("net.eventline.job-name".to_string(), self.ctx.job_name.clone());
        labels.insert("net.eventline.job-execution-id".to_string(), self.ctx.job_execution_id.to_string());
        ContainerSpec {
            name: self.name.clone(),
            image: self.params.image.clone(),
            cmd: vec!["sleep".to_string(), "86400".to_string()],
            env: env_list(&self.ctx.step_environment(CONTAINER_ROOT)),
            labels,
            nano_cpus: self.params.nano_cpus(),
            memory: self.params.memory_bytes(),
            pids_limit: Some(PIDS_LIMIT),
            stop_timeout: Some(STOP_TIMEOUT),
        }
    }

    async fn pull_image(&self, cancel: &CancellationToken) -> Result<(), RunnerError> {
        let credentials = match &self.ctx.identity {
            Some(identity) => Some(RegistryCredentials::from_key(&evl_identity::registry_auth_key(identity)?)?),
            None => None,
        };
        let image = &self.params.image;
        tracing::info!(%image, authenticated = credentials.is_some(), "pulling image");

        let mut progress = self.engine.pull_image(image, credentials);
        loop {
            let item = tokio::select! {
                _ = cancel.cancelled() => return Err(RunnerError::Cancelled { op: "image pull" }),
                item = progress.next() => item,
            };
            match item {
                Some(Ok(status)) => tracing::debug!(%image, %status, "image pull"),
                Some(Err(e)) => return Err(RunnerError::transport("pull image", image, e)),
                None => return Ok(()),
            }
        }
    }

    /// Poll the container until the engine reports it created.
    async fn wait_created(&self, id: &str, cancel: &CancellationToken) -> Result<(), RunnerError> {
        let deadline = tokio::time::Instant::now() + CREATE_TIMEOUT;
        loop {
            let status = self
                .engine
                .container_status(id)
                .await
                .map_err(|e| RunnerError::transport("inspect container", &self.name, e))?;
            if status.as_deref() == Some("created") {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(RunnerError::transport(
                    "create container",
                    &self.name,
                    format!("container still {} after {}s", status.unwrap_or_default(), CREATE_TIMEOUT.as_secs()),
                ));
            }
            tokio::select! {
                _ = cancel.cancelled() => return Err(RunnerError::Cancelled { op: "container creation" }),
                _ = tokio::time::sleep(STATUS_POLL_INTERVAL) => {}
            }
        }
    }
}

#[async_trait]
impl<E: ContainerEngine> Runner for DockerRunner<E> {
    fn name(&self) -> &'static str {
        "docker"
    }

    fn dir_path(&self) -> String {
        CONTAINER_ROOT.to_string()
    }

    async fn init(&mut self, cancel: &CancellationToken) -> Result<(), RunnerError> {
        self.pull_image(cancel).await?;

        let spec = self.container_spec();
        let id = self
            .engine
            .create_container(&spec)
            .await
            .map_err(|e| RunnerError::transport("create container", &self.name, e))?;
        tracing::info!(container = %self.name, %id, "container created");
        self.container_id = Some(id.clone());

        self.wait_created(&id, cancel).await?;

        if cancel.is_cancelled() {
            return Err(RunnerError::Cancelled { op: "upload" });
        }
        let prefix = CONTAINER_ROOT.trim_start_matches('/');
        let mtime = chrono::Utc::now().timestamp().max(0) as u64;
        let archive = self.ctx.file_set.clone().with_prefix(prefix).tar_archive(mtime)?;
        self.engine
            .upload_archive(&id, "/", archive)
            .await
            .map_err(|e| RunnerError::transport("upload files to", &self.name, e))?;

        self.engine.start_container(&id).await.map_err(|e| RunnerError::transport("start container", &self.name, e))
    }

    async fn execute_step(
        &mut self,
        step: &Step,
        output: &mut StepOutput<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), RunnerError> {
        let Some(id) = self.container_id.as_deref() else {
            return Err(RunnerError::transport("execute step in", &self.name, "container not created"));
        };
        let (name, args) = step.command_line(CONTAINER_ROOT);
        let spec = ExecSpec {
            cmd: std::iter::once(name).chain(args).collect(),
            env: env_list(&self.ctx.step_environment(CONTAINER_ROOT)),
            working_dir: CONTAINER_ROOT.to_string(),
        };
        tracing::debug!(container = %self.name, cmd = ?spec.cmd, "running exec");

        let mut exec = self.engine.exec(id, &spec).await.map_err(|e| RunnerError::transport("exec in", &self.name, e))?;
        loop {
            let chunk = tokio::select! {
                _ = cancel.cancelled() => return Err(RunnerError::Cancelled { op: "step execution" }),
                chunk = exec.output.next() => chunk,
            };
            let result = match chunk {
                Some(Ok(OutputChunk::Stdout(data))) => output.stdout.write_all(&data).await,
                Some(Ok(OutputChunk::Stderr(data))) => output.stderr.write_all(&data).await,
                Some(Err(e)) => return Err(RunnerError::transport("read output of", &self.name, e)),
                None => break,
            };
            result.map_err(|e| RunnerError::transport("write output of", &self.name, e))?;
        }

        match self.engine.exec_exit_code(&exec.id).await {
            Ok(Some(0)) => Ok(()),
            Ok(Some(code)) => Err(RunnerError::exit(code as i32)),
            Ok(None) => Err(RunnerError::transport("inspect exec in", &self.name, "no exit code reported")),
            Err(e) => Err(RunnerError::transport("inspect exec in", &self.name, e)),
        }
    }

    async fn terminate(&mut self) -> Vec<CleanupError> {
        let Some(id) = self.container_id.take() else {
            return Vec::new();
        };
        match self.engine.remove_container(&id).await {
            Ok(()) => {
                tracing::info!(container = %self.name, "container deleted");
                Vec::new()
            }
            Err(e) => vec![CleanupError::new("delete container", &self.name, e)],
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
