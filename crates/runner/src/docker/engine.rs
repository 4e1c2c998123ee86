// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Seam between the docker runner and the container engine.

use super::params::RegistryCredentials;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl std::fmt::Display) -> Self {
        Self { message: message.to_string() }
    }
}

/// Container to create for a job execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub cmd: Vec<String>,
    /// `NAME=value` entries.
    pub env: Vec<String>,
    pub labels: BTreeMap<String, String>,
    pub nano_cpus: Option<i64>,
    pub memory: Option<i64>,
    pub pids_limit: Option<i64>,
    pub stop_timeout: Option<i64>,
}

/// Commands run inside the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecSpec {
    pub cmd: Vec<String>,
    pub env: Vec<String>,
    pub working_dir: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputChunk {
    Stdout(Bytes),
    Stderr(Bytes),
}

/// A started exec: its id and multiplexed output.
pub struct ExecHandle {
    pub id: String,
    pub output: BoxStream<'static, Result<OutputChunk, EngineError>>,
}

#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Pull `image`, yielding progress status lines until done.
    fn pull_image(
        &self,
        image: &str,
        credentials: Option<RegistryCredentials>,
    ) -> BoxStream<'static, Result<String, EngineError>>;

    /// Create a container, returning its id.
    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, EngineError>;

    /// Current state of a container (`created`, `running`, ...).
    async fn container_status(&self, id: &str) -> Result<Option<String>, EngineError>;

    /// Extract a tar archive at `path` inside the container.
    async fn upload_archive(&self, id: &str, path: &str, archive: Vec<u8>) -> Result<(), EngineError>;

    async fn start_container(&self, id: &str) -> Result<(), EngineError>;

    async fn exec(&self, id: &str, spec: &ExecSpec) -> Result<ExecHandle, EngineError>;

    /// Exit code of a finished exec, if the engine reports one.
    async fn exec_exit_code(&self, exec_id: &str) -> Result<Option<i64>, EngineError>;

    /// Force-remove a container with its anonymous volumes.
    async fn remove_container(&self, id: &str) -> Result<(), EngineError>;
}
