// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Seams between the ssh runner and its transport.
//!
//! The runner only talks to these traits; `client` implements them with
//! russh and russh-sftp, `fake` records calls for tests.

use crate::error::RunnerError;
use crate::runner::StepOutput;
use crate::ssh::params::SshParameters;
use async_trait::async_trait;
use evl_identity::TransportAuth;
use std::collections::BTreeMap;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// How a remote command ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    Status(u32),
    Signal(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FsError {
    pub message: String,
}

impl FsError {
    pub fn new(message: impl std::fmt::Display) -> Self {
        Self { message: message.to_string() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteMetadata {
    pub is_dir: bool,
    /// Permission bits only, e.g. `0o755`.
    pub mode: u32,
}

#[async_trait]
pub trait SshConnector: Send + Sync {
    /// Dial, verify the host key and authenticate.
    async fn connect(
        &self,
        params: &SshParameters,
        auth: &TransportAuth,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn SshConnection>, RunnerError>;
}

#[async_trait]
pub trait SshConnection: Send {
    async fn open_sftp(&mut self) -> Result<Box<dyn RemoteFs>, RunnerError>;

    /// Run `command` in a new session channel with `env` exported, streaming
    /// its output. On cancellation the program is killed and `Cancelled`
    /// returned.
    async fn exec(
        &mut self,
        command: &str,
        env: &BTreeMap<String, String>,
        output: &mut StepOutput<'_>,
        cancel: &CancellationToken,
    ) -> Result<ExitOutcome, RunnerError>;

    async fn close(&mut self) -> Result<(), FsError>;
}

/// Remote file system operations over sftp. Paths are absolute.
#[async_trait]
pub trait RemoteFs: Send {
    /// Create `path` and any missing parent.
    async fn mkdir_all(&mut self, path: &str) -> Result<(), FsError>;
    async fn stat(&mut self, path: &str) -> Result<RemoteMetadata, FsError>;
    /// Like `stat` but never follows symbolic links.
    async fn lstat(&mut self, path: &str) -> Result<RemoteMetadata, FsError>;
    async fn chmod(&mut self, path: &str, mode: u32) -> Result<(), FsError>;
    /// Entry names of a directory, without `.` and `..`.
    async fn read_dir(&mut self, path: &str) -> Result<Vec<String>, FsError>;
    /// Create or truncate `path` and write `content`.
    async fn write_file(&mut self, path: &str, content: &[u8]) -> Result<(), FsError>;
    async fn remove_file(&mut self, path: &str) -> Result<(), FsError>;
    async fn remove_dir(&mut self, path: &str) -> Result<(), FsError>;
    async fn close(&mut self) -> Result<(), FsError>;
}
