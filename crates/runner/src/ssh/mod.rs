// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote-shell runner.
//!
//! # Remote layout
//!
//! ```text
//! <root_directory>                  shared, mode 0777, never deleted
//!      └── <user>/<job-execution-id>   private, mode 0700
//!               ├── steps/<position>
//!               └── identities/<name>/<field>
//! ```
//!
//! The shared root lets several users run jobs on the same host: it is owned
//! by whoever ran first, so it is only chmod-ed when its mode is wrong.

mod client;
#[cfg(any(test, feature = "test-support"))]
mod fake;
mod params;
mod transport;

pub use client::{RusshConnector, CONNECT_TIMEOUT};
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeExec, FakeSsh, SshCall};
pub use params::{SshConfig, SshParameters, DEFAULT_ROOT_DIRECTORY, HOST_KEY_ALGORITHMS};
pub use transport::{ExitOutcome, FsError, RemoteFs, RemoteMetadata, SshConnection, SshConnector};

use crate::error::{CleanupError, RunnerError};
use crate::runner::{Runner, RunnerContext, StepOutput};
use async_trait::async_trait;
use evl_core::Step;
use tokio_util::sync::CancellationToken;

const SHARED_ROOT_MODE: u32 = 0o777;
const PRIVATE_DIR_MODE: u32 = 0o700;

pub struct SshRunner<C> {
    ctx: RunnerContext,
    config: SshConfig,
    params: SshParameters,
    connector: C,
    root_path: String,
    connection: Option<Box<dyn SshConnection>>,
    fs: Option<Box<dyn RemoteFs>>,
}

impl<C: SshConnector> SshRunner<C> {
    pub fn new(ctx: RunnerContext, config: SshConfig, params: SshParameters, connector: C) -> Result<Self, RunnerError> {
        config.validate()?;
        params.validate()?;
        let root_path = format!(
            "{}/{}/{}",
            config.root_directory.trim_end_matches('/'),
            params.user,
            ctx.job_execution_id
        );
        Ok(Self { ctx, config, params, connector, root_path, connection: None, fs: None })
    }

    async fn upload_file_set(&mut self, cancel: &CancellationToken) -> Result<(), RunnerError> {
        let Some(fs) = self.fs.as_mut() else {
            return Err(RunnerError::transport("upload files to", self.params.address(), "sftp session not open"));
        };

        create_directory(fs.as_mut(), &self.config.root_directory, SHARED_ROOT_MODE).await?;
        create_directory(fs.as_mut(), &self.root_path, PRIVATE_DIR_MODE).await?;
        for dir in self.ctx.file_set.directories(&self.root_path) {
            create_directory(fs.as_mut(), &dir, PRIVATE_DIR_MODE).await?;
        }

        for (path, file) in self.ctx.file_set.iter() {
            if cancel.is_cancelled() {
                return Err(RunnerError::Cancelled { op: "upload" });
            }
            let full = format!("{}/{path}", self.root_path);
            fs.write_file(&full, &file.content)
                .await
                .map_err(|e| RunnerError::transport("write", &full, e))?;
            fs.chmod(&full, file.mode)
                .await
                .map_err(|e| RunnerError::transport("change permissions of", &full, e))?;
        }
        tracing::debug!(files = self.ctx.file_set.len(), dir = %self.root_path, "file set uploaded");
        Ok(())
    }
}

/// Create `path` if needed and make sure its permissions are `mode`.
///
/// The directory may exist and belong to another user, in which case chmod
/// would fail, so it only happens on a mode mismatch.
pub async fn create_directory(fs: &mut dyn RemoteFs, path: &str, mode: u32) -> Result<(), RunnerError> {
    fs.mkdir_all(path).await.map_err(|e| RunnerError::transport("create directory", path, e))?;
    let metadata = fs.stat(path).await.map_err(|e| RunnerError::transport("stat directory", path, e))?;
    if metadata.mode & 0o777 == mode {
        return Ok(());
    }
    fs.chmod(path, mode).await.map_err(|e| RunnerError::transport("change permissions of", path, e))
}

/// Delete everything under `root`, keeping `root` itself. Symbolic links are
/// removed, never followed.
pub async fn delete_directory_content(fs: &mut dyn RemoteFs, root: &str) -> Result<(), CleanupError> {
    let mut stack = vec![(root.to_string(), false)];
    while let Some((path, expanded)) = stack.pop() {
        if expanded {
            if path != root {
                fs.remove_dir(&path).await.map_err(|e| CleanupError::new("delete directory", &path, e))?;
            }
            continue;
        }
        let metadata = fs.lstat(&path).await.map_err(|e| CleanupError::new("stat", &path, e))?;
        if metadata.is_dir {
            let children = fs.read_dir(&path).await.map_err(|e| CleanupError::new("list directory", &path, e))?;
            stack.push((path.clone(), true));
            for child in children {
                stack.push((format!("{}/{child}", path.trim_end_matches('/')), false));
            }
        } else {
            fs.remove_file(&path).await.map_err(|e| CleanupError::new("delete", &path, e))?;
        }
    }
    Ok(())
}

#[async_trait]
impl<C: SshConnector> Runner for SshRunner<C> {
    fn name(&self) -> &'static str {
        "ssh"
    }

    fn dir_path(&self) -> String {
        self.root_path.clone()
    }

    async fn init(&mut self, cancel: &CancellationToken) -> Result<(), RunnerError> {
        let Some(identity) = self.ctx.identity.as_ref() else {
            return Err(RunnerError::Config("the ssh runner requires an identity for authentication".into()));
        };
        let auth = evl_identity::transport_auth(identity)?;

        tracing::info!(address = %self.params.address(), user = %self.params.user, "connecting");
        let mut connection = self.connector.connect(&self.params, &auth, cancel).await?;
        let fs = tokio::select! {
            _ = cancel.cancelled() => Err(RunnerError::Cancelled { op: "open sftp" }),
            result = tokio::time::timeout(CONNECT_TIMEOUT, connection.open_sftp()) => result.unwrap_or_else(|_| {
                Err(RunnerError::transport(
                    "start sftp on",
                    self.params.address(),
                    format!("timed out after {}s", CONNECT_TIMEOUT.as_secs()),
                ))
            }),
        };
        self.connection = Some(connection);
        self.fs = Some(fs?);

        self.upload_file_set(cancel).await
    }

    async fn execute_step(
        &mut self,
        step: &Step,
        output: &mut StepOutput<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), RunnerError> {
        let Some(connection) = self.connection.as_mut() else {
            return Err(RunnerError::transport("execute step on", self.params.address(), "not connected"));
        };
        let command = step.command_string(&self.root_path);
        let env = self.ctx.step_environment(&self.root_path);
        tracing::debug!(%command, "running remote command");

        match connection.exec(&command, &env, output, cancel).await? {
            ExitOutcome::Status(0) => Ok(()),
            ExitOutcome::Status(code) => Err(RunnerError::exit(code as i32)),
            ExitOutcome::Signal(name) => Err(RunnerError::signal(name)),
        }
    }

    async fn terminate(&mut self) -> Vec<CleanupError> {
        let mut errors = Vec::new();
        if let Some(mut fs) = self.fs.take() {
            if let Err(e) = delete_directory_content(fs.as_mut(), &self.config.root_directory).await {
                errors.push(e);
            }
            if let Err(e) = fs.close().await {
                errors.push(CleanupError::new("close sftp session to", self.params.address(), e));
            }
        }
        if let Some(mut connection) = self.connection.take() {
            if let Err(e) = connection.close().await {
                errors.push(CleanupError::new("close connection to", self.params.address(), e));
            }
        }
        errors
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
