// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local-process runner.
//!
//! Steps run as child processes of the current process, in a private
//! workspace `<root_directory>/<job-execution-id>` with a cleared
//! environment plus the job environment.

use crate::error::{CleanupError, RunnerError};
use crate::runner::{Runner, RunnerContext, StepOutput};
use async_trait::async_trait;
use evl_core::{FileSetError, Step, ValidationErrors, Validator};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use serde::{Deserialize, Serialize};
use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_ROOT_DIRECTORY: &str = "tmp/local-execution";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Relative paths are resolved against the working directory.
    pub root_directory: PathBuf,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self { root_directory: PathBuf::from(DEFAULT_ROOT_DIRECTORY) }
    }
}

impl LocalConfig {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::with_prefix("/local");
        v.check_string_not_empty("root_directory", &self.root_directory.to_string_lossy());
        v.finish()
    }
}

pub struct LocalRunner {
    ctx: RunnerContext,
    root_path: PathBuf,
    initialized: bool,
}

impl LocalRunner {
    pub fn new(ctx: RunnerContext, config: &LocalConfig) -> Result<Self, RunnerError> {
        config.validate()?;
        let root = if config.root_directory.is_absolute() {
            config.root_directory.clone()
        } else {
            std::env::current_dir()
                .map_err(|e| RunnerError::Config(format!("cannot resolve working directory: {e}")))?
                .join(&config.root_directory)
        };
        let root_path = root.join(ctx.job_execution_id.as_str());
        Ok(Self { ctx, root_path, initialized: false })
    }
}

/// Name of the signal that killed a process, without the `SIG` prefix.
fn signal_name(signal: i32) -> String {
    match Signal::try_from(signal) {
        Ok(signal) => signal.as_str().trim_start_matches("SIG").to_string(),
        Err(_) => signal.to_string(),
    }
}

fn exit_result(status: ExitStatus) -> Result<(), RunnerError> {
    match (status.code(), status.signal()) {
        (Some(0), _) => Ok(()),
        (Some(code), _) => Err(RunnerError::exit(code)),
        (None, Some(signal)) => Err(RunnerError::signal(signal_name(signal))),
        (None, None) => Err(RunnerError::exit(-1)),
    }
}

#[async_trait]
impl Runner for LocalRunner {
    fn name(&self) -> &'static str {
        "local"
    }

    fn dir_path(&self) -> String {
        self.root_path.to_string_lossy().into_owned()
    }

    async fn init(&mut self, cancel: &CancellationToken) -> Result<(), RunnerError> {
        if cancel.is_cancelled() {
            return Err(RunnerError::Cancelled { op: "upload" });
        }
        let file_set = self.ctx.file_set.clone();
        let root = self.root_path.clone();
        self.initialized = true;
        tokio::task::spawn_blocking(move || file_set.write_to(&root))
            .await
            .map_err(|e| RunnerError::transport("write files to", self.root_path.display(), e))??;
        tracing::debug!(files = self.ctx.file_set.len(), dir = %self.root_path.display(), "file set written");
        Ok(())
    }

    async fn execute_step(
        &mut self,
        step: &Step,
        output: &mut StepOutput<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), RunnerError> {
        let dir_path = self.dir_path();
        let (program, args) = step.command_line(&dir_path);
        tracing::debug!(%program, ?args, "spawning process");

        let mut child = Command::new(&program)
            .args(&args)
            .current_dir(&self.root_path)
            .env_clear()
            .envs(self.ctx.step_environment(&dir_path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RunnerError::transport("start", &program, e))?;
        let pid = child.id();
        let (Some(mut stdout), Some(mut stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(RunnerError::transport("capture output of", &program, "missing pipe"));
        };

        let run = async {
            let (out, err) = tokio::join!(
                tokio::io::copy(&mut stdout, &mut *output.stdout),
                tokio::io::copy(&mut stderr, &mut *output.stderr),
            );
            out.and(err).map_err(|e| RunnerError::transport("copy output of", &program, e))?;
            child.wait().await.map_err(|e| RunnerError::transport("wait for", &program, e))
        };
        let status = tokio::select! {
            _ = cancel.cancelled() => None,
            status = run => Some(status),
        };

        match status {
            Some(status) => exit_result(status?),
            None => {
                if let Some(pid) = pid {
                    if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                        tracing::warn!(pid, error = %e, "cannot kill process");
                    }
                }
                let _ = child.wait().await;
                Err(RunnerError::Cancelled { op: "step execution" })
            }
        }
    }

    async fn terminate(&mut self) -> Vec<CleanupError> {
        if !std::mem::take(&mut self.initialized) {
            return Vec::new();
        }
        match tokio::fs::remove_dir_all(&self.root_path).await {
            Ok(()) => Vec::new(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                let source = FileSetError::Delete { path: self.root_path.clone(), source: e };
                vec![CleanupError::new("delete workspace", self.root_path.display(), source)]
            }
        }
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
