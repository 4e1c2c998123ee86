// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for specs

pub use evl_core::{JobExecutionId, OnFailure, Step};
pub use evl_runner::{RunnerContext, RunnerError, RunnerSession, StepFailure, StepOutput};
pub use std::path::{Path, PathBuf};
pub use tempfile::TempDir;
pub use tokio_util::sync::CancellationToken;

use std::sync::Once;

static BUILD: Once = Once::new();

/// Path of the `evl` binary, building it when the test run did not.
fn evl_binary() -> PathBuf {
    let path = assert_cmd::cargo::cargo_bin("evl");
    if !path.exists() {
        BUILD.call_once(|| {
            let cargo = std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
            let status = std::process::Command::new(cargo)
                .args(["build", "--quiet", "-p", "evl-cli", "--bin", "evl"])
                .status()
                .unwrap();
            assert!(status.success(), "cannot build evl");
        });
    }
    path
}

/// Captured streams of a finished step or command.
#[derive(Default)]
pub struct Captured {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl Captured {
    pub fn output(&mut self) -> StepOutput<'_> {
        StepOutput::new(&mut self.stdout, &mut self.stderr)
    }

    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

pub struct CliBuilder {
    args: Vec<String>,
    envs: Vec<(String, String)>,
    state: TempDir,
}

pub fn cli() -> CliBuilder {
    CliBuilder { args: Vec::new(), envs: Vec::new(), state: TempDir::new().unwrap() }
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|a| a.to_string()));
        self
    }

    pub fn env(mut self, name: &str, value: &str) -> Self {
        self.envs.push((name.to_string(), value.to_string()));
        self
    }

    fn run(self) -> RunAssert {
        let output = assert_cmd::Command::new(evl_binary())
            .args(&self.args)
            .env("EVL_STATE_DIR", self.state.path())
            .env("EVL_LOG", "warn")
            .env_remove("EVL_CONFIG")
            .env_remove("EVL_LOG_FILE")
            .envs(self.envs)
            .output()
            .unwrap();
        RunAssert {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    pub fn passes(self) -> RunAssert {
        let result = self.run();
        assert_eq!(result.code, Some(0), "expected success\nstdout: {}\nstderr: {}", result.stdout, result.stderr);
        result
    }

    pub fn fails_with(self, code: i32) -> RunAssert {
        let result = self.run();
        assert_eq!(result.code, Some(code), "unexpected exit\nstdout: {}\nstderr: {}", result.stdout, result.stderr);
        result
    }
}

pub struct RunAssert {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RunAssert {
    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(self.stdout.contains(needle), "stdout lacks {needle:?}:\n{}", self.stdout);
        self
    }

    pub fn stdout_lacks(self, needle: &str) -> Self {
        assert!(!self.stdout.contains(needle), "stdout has {needle:?}:\n{}", self.stdout);
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(self.stderr.contains(needle), "stderr lacks {needle:?}:\n{}", self.stderr);
        self
    }
}

/// Write `content` to `dir/name` and return the path as a string.
pub fn write_file(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path.display().to_string()
}
