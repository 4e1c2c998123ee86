// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted runner for session tests
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::error::{CleanupError, RunnerError};
use crate::runner::{Runner, StepOutput};
use async_trait::async_trait;
use evl_core::Step;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

/// Recorded runner call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerCall {
    Init,
    ExecuteStep { position: usize },
    Terminate,
}

/// Scripted result of an init or step call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeOutcome {
    Succeed,
    Exit(i32),
    Signal(String),
    Transport(String),
    /// Wait for cancellation, then report it.
    Hang,
}

impl FakeOutcome {
    async fn resolve(&self, op: &'static str, cancel: &CancellationToken) -> Result<(), RunnerError> {
        match self {
            FakeOutcome::Succeed => Ok(()),
            FakeOutcome::Exit(code) => Err(RunnerError::exit(*code)),
            FakeOutcome::Signal(name) => Err(RunnerError::signal(name.clone())),
            FakeOutcome::Transport(message) => Err(RunnerError::transport(op, "fake", message)),
            FakeOutcome::Hang => {
                cancel.cancelled().await;
                Err(RunnerError::Cancelled { op })
            }
        }
    }
}

#[derive(Default)]
struct FakeRunnerState {
    calls: Vec<RunnerCall>,
    init: Option<FakeOutcome>,
    steps: HashMap<usize, FakeOutcome>,
    cleanup_errors: Vec<String>,
}

/// Runner whose outcomes are scripted per call; writes `step <n>` to stdout
/// for every step it executes.
#[derive(Clone, Default)]
pub struct FakeRunner {
    state: Arc<Mutex<FakeRunnerState>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RunnerCall> {
        self.state.lock().calls.clone()
    }

    pub fn set_init(&self, outcome: FakeOutcome) {
        self.state.lock().init = Some(outcome);
    }

    pub fn set_step(&self, position: usize, outcome: FakeOutcome) {
        self.state.lock().steps.insert(position, outcome);
    }

    /// Make `terminate` report a cleanup failure.
    pub fn fail_cleanup(&self, message: &str) {
        self.state.lock().cleanup_errors.push(message.to_string());
    }

    pub fn terminate_count(&self) -> usize {
        self.calls().iter().filter(|c| **c == RunnerCall::Terminate).count()
    }
}

#[async_trait]
impl Runner for FakeRunner {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn dir_path(&self) -> String {
        "/fake".to_string()
    }

    async fn init(&mut self, cancel: &CancellationToken) -> Result<(), RunnerError> {
        let outcome = {
            let mut state = self.state.lock();
            state.calls.push(RunnerCall::Init);
            state.init.clone().unwrap_or(FakeOutcome::Succeed)
        };
        outcome.resolve("initialize", cancel).await
    }

    async fn execute_step(
        &mut self,
        step: &Step,
        output: &mut StepOutput<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), RunnerError> {
        let outcome = {
            let mut state = self.state.lock();
            state.calls.push(RunnerCall::ExecuteStep { position: step.position });
            state.steps.get(&step.position).cloned().unwrap_or(FakeOutcome::Succeed)
        };
        let line = format!("step {}\n", step.position);
        output
            .stdout
            .write_all(line.as_bytes())
            .await
            .map_err(|e| RunnerError::transport("write output", "stdout", e))?;
        outcome.resolve("execute step", cancel).await
    }

    async fn terminate(&mut self) -> Vec<CleanupError> {
        let mut state = self.state.lock();
        state.calls.push(RunnerCall::Terminate);
        state.cleanup_errors.iter().map(|m| CleanupError::new("clean up", "fake", m)).collect()
    }
}
