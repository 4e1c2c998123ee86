// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session driver enforcing the runner lifecycle

use crate::error::RunnerError;
use crate::runner::{Runner, StepOutput};
use evl_core::{JobExecutionId, Step};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Initialized,
    Terminated,
}

evl_core::simple_display! {
    SessionState {
        Created => "created",
        Initialized => "initialized",
        Terminated => "terminated",
    }
}

/// Drives a [`Runner`] through `Created → Initialized → Terminated`.
pub struct RunnerSession<R> {
    runner: R,
    job_execution_id: JobExecutionId,
    state: SessionState,
}

impl<R: Runner> RunnerSession<R> {
    pub fn new(job_execution_id: JobExecutionId, runner: R) -> Self {
        Self { runner, job_execution_id, state: SessionState::Created }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn into_runner(self) -> R {
        self.runner
    }

    pub async fn init(&mut self, cancel: &CancellationToken) -> Result<(), RunnerError> {
        self.require("initialize", SessionState::Created)?;
        let start = Instant::now();
        self.runner.init(cancel).await?;
        self.state = SessionState::Initialized;
        tracing::info!(
            job_execution_id = %self.job_execution_id,
            runner = self.runner.name(),
            dir = %self.runner.dir_path(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "runner initialized"
        );
        Ok(())
    }

    pub async fn execute_step(
        &mut self,
        step: &Step,
        output: &mut StepOutput<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), RunnerError> {
        self.require("execute step", SessionState::Initialized)?;
        let start = Instant::now();
        let span = tracing::info_span!("step", position = step.position, name = %step.display_name());
        let result = self.runner.execute_step(step, output, cancel).instrument(span).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(()) => tracing::info!(position = step.position, elapsed_ms, "step succeeded"),
            Err(e) => tracing::warn!(position = step.position, elapsed_ms, error = %e, "step failed"),
        }
        result
    }

    /// Release runner resources. Cleanup failures are logged; calling this
    /// again is a no-op.
    pub async fn terminate(&mut self) {
        if self.state == SessionState::Terminated {
            return;
        }
        let errors = self.runner.terminate().await;
        for e in &errors {
            tracing::error!(job_execution_id = %self.job_execution_id, runner = self.runner.name(), error = %e, "cleanup failed");
        }
        self.state = SessionState::Terminated;
        tracing::info!(job_execution_id = %self.job_execution_id, runner = self.runner.name(), "runner terminated");
    }

    /// Initialize, run `steps` in order and terminate.
    ///
    /// A failing step aborts the execution unless it is marked
    /// `on_failure = continue` and failed as a program (transport errors
    /// always abort). Cancellation is checked before each step. The runner
    /// is terminated exactly once whatever the outcome.
    pub async fn run(
        &mut self,
        steps: &[Step],
        output: &mut StepOutput<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), RunnerError> {
        let span = tracing::info_span!(
            "job_execution",
            id = %self.job_execution_id,
            runner = self.runner.name()
        );
        let result = self.run_steps(steps, output, cancel).instrument(span).await;
        self.terminate().await;
        result
    }

    async fn run_steps(
        &mut self,
        steps: &[Step],
        output: &mut StepOutput<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), RunnerError> {
        self.init(cancel).await?;
        for step in steps {
            if cancel.is_cancelled() {
                tracing::info!(position = step.position, "execution interrupted");
                return Err(RunnerError::Cancelled { op: "job execution" });
            }
            match self.execute_step(step, output, cancel).await {
                Ok(()) => {}
                Err(RunnerError::StepFailed(failure)) if !step.aborts_on_failure() => {
                    tracing::info!(position = step.position, %failure, "continuing after step failure");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn require(&self, op: &'static str, expected: SessionState) -> Result<(), RunnerError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(RunnerError::InvalidState { op, state: self.state })
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
