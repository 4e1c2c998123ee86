// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to flush logs before terminating.

use evl_runner::RunnerError;
use std::fmt;

/// Exit code of a run whose step failed.
pub const STEP_FAILED: i32 = 1;
/// Exit code of a run that could not start or lost its backend.
pub const RUNNER_FAILED: i32 = 2;
/// Exit code of an interrupted run (128 + SIGINT).
pub const CANCELLED: i32 = 130;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl From<RunnerError> for ExitError {
    fn from(e: RunnerError) -> Self {
        let code = match &e {
            RunnerError::StepFailed(_) => STEP_FAILED,
            RunnerError::Cancelled { .. } => CANCELLED,
            _ => RUNNER_FAILED,
        };
        Self::new(code, e.to_string())
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}
