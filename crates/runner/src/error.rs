// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner error taxonomy

use crate::session::SessionState;
use evl_core::{FileSetError, ValidationErrors};
use evl_identity::ResolveError;
use std::fmt;
use thiserror::Error;

/// How a step's program failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepFailure {
    Exit(i32),
    Signal(String),
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepFailure::Exit(code) => write!(f, "program exited with status {code}"),
            StepFailure::Signal(name) => write!(f, "program killed by signal {name}"),
        }
    }
}

/// Errors from runner operations
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Resolution(#[from] ResolveError),
    #[error("cannot {op} {target}: {message}")]
    Transport { op: &'static str, target: String, message: String },
    #[error("{0}")]
    StepFailed(StepFailure),
    #[error("{op} cancelled")]
    Cancelled { op: &'static str },
    #[error("unhandled runner {0:?}")]
    UnhandledVariant(String),
    #[error("invalid runner state {state}: cannot {op}")]
    InvalidState { op: &'static str, state: SessionState },
    #[error("invalid runner configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Files(#[from] FileSetError),
}

impl RunnerError {
    pub fn transport(op: &'static str, target: impl fmt::Display, message: impl fmt::Display) -> Self {
        RunnerError::Transport { op, target: target.to_string(), message: message.to_string() }
    }

    pub fn exit(code: i32) -> Self {
        RunnerError::StepFailed(StepFailure::Exit(code))
    }

    pub fn signal(name: impl Into<String>) -> Self {
        RunnerError::StepFailed(StepFailure::Signal(name.into()))
    }

    pub fn step_failure(&self) -> Option<&StepFailure> {
        match self {
            RunnerError::StepFailed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunnerError::Cancelled { .. })
    }
}

/// A failed cleanup action. Logged by the session, never returned to callers.
#[derive(Debug, Error)]
#[error("cannot {action} {target}: {message}")]
pub struct CleanupError {
    pub action: &'static str,
    pub target: String,
    pub message: String,
}

impl CleanupError {
    pub fn new(action: &'static str, target: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self { action, target: target.to_string(), message: message.to_string() }
    }
}
