// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! evl-runner: execution backends for job steps
//!
//! A [`Runner`] stages a job execution's files on its backend, runs each
//! step there and cleans up. [`RunnerSession`] enforces the lifecycle.

pub mod config;
pub mod docker;
pub mod error;
#[cfg(any(test, feature = "test-support"))]
mod fake;
pub mod local;
pub mod runner;
pub mod session;
pub mod ssh;

pub use config::{RunnerConfigs, RunnerParameters};
pub use docker::{DockerConfig, DockerParameters, DockerRunner};
pub use error::{CleanupError, RunnerError, StepFailure};
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeOutcome, FakeRunner, RunnerCall};
pub use local::{LocalConfig, LocalRunner};
pub use runner::{Runner, RunnerContext, StepOutput, IDENTITIES_DIR};
pub use session::{RunnerSession, SessionState};
pub use ssh::{SshConfig, SshParameters, SshRunner};
