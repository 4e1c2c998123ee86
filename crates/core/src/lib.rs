// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! evl-core: shared building blocks for the Eventline job runners

pub mod macros;

pub mod clock;
pub mod file_set;
pub mod id;
pub mod shell;
pub mod step;
pub mod validation;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use file_set::{FileSet, FileSetError, FileSetFile};
pub use id::{short, IdentityId, JobExecutionId};
pub use shell::{shell_escape, shell_join};
pub use step::{OnFailure, Step, StepAction, DEFAULT_CODE_HEADER, STEPS_DIR};
pub use validation::{FieldError, ValidationErrors, Validator};
