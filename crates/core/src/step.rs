// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Steps as seen by runners.
//!
//! Job definitions are parsed elsewhere; a runner only needs to know what to
//! execute for each step and whether a failure aborts the job.

use serde::{Deserialize, Serialize};

/// Header prepended to inline code that does not start with a shebang.
pub const DEFAULT_CODE_HEADER: &str = "#!/bin/sh\n\nset -eu\n\n";

/// Directory, relative to the execution root, holding staged step code.
pub const STEPS_DIR: &str = "steps";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// 1-based position in the job.
    #[serde(default)]
    pub position: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(flatten)]
    pub action: StepAction,
    #[serde(default)]
    pub on_failure: OnFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    /// Run a program found on the target's `PATH`.
    Command {
        name: String,
        #[serde(default)]
        arguments: Vec<String>,
    },
    /// Inline code staged as an executable file.
    Code(String),
    /// Script content staged as an executable file, invoked with arguments.
    Script {
        path: String,
        content: String,
        #[serde(default)]
        arguments: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnFailure {
    #[default]
    Abort,
    Continue,
}

crate::simple_display! {
    OnFailure {
        Abort => "abort",
        Continue => "continue",
    }
}

impl Step {
    pub fn command(position: usize, name: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            position,
            label: None,
            action: StepAction::Command { name: name.into(), arguments },
            on_failure: OnFailure::Abort,
        }
    }

    pub fn code(position: usize, source: impl Into<String>) -> Self {
        Self { position, label: None, action: StepAction::Code(source.into()), on_failure: OnFailure::Abort }
    }

    crate::setters! {
        set { on_failure: OnFailure }
        option { label: String }
    }

    pub fn aborts_on_failure(&self) -> bool {
        self.on_failure == OnFailure::Abort
    }

    /// Relative path of the staged file for code and script steps.
    pub fn staged_path(&self) -> Option<String> {
        match self.action {
            StepAction::Command { .. } => None,
            StepAction::Code(_) | StepAction::Script { .. } => {
                Some(format!("{STEPS_DIR}/{}", self.position))
            }
        }
    }

    /// Content to stage for code and script steps, with `code_header`
    /// prepended when the code has no shebang line.
    pub fn staged_content(&self, code_header: &str) -> Option<String> {
        let code = match &self.action {
            StepAction::Command { .. } => return None,
            StepAction::Code(code) => code,
            StepAction::Script { content, .. } => content,
        };
        if starts_with_shebang(code) {
            Some(code.clone())
        } else {
            Some(format!("{code_header}{code}"))
        }
    }

    /// Program and arguments for this step under the execution root `root`.
    pub fn command_line(&self, root: &str) -> (String, Vec<String>) {
        let staged = || format!("{}/{STEPS_DIR}/{}", root.trim_end_matches('/'), self.position);
        match &self.action {
            StepAction::Command { name, arguments } => (name.clone(), arguments.clone()),
            StepAction::Code(_) => (staged(), Vec::new()),
            StepAction::Script { arguments, .. } => (staged(), arguments.clone()),
        }
    }

    /// Single-string command line for remote shells, arguments escaped.
    pub fn command_string(&self, root: &str) -> String {
        let (name, args) = self.command_line(root);
        crate::shell::shell_join(&name, &args)
    }

    /// Human-readable step name for logs.
    pub fn display_name(&self) -> String {
        match (&self.label, &self.action) {
            (Some(label), _) => label.clone(),
            (None, StepAction::Command { name, .. }) => name.clone(),
            (None, StepAction::Code(_)) => format!("code step {}", self.position),
            (None, StepAction::Script { path, .. }) => path.clone(),
        }
    }
}

pub fn starts_with_shebang(code: &str) -> bool {
    code.starts_with("#!")
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
