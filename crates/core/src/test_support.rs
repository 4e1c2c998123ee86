// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::step::Step;

// ── Proptest strategies ─────────────────────────────────────────────────

pub mod strategies {
    use crate::step::{OnFailure, Step, StepAction};
    use proptest::prelude::*;

    pub fn arb_argument() -> impl Strategy<Value = String> {
        "[ -~\t\n]{0,16}"
    }

    pub fn arb_step_action() -> impl Strategy<Value = StepAction> {
        prop_oneof![
            ("[a-z]{1,8}", proptest::collection::vec(arb_argument(), 0..4))
                .prop_map(|(name, arguments)| StepAction::Command { name, arguments }),
            "[ -~\n]{0,64}".prop_map(StepAction::Code),
        ]
    }

    pub fn arb_step(position: usize) -> impl Strategy<Value = Step> {
        (arb_step_action(), any::<bool>()).prop_map(move |(action, continue_on_failure)| Step {
            position,
            label: None,
            action,
            on_failure: if continue_on_failure { OnFailure::Continue } else { OnFailure::Abort },
        })
    }
}

// ── Step factories ──────────────────────────────────────────────────────

/// Command steps numbered from 1, one per whitespace-separated command line.
pub fn command_steps(lines: &[&str]) -> Vec<Step> {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let mut words = line.split_whitespace().map(str::to_string);
            let name = words.next().unwrap_or_default();
            Step::command(i + 1, name, words.collect())
        })
        .collect()
}
