// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step outcomes map to success or a step failure

use crate::prelude::*;
use evl_identity::{GenericPassword, Identity, IdentityData};
use evl_runner::ssh::{FakeExec, FakeSsh, SshConfig, SshParameters, SshRunner};
use evl_runner::{LocalConfig, LocalRunner};

async fn run_on_ssh(exec: FakeExec) -> Result<(), RunnerError> {
    let steps = vec![Step::command(1, "deploy", vec![])];
    let identity =
        Identity::new("login", IdentityData::GenericPassword(GenericPassword { login: "ci".into(), password: "pw".into() }));
    let ctx = RunnerContext::new(JobExecutionId::from_string("E1"), "deploy", &steps).with_identity(identity).unwrap();
    let ssh = FakeSsh::new();
    ssh.push_exec(exec);
    let runner = SshRunner::new(ctx, SshConfig::default(), SshParameters::new("h").user("ci"), ssh).unwrap();
    let mut session = RunnerSession::new(JobExecutionId::from_string("E1"), runner);
    let mut captured = Captured::default();
    session.run(&steps, &mut captured.output(), &CancellationToken::new()).await
}

async fn run_locally(script: &str) -> Result<(), RunnerError> {
    let dir = TempDir::new().unwrap();
    let steps = vec![Step::code(1, script)];
    let ctx = RunnerContext::new(JobExecutionId::from_string("E1"), "local", &steps);
    let runner = LocalRunner::new(ctx, &LocalConfig { root_directory: dir.path().to_path_buf() }).unwrap();
    let mut session = RunnerSession::new(JobExecutionId::from_string("E1"), runner);
    let mut captured = Captured::default();
    session.run(&steps, &mut captured.output(), &CancellationToken::new()).await
}

#[tokio::test]
async fn remote_exit_zero_succeeds() {
    run_on_ssh(FakeExec::status(0)).await.unwrap();
}

#[tokio::test]
async fn remote_exit_seven_is_a_step_failure() {
    let err = run_on_ssh(FakeExec::status(7)).await.unwrap_err();
    assert_eq!(err.step_failure(), Some(&StepFailure::Exit(7)));
    assert_eq!(err.to_string(), "program exited with status 7");
}

#[tokio::test]
async fn remote_signal_is_a_step_failure() {
    let err = run_on_ssh(FakeExec::Signal("TERM".into())).await.unwrap_err();
    assert_eq!(err.step_failure(), Some(&StepFailure::Signal("TERM".into())));
    assert_eq!(err.to_string(), "program killed by signal TERM");
}

#[tokio::test]
async fn local_outcomes_match_remote_ones() {
    run_locally("exit 0").await.unwrap();
    assert_eq!(run_locally("exit 7").await.unwrap_err().step_failure(), Some(&StepFailure::Exit(7)));
    assert_eq!(
        run_locally("kill -TERM $$").await.unwrap_err().step_failure(),
        Some(&StepFailure::Signal("TERM".into()))
    );
}
