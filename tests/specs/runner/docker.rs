// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container runner with registry authentication

use crate::prelude::*;
use evl_identity::{Identity, IdentityData, UsernameToken};
use evl_runner::docker::{EngineCall, FakeContainerExec, FakeEngine};
use evl_runner::{DockerParameters, DockerRunner};

#[tokio::test]
async fn registry_token_authenticates_pull_and_container_is_removed() {
    let steps = vec![Step::command(1, "cargo", vec!["test".into()])];
    let identity = Identity::new(
        "ghcr",
        IdentityData::GithubToken(UsernameToken { username: "u".into(), token: "t".into() }),
    );
    let ctx = RunnerContext::new(JobExecutionId::from_string("E1"), "test", &steps).with_identity(identity).unwrap();
    let engine = FakeEngine::new();
    engine.push_exec(FakeContainerExec::success("test result: ok\n"));
    let runner = DockerRunner::new(ctx, DockerParameters::new("ghcr.io/acme/ci:1"), engine.clone()).unwrap();
    let mut session = RunnerSession::new(JobExecutionId::from_string("E1"), runner);

    let mut captured = Captured::default();
    session.run(&steps, &mut captured.output(), &CancellationToken::new()).await.unwrap();

    let calls = engine.calls();
    assert_eq!(
        calls[0],
        EngineCall::PullImage { image: "ghcr.io/acme/ci:1".into(), username: Some("u".into()), password: Some("t".into()) }
    );
    assert!(matches!(calls.last(), Some(EngineCall::RemoveContainer { .. })));
    assert_eq!(captured.stdout(), "test result: ok\n");
}

#[tokio::test]
async fn failed_exec_still_removes_container() {
    let steps = vec![Step::command(1, "false", vec![])];
    let ctx = RunnerContext::new(JobExecutionId::from_string("E2"), "test", &steps);
    let engine = FakeEngine::new();
    engine.push_exec(FakeContainerExec::code(1));
    let runner = DockerRunner::new(ctx, DockerParameters::new("alpine"), engine.clone()).unwrap();
    let mut session = RunnerSession::new(JobExecutionId::from_string("E2"), runner);

    let mut captured = Captured::default();
    let err = session.run(&steps, &mut captured.output(), &CancellationToken::new()).await.unwrap_err();
    assert_eq!(err.step_failure(), Some(&StepFailure::Exit(1)));
    assert!(matches!(engine.calls().last(), Some(EngineCall::RemoveContainer { .. })));
}
