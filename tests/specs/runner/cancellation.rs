// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancelling a job execution

use crate::prelude::*;
use evl_runner::{FakeRunner, LocalConfig, LocalRunner, RunnerCall};
use std::time::Duration;

#[tokio::test]
async fn cancelled_local_job_kills_step_and_cleans_up() {
    let dir = TempDir::new().unwrap();
    let steps = vec![
        Step::command(1, "/bin/sh", vec!["-c".into(), "exec sleep 30".into()]),
        Step::code(2, "echo unreachable"),
    ];
    let ctx = RunnerContext::new(JobExecutionId::from_string("E1"), "slow", &steps);
    let runner = LocalRunner::new(ctx, &LocalConfig { root_directory: dir.path().to_path_buf() }).unwrap();
    let mut session = RunnerSession::new(JobExecutionId::from_string("E1"), runner);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let mut captured = Captured::default();
    let err = session.run(&steps, &mut captured.output(), &cancel).await.unwrap_err();
    assert!(err.is_cancelled(), "{err}");
    assert!(!captured.stdout().contains("unreachable"));
    assert!(!dir.path().join("E1").exists());
}

#[tokio::test]
async fn cancellation_before_a_step_skips_it() {
    let steps = vec![Step::command(1, "true", vec![]), Step::command(2, "true", vec![])];
    let runner = FakeRunner::new();
    let mut session = RunnerSession::new(JobExecutionId::from_string("E2"), runner.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut captured = Captured::default();
    let err = session.run(&steps, &mut captured.output(), &cancel).await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(runner.calls(), vec![RunnerCall::Init, RunnerCall::Terminate]);
}
