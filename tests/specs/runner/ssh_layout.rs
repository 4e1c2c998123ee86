// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote workspace layout of the ssh runner

use crate::prelude::*;
use evl_identity::{GenericPassword, Identity, IdentityData};
use evl_runner::ssh::{FakeExec, FakeSsh, SshCall, SshConfig, SshParameters, SshRunner};
use evl_runner::SessionState;

fn alice() -> Identity {
    Identity::new(
        "alice-login",
        IdentityData::GenericPassword(GenericPassword { login: "alice".into(), password: "pw".into() }),
    )
}

#[tokio::test]
async fn job_runs_in_user_scoped_directory_and_cleans_shared_root() {
    let steps = vec![Step::code(1, "make build"), Step::command(2, "ls", vec!["-l".into()])];
    let ctx = RunnerContext::new(JobExecutionId::from_string("E1"), "build", &steps).with_identity(alice()).unwrap();
    let ssh = FakeSsh::new();
    ssh.add_dir("/tmp", 0o1777);
    ssh.push_exec(FakeExec::success("built\n"));
    ssh.push_exec(FakeExec::success("listing\n"));
    let config = SshConfig { root_directory: "/tmp/x".into(), ..Default::default() };
    let runner =
        SshRunner::new(ctx, config, SshParameters::new("host.example.com").user("alice"), ssh.clone()).unwrap();
    let mut session = RunnerSession::new(JobExecutionId::from_string("E1"), runner);

    let mut captured = Captured::default();
    session.run(&steps, &mut captured.output(), &CancellationToken::new()).await.unwrap();

    assert_eq!(session.state(), SessionState::Terminated);
    assert_eq!(captured.stdout(), "built\nlisting\n");

    let calls = ssh.calls();
    let root_creations = calls.iter().filter(|c| **c == SshCall::MkdirAll { path: "/tmp/x".into() }).count();
    assert_eq!(root_creations, 1);
    assert!(calls.contains(&SshCall::Chmod { path: "/tmp/x".into(), mode: 0o777 }));
    assert!(calls.contains(&SshCall::WriteFile { path: "/tmp/x/alice/E1/steps/1".into() }));
    let commands: Vec<String> = calls
        .iter()
        .filter_map(|c| match c {
            SshCall::Exec { command, .. } => Some(command.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(commands, vec!["/tmp/x/alice/E1/steps/1", "ls -l"]);

    assert_eq!(ssh.paths(), vec!["/tmp", "/tmp/x"]);
}
