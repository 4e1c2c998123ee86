// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::error::StepFailure;
use evl_core::JobExecutionId;
use evl_identity::{ApiKey, GenericPassword, Identity, IdentityData};
use std::collections::BTreeMap;
use yare::parameterized;

fn login() -> Identity {
    Identity::new(
        "login",
        IdentityData::GenericPassword(GenericPassword { login: "alice".into(), password: "hunter2".into() }),
    )
}

fn steps() -> Vec<Step> {
    vec![Step::code(1, "echo hi"), Step::command(2, "echo", vec!["hello world".into()])]
}

fn runner(ssh: &FakeSsh) -> SshRunner<FakeSsh> {
    let ctx = RunnerContext::new(JobExecutionId::from_string("E1"), "deploy", &steps())
        .with_identity(login())
        .unwrap();
    let config = SshConfig { root_directory: "/tmp/x".into(), ..Default::default() };
    SshRunner::new(ctx, config, SshParameters::new("build.example.com").user("alice"), ssh.clone()).unwrap()
}

fn output_buffers() -> (Vec<u8>, Vec<u8>) {
    (Vec::new(), Vec::new())
}

fn count(ssh: &FakeSsh, call: &SshCall) -> usize {
    ssh.calls().iter().filter(|c| *c == call).count()
}

#[tokio::test]
async fn stages_files_under_user_and_execution_id() {
    let ssh = FakeSsh::new();
    let mut runner = runner(&ssh);
    assert_eq!(runner.dir_path(), "/tmp/x/alice/E1");

    runner.init(&CancellationToken::new()).await.unwrap();

    assert_eq!(ssh.mode("/tmp/x"), Some(0o777));
    assert_eq!(ssh.mode("/tmp/x/alice/E1"), Some(0o700));
    assert_eq!(ssh.mode("/tmp/x/alice/E1/steps"), Some(0o700));
    assert_eq!(ssh.mode("/tmp/x/alice/E1/identities/login"), Some(0o700));
    assert_eq!(ssh.mode("/tmp/x/alice/E1/steps/1"), Some(0o700));
    assert_eq!(ssh.mode("/tmp/x/alice/E1/identities/login/password"), Some(0o600));
    assert_eq!(ssh.content("/tmp/x/alice/E1/identities/login/password").as_deref(), Some("hunter2"));
    assert!(ssh.content("/tmp/x/alice/E1/steps/1").unwrap().ends_with("echo hi"));

    assert_eq!(
        ssh.calls()[..2],
        [
            SshCall::Connect { address: "build.example.com:22".into(), user: "alice".into(), auth: "password" },
            SshCall::OpenSftp,
        ]
    );
}

#[tokio::test]
async fn shared_root_is_created_once_and_chmod_only_when_needed() {
    let ssh = FakeSsh::new();
    let mut runner = runner(&ssh);
    runner.init(&CancellationToken::new()).await.unwrap();

    assert_eq!(count(&ssh, &SshCall::MkdirAll { path: "/tmp/x".into() }), 1);
    assert_eq!(count(&ssh, &SshCall::Chmod { path: "/tmp/x".into(), mode: 0o777 }), 1);
}

#[parameterized(
    missing = { None, true },
    wrong_mode = { Some(0o755), true },
    right_mode = { Some(0o777), false },
)]
fn create_directory_chmods_on_mismatch(existing: Option<u32>, chmod: bool) {
    tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
        let mut ssh = FakeSsh::new();
        ssh.add_dir("/tmp", 0o1777);
        if let Some(mode) = existing {
            ssh.add_dir("/tmp/x", mode);
        }

        create_directory(&mut ssh, "/tmp/x", 0o777).await.unwrap();

        assert_eq!(count(&ssh, &SshCall::MkdirAll { path: "/tmp/x".into() }), 1);
        assert_eq!(count(&ssh, &SshCall::Chmod { path: "/tmp/x".into(), mode: 0o777 }), usize::from(chmod));
        assert_eq!(ssh.mode("/tmp/x"), Some(0o777));
    });
}

#[tokio::test]
async fn terminate_empties_shared_root_but_keeps_it() {
    let ssh = FakeSsh::new();
    ssh.add_dir("/tmp", 0o1777);
    ssh.add_dir("/tmp/x", 0o777);
    ssh.add_dir("/tmp/x/bob", 0o755);
    ssh.add_file("/tmp/x/bob/leftover", "data");
    let mut runner = runner(&ssh);
    runner.init(&CancellationToken::new()).await.unwrap();

    let errors = runner.terminate().await;

    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(ssh.paths(), vec!["/tmp".to_string(), "/tmp/x".to_string()]);
    assert!(!ssh.calls().contains(&SshCall::RemoveDir { path: "/tmp/x".into() }));

    let calls = ssh.calls();
    let tail = &calls[calls.len() - 2..];
    assert_eq!(tail, [SshCall::CloseSftp, SshCall::Close]);
}

#[tokio::test]
async fn terminate_twice_is_harmless() {
    let ssh = FakeSsh::new();
    let mut runner = runner(&ssh);
    runner.init(&CancellationToken::new()).await.unwrap();
    runner.terminate().await;
    let calls = ssh.calls().len();

    assert!(runner.terminate().await.is_empty());
    assert_eq!(ssh.calls().len(), calls);
}

#[tokio::test]
async fn step_runs_escaped_command_with_environment() {
    let ssh = FakeSsh::new();
    ssh.push_exec(FakeExec::success(""));
    ssh.push_exec(FakeExec::Exit { status: 0, stdout: "hello world\n".into(), stderr: "warn\n".into() });
    let mut runner = runner(&ssh);
    runner.init(&CancellationToken::new()).await.unwrap();

    let (mut stdout, mut stderr) = output_buffers();
    let mut output = StepOutput::new(&mut stdout, &mut stderr);
    let cancel = CancellationToken::new();
    for step in steps() {
        runner.execute_step(&step, &mut output, &cancel).await.unwrap();
    }

    let execs: Vec<(String, BTreeMap<String, String>)> = ssh
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            SshCall::Exec { command, env } => Some((command, env)),
            _ => None,
        })
        .collect();
    assert_eq!(execs[0].0, "/tmp/x/alice/E1/steps/1");
    assert_eq!(execs[1].0, "echo hello\\ world");
    assert_eq!(execs[1].1["EVENTLINE_DIR"], "/tmp/x/alice/E1");
    assert_eq!(execs[1].1["EVENTLINE_JOB_EXECUTION_ID"], "E1");
    assert_eq!(stdout, b"hello world\n");
    assert_eq!(stderr, b"warn\n");
}

#[parameterized(
    exit_7 = { FakeExec::status(7), StepFailure::Exit(7) },
    killed = { FakeExec::Signal("KILL".into()), StepFailure::Signal("KILL".into()) },
)]
fn program_failures_are_step_failures(exec: FakeExec, expected: StepFailure) {
    tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
        let ssh = FakeSsh::new();
        ssh.push_exec(exec);
        let mut runner = runner(&ssh);
        runner.init(&CancellationToken::new()).await.unwrap();

        let (mut stdout, mut stderr) = output_buffers();
        let mut output = StepOutput::new(&mut stdout, &mut stderr);
        let err = runner.execute_step(&steps()[1], &mut output, &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.step_failure(), Some(&expected));
    });
}

#[tokio::test]
async fn cancellation_kills_the_program() {
    let ssh = FakeSsh::new();
    ssh.push_exec(FakeExec::Hang);
    let mut runner = runner(&ssh);
    runner.init(&CancellationToken::new()).await.unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        trigger.cancel();
    });
    let (mut stdout, mut stderr) = output_buffers();
    let mut output = StepOutput::new(&mut stdout, &mut stderr);
    let err = runner.execute_step(&steps()[1], &mut output, &cancel).await.unwrap_err();

    assert!(err.is_cancelled());
    assert!(ssh.calls().contains(&SshCall::Kill));
}

#[tokio::test]
async fn cancellation_interrupts_stalled_sftp_start() {
    let ssh = FakeSsh::new();
    ssh.stall_sftp();
    let mut runner = runner(&ssh);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        trigger.cancel();
    });
    let err = runner.init(&cancel).await.unwrap_err();
    assert!(matches!(err, RunnerError::Cancelled { op: "open sftp" }), "{err}");

    assert!(runner.terminate().await.is_empty());
    assert!(ssh.calls().contains(&SshCall::Close));
}

#[tokio::test]
async fn init_requires_an_identity() {
    let ssh = FakeSsh::new();
    let ctx = RunnerContext::new(JobExecutionId::from_string("E1"), "deploy", &steps());
    let mut runner = SshRunner::new(ctx, SshConfig::default(), SshParameters::new("h"), ssh.clone()).unwrap();

    let err = runner.init(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, RunnerError::Config(_)));
    assert!(ssh.calls().is_empty());
}

#[tokio::test]
async fn init_rejects_identity_unusable_for_ssh() {
    let ssh = FakeSsh::new();
    let identity = Identity::new("key", IdentityData::GenericApiKey(ApiKey { key: "k".into() }));
    let ctx = RunnerContext::new(JobExecutionId::from_string("E1"), "deploy", &steps()).with_identity(identity).unwrap();
    let mut runner = SshRunner::new(ctx, SshConfig::default(), SshParameters::new("h"), ssh.clone()).unwrap();

    let err = runner.init(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, RunnerError::Resolution(_)));
    assert!(ssh.calls().is_empty());
}

#[tokio::test]
async fn failed_connection_leaves_nothing_to_clean() {
    let ssh = FakeSsh::new();
    ssh.fail_connect("connection refused");
    let mut runner = runner(&ssh);

    let err = runner.init(&CancellationToken::new()).await.unwrap_err();
    assert_eq!(err.to_string(), "cannot connect to build.example.com:22: connection refused");
    assert!(runner.terminate().await.is_empty());
    assert_eq!(ssh.calls().len(), 1);
}

#[test]
fn invalid_parameters_are_rejected_up_front() {
    let ctx = RunnerContext::new(JobExecutionId::new(), "deploy", &steps());
    let result = SshRunner::new(ctx, SshConfig::default(), SshParameters::new("h").port(0), FakeSsh::new());
    assert!(matches!(result, Err(RunnerError::Validation(_))));
}
