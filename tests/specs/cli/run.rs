// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `evl run` specs on the local runner

use crate::prelude::*;

fn config(dir: &Path) -> String {
    let work = dir.join("work").display().to_string();
    write_file(dir, "evl.toml", &format!("[local]\nroot_directory = {work:?}\n"))
}

#[test]
fn run_streams_step_output() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path());
    let job = write_file(
        dir.path(),
        "job.toml",
        r#"
name = "hello"

[runner]
name = "local"

[environment]
GREETING = "hello"

[[steps]]
code = "echo \"$GREETING from $EVENTLINE_JOB_NAME\""

[[steps]]
command = { name = "/bin/sh", arguments = ["-c", "echo second"] }
"#,
    );

    cli().args(&["run", &job, "--config", &config]).passes().stdout_has("hello from hello\nsecond\n");
}

#[test]
fn failing_step_stops_the_job() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path());
    let job = write_file(
        dir.path(),
        "job.toml",
        r#"
name = "broken"

[runner]
name = "local"

[[steps]]
code = "exit 7"

[[steps]]
code = "echo unreachable"
"#,
    );

    cli()
        .args(&["run", &job, "--config", &config])
        .fails_with(1)
        .stdout_lacks("unreachable")
        .stderr_has("program exited with status 7");
}

#[test]
fn continue_on_failure_runs_next_step() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path());
    let job = write_file(
        dir.path(),
        "job.toml",
        r#"
name = "tolerant"

[runner]
name = "local"

[[steps]]
code = "exit 7"
on_failure = "continue"

[[steps]]
code = "echo reached"
"#,
    );

    cli().args(&["run", &job, "--config", &config]).passes().stdout_has("reached");
}

#[test]
fn unknown_runner_is_rejected() {
    let dir = TempDir::new().unwrap();
    let job = write_file(dir.path(), "job.toml", "name = \"j\"\n[runner]\nname = \"lambda\"\n[[steps]]\ncode = \"true\"\n");

    cli().args(&["run", &job]).fails_with(1).stderr_has("unhandled runner \"lambda\"");
}

#[test]
fn invalid_docker_parameters_are_rejected() {
    let dir = TempDir::new().unwrap();
    let job = write_file(
        dir.path(),
        "job.toml",
        "name = \"j\"\n[runner]\nname = \"docker\"\nparameters = { image = \"alpine\", cpu_limit = 0.01 }\n[[steps]]\ncode = \"true\"\n",
    );

    cli().args(&["run", &job]).fails_with(1).stderr_has("/cpu_limit");
}
