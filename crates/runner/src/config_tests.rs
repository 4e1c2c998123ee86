// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::docker::DEFAULT_URI;
use crate::ssh::DEFAULT_ROOT_DIRECTORY;
use serde_json::json;
use std::path::PathBuf;
use yare::parameterized;

#[test]
fn empty_configuration_uses_defaults() {
    let configs = RunnerConfigs::from_toml("").unwrap();
    assert_eq!(configs.ssh.root_directory, DEFAULT_ROOT_DIRECTORY);
    assert_eq!(configs.docker.uri, DEFAULT_URI);
    assert_eq!(configs.local.root_directory, PathBuf::from("tmp/local-execution"));
}

#[test]
fn configuration_sections_are_read() {
    let configs = RunnerConfigs::from_toml(
        r#"
        [local]
        root_directory = "/var/lib/evl"

        [ssh]
        root_directory = "/srv/jobs"
        mount_points = ["/data"]

        [docker]
        uri = "tcp://docker.internal:2376"
        ca_certificate_path = "/etc/evl/ca.pem"
        certificate_path = "/etc/evl/cert.pem"
        private_key_path = "/etc/evl/key.pem"
        "#,
    )
    .unwrap();
    assert_eq!(configs.local.root_directory, PathBuf::from("/var/lib/evl"));
    assert_eq!(configs.ssh.root_directory, "/srv/jobs");
    assert_eq!(configs.ssh.mount_points, vec!["/data"]);
    assert_eq!(configs.docker.uri, "tcp://docker.internal:2376");
    assert_eq!(configs.docker.private_key_path, Some(PathBuf::from("/etc/evl/key.pem")));
}

#[test]
fn invalid_sections_are_all_reported() {
    let err = RunnerConfigs::from_toml(
        r#"
        [ssh]
        root_directory = "relative"

        [docker]
        uri = "http://docker"
        "#,
    )
    .unwrap_err();
    let RunnerError::Validation(errors) = err else { panic!("unexpected error {err}") };
    assert_eq!(errors.pointers(), vec!["/ssh/root_directory", "/docker/uri"]);
}

#[test]
fn malformed_toml_is_a_config_error() {
    assert!(matches!(RunnerConfigs::from_toml("[ssh"), Err(RunnerError::Config(_))));
}

#[test]
fn load_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("evl.toml");
    std::fs::write(&path, "[ssh]\nroot_directory = \"/srv\"\n").unwrap();
    assert_eq!(RunnerConfigs::load(&path).unwrap().ssh.root_directory, "/srv");
    assert!(matches!(RunnerConfigs::load(&dir.path().join("missing.toml")), Err(RunnerError::Config(_))));
}

#[test]
fn ssh_parameters_get_defaults() {
    let params = RunnerParameters::decode("ssh", json!({"host": "build.example.com"})).unwrap();
    let RunnerParameters::Ssh(ssh) = &params else { panic!("not ssh") };
    assert_eq!(ssh.port, 22);
    assert_eq!(ssh.user, "root");
    assert_eq!(params.name(), "ssh");
}

#[test]
fn docker_parameters_are_validated() {
    let err = RunnerParameters::decode("docker", json!({"image": "alpine", "memory_limit": 1})).unwrap_err();
    let RunnerError::Validation(errors) = err else { panic!("unexpected error {err}") };
    assert_eq!(errors.pointers(), vec!["/memory_limit"]);
}

#[test]
fn malformed_parameters_are_a_config_error() {
    let err = RunnerParameters::decode("docker", json!({"cpu_limit": 1})).unwrap_err();
    assert!(matches!(err, RunnerError::Config(_)), "{err}");
}

#[test]
fn unknown_runner_is_unhandled() {
    let err = RunnerParameters::decode("kubernetes", json!({})).unwrap_err();
    assert!(matches!(&err, RunnerError::UnhandledVariant(name) if name == "kubernetes"));
    assert_eq!(err.to_string(), "unhandled runner \"kubernetes\"");
}

#[parameterized(
    local = { "local" },
    ssh = { "ssh" },
    docker = { "docker" },
)]
fn names_round_trip(name: &str) {
    let value = match name {
        "ssh" => json!({"host": "h"}),
        "docker" => json!({"image": "alpine"}),
        _ => json!({}),
    };
    assert_eq!(RunnerParameters::decode(name, value).unwrap().name(), name);
    assert!(RunnerParameters::NAMES.contains(&name));
}

#[test]
fn local_parameters_build_a_local_runner() {
    let dir = tempfile::tempdir().unwrap();
    let configs = RunnerConfigs { local: LocalConfig { root_directory: dir.path().to_path_buf() }, ..Default::default() };
    let ctx = RunnerContext::new(evl_core::JobExecutionId::from_string("E9"), "j", &[]);
    let runner = RunnerParameters::Local.build(ctx, &configs).unwrap();
    assert_eq!(runner.name(), "local");
    assert_eq!(runner.dir_path(), dir.path().join("E9").to_string_lossy());
}
