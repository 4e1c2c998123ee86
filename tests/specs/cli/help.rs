// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI help output specs

use crate::prelude::*;

#[test]
fn evl_help_lists_commands() {
    cli().args(&["--help"]).passes().stdout_has("Usage:").stdout_has("run").stdout_has("identity");
}

#[test]
fn evl_run_help_shows_options() {
    cli().args(&["run", "--help"]).passes().stdout_has("--config").stdout_has("--identities");
}

#[test]
fn evl_identity_help_shows_subcommands() {
    cli().args(&["identity", "--help"]).passes().stdout_has("check");
}

#[test]
fn evl_version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.2");
}
