// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn clear() {
    for var in ["EVL_STATE_DIR", "XDG_STATE_HOME", "EVL_CONFIG", "EVL_LOG", "EVL_LOG_FILE"] {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn state_dir_precedence() {
    clear();
    std::env::set_var("HOME", "/home/alice");
    assert_eq!(state_dir(), Some(PathBuf::from("/home/alice/.local/state/evl")));

    std::env::set_var("XDG_STATE_HOME", "/xdg");
    assert_eq!(state_dir(), Some(PathBuf::from("/xdg/evl")));

    std::env::set_var("EVL_STATE_DIR", "/state");
    assert_eq!(state_dir(), Some(PathBuf::from("/state")));
    clear();
}

#[test]
#[serial]
fn config_path_defaults_to_state_dir() {
    clear();
    std::env::set_var("EVL_STATE_DIR", "/state");
    assert_eq!(config_path(), Some(PathBuf::from("/state/evl.toml")));

    std::env::set_var("EVL_CONFIG", "/etc/evl.toml");
    assert_eq!(config_path(), Some(PathBuf::from("/etc/evl.toml")));
    clear();
}

#[test]
#[serial]
fn log_settings() {
    clear();
    assert_eq!(log_filter(), "info");
    assert_eq!(log_file(), None);

    std::env::set_var("EVL_LOG", "evl_runner=debug");
    std::env::set_var("EVL_LOG_FILE", "/tmp/evl.log");
    assert_eq!(log_filter(), "evl_runner=debug");
    assert_eq!(log_file(), Some(PathBuf::from("/tmp/evl.log")));
    clear();
}
