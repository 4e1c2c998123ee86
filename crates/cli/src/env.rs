// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI.

use std::path::PathBuf;

/// Resolve state directory: EVL_STATE_DIR > XDG_STATE_HOME/evl > ~/.local/state/evl
pub fn state_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("EVL_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("evl"));
    }
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".local/state/evl"))
}

/// Runner configuration file: EVL_CONFIG > <state dir>/evl.toml
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("EVL_CONFIG") {
        return Some(PathBuf::from(path));
    }
    state_dir().map(|dir| dir.join("evl.toml"))
}

/// Log filter directives (default `info`).
pub fn log_filter() -> String {
    std::env::var("EVL_LOG").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| "info".to_string())
}

/// Log file; when unset logs go to stderr.
pub fn log_file() -> Option<PathBuf> {
    std::env::var("EVL_LOG_FILE").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
