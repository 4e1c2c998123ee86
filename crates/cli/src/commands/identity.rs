// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `evl identity` - inspect identity files

use crate::exit_error::ExitError;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use evl_identity::Identity;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct IdentityArgs {
    #[command(subcommand)]
    pub command: IdentityCommand,
}

#[derive(Subcommand)]
pub enum IdentityCommand {
    /// Validate an identity file and print each identity with secrets masked
    Check {
        /// JSON file holding an array of identities
        file: PathBuf,
    },
}

pub fn handle(args: IdentityArgs) -> Result<()> {
    match args.command {
        IdentityCommand::Check { file } => {
            let identities = load_identities(&file)?;
            let mut out = String::new();
            let mut invalid = 0;
            for mut identity in identities {
                match identity.validate() {
                    Ok(()) => out.push_str(&describe(&identity)),
                    Err(errors) => {
                        invalid += 1;
                        let _ = writeln!(out, "{} ({}): invalid", identity.name, identity.identity_type());
                        for error in errors.iter() {
                            let _ = writeln!(out, "  {}: {}", error.pointer, error.message);
                        }
                    }
                }
            }
            print!("{out}");
            if invalid > 0 {
                return Err(ExitError::new(1, format!("{invalid} invalid identities")).into());
            }
            Ok(())
        }
    }
}

pub fn load_identities(path: &Path) -> Result<Vec<Identity>> {
    let content = std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("cannot decode identities from {}", path.display()))
}

/// Header line then one line per schema field, secrets masked.
pub fn describe(identity: &Identity) -> String {
    let mut out = format!("{} ({}): {}\n", identity.name, identity.identity_type(), identity.status);
    for entry in identity.data.schema().redacted().entries() {
        if entry.internal {
            continue;
        }
        let value = entry.display_value();
        let _ = writeln!(out, "  {}: {}", entry.label, value.trim_end().replace('\n', "\n    "));
    }
    out
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
