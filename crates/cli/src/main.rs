// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! evl - Eventline job runner CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;
mod env;
mod exit_error;
mod job;
mod logging;

use clap::{Parser, Subcommand};
use commands::{identity, run};
use exit_error::ExitError;

#[derive(Parser)]
#[command(name = "evl", version, about = "Eventline - run job steps on local, ssh and docker runners")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a job file
    Run(run::RunArgs),
    /// Identity management
    Identity(identity::IdentityArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let guard = match logging::setup_logging() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run(args) => run::handle(args).await,
        Commands::Identity(args) => identity::handle(args),
    };

    if let Err(e) = result {
        let code = match e.downcast_ref::<ExitError>() {
            Some(exit) => exit.code,
            None => 1,
        };
        eprintln!("error: {e:#}");
        drop(guard);
        std::process::exit(code);
    }
}
