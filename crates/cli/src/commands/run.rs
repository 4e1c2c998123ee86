// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `evl run` - execute a job file on its runner

use crate::commands::identity::load_identities;
use crate::env;
use crate::exit_error::{ExitError, RUNNER_FAILED};
use crate::job::JobFile;
use anyhow::{bail, Context, Result};
use clap::Args;
use evl_core::JobExecutionId;
use evl_identity::Identity;
use evl_runner::{RunnerConfigs, RunnerContext, RunnerSession, StepOutput};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

#[derive(Args)]
pub struct RunArgs {
    /// Job file (TOML)
    pub job: PathBuf,

    /// Runner configuration file [default: $EVL_CONFIG or <state dir>/evl.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// JSON file holding the identities jobs may reference
    #[arg(long)]
    pub identities: Option<PathBuf>,
}

/// Explicit paths must exist; the default path is optional.
fn load_configs(explicit: Option<&Path>) -> Result<RunnerConfigs> {
    match explicit {
        Some(path) => Ok(RunnerConfigs::load(path)?),
        None => match env::config_path().filter(|p| p.exists()) {
            Some(path) => Ok(RunnerConfigs::load(&path)?),
            None => Ok(RunnerConfigs::default()),
        },
    }
}

fn find_identity(path: Option<&Path>, name: &str) -> Result<Identity> {
    let Some(path) = path else {
        bail!("job uses identity {name:?} but no identity file was given (--identities)");
    };
    let mut identity = load_identities(path)?
        .into_iter()
        .find(|i| i.name == name)
        .with_context(|| format!("unknown identity {name:?}"))?;
    identity.validate().with_context(|| format!("invalid identity {name:?}"))?;
    if !identity.is_ready() {
        bail!("identity {name:?} is {}", identity.status);
    }
    Ok(identity)
}

pub async fn handle(args: RunArgs) -> Result<()> {
    let configs = load_configs(args.config.as_deref())?;
    let job = JobFile::load(&args.job)?;
    let params = job.runner_parameters()?;

    let job_execution_id = JobExecutionId::new();
    let mut ctx = RunnerContext::new(job_execution_id.clone(), &job.name, &job.steps);
    for (name, value) in &job.environment {
        ctx = ctx.with_env(name, value);
    }
    if let Some(name) = &job.runner.identity {
        let identity = find_identity(args.identities.as_deref(), name)?;
        ctx = ctx.with_identity(identity).context("cannot stage identity files")?;
    }

    let runner = params.build(ctx, &configs).map_err(ExitError::from)?;
    let mut session = RunnerSession::new(job_execution_id.clone(), runner);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling job execution");
            interrupt.cancel();
        }
    });

    tracing::info!(%job_execution_id, job = %job.name, runner = %job.runner.name, "running job");
    let mut stdout = tokio::io::stdout();
    let mut stderr = tokio::io::stderr();
    let mut output = StepOutput::new(&mut stdout, &mut stderr);
    let result = session.run(&job.steps, &mut output, &cancel).await;
    cancel.cancel();
    drop(output);
    let _ = stdout.flush().await;
    let _ = stderr.flush().await;

    match result {
        Ok(()) => {
            tracing::info!(%job_execution_id, "job succeeded");
            Ok(())
        }
        Err(e) => {
            let err = ExitError::from(e);
            tracing::error!(%job_execution_id, code = err.code, error = %err.message, "job failed");
            Err(err.into())
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
