// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::env;
use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber. Logs go to `EVL_LOG_FILE` through a
/// non-blocking writer when set, to stderr otherwise; the returned guard
/// must live until exit so buffered lines are flushed.
pub fn setup_logging() -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(env::log_filter()).unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(path) = env::log_file() else {
        tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(std::io::stderr)).init();
        return Ok(None);
    };

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(std::path::Path::new("."));
    std::fs::create_dir_all(dir).with_context(|| format!("cannot create log directory {}", dir.display()))?;
    let file_name = path.file_name().with_context(|| format!("invalid log file {}", path.display()))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .init();
    Ok(Some(guard))
}
