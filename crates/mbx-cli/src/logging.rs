// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::config::Config;
use anyhow::{Context, Result, anyhow};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_ENV: &str = "MBX_LOG";

/// Routes `tracing` output into the log file. The terminal belongs to the TUI,
/// so nothing is ever written to stdout or stderr. Keep the guard alive until
/// exit so buffered lines are flushed.
pub fn init(config: &Config) -> Result<WorkerGuard> {
    let (directory, file_name) = split_log_path(&config.log_file()?)?;
    fs::create_dir_all(&directory).with_context(|| {
        format!(
            "create log directory {} -- set [log] file to a writable path",
            directory.display()
        )
    })?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter(config)?)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .context("install log subscriber")?;

    Ok(guard)
}

/// A bare file name lives in the current directory.
fn split_log_path(path: &Path) -> Result<(PathBuf, OsString)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("log file {} has no file name", path.display()))?;
    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    Ok((directory.to_path_buf(), file_name.to_owned()))
}

fn filter(config: &Config) -> Result<EnvFilter> {
    match env::var(LOG_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives.trim())
            .with_context(|| format!("{LOG_ENV} is not a valid log filter")),
        _ => EnvFilter::try_new(config.log_level())
            .context("[log] level is not a valid log filter"),
    }
}
