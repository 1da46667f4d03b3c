//! Log sinks
//!
//! `init` installs the global tracing subscriber once at startup:
//! - console output
//! - `<dir>/logger-YYYY-MM-DD.log` receiving everything the filter lets through
//! - `<dir>/error-YYYY-MM-DD.log` receiving error events only
//!
//! The file date is the process start date.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Subscriber;
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, registry::LookupSpan,
    util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::config::LogConfig;

/// Path of a dated log file, e.g. `logs/error-2024-01-31.log`
pub fn log_file_path(dir: &Path, kind: &str, date: NaiveDate) -> PathBuf {
    dir.join(format!("{}-{}.log", kind, date.format("%Y-%m-%d")))
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))
}

/// Filter from `RUST_LOG`, falling back to `userbase=<level>`
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("userbase={}", level)))
}

/// Plain-text file layers: everything to `info_file`, errors only to `error_file`
pub fn file_layers<S>(info_file: File, error_file: File) -> impl Layer<S> + Send + Sync
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(info_file))
        .and_then(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(error_file))
                .with_filter(LevelFilter::ERROR),
        )
}

/// Install the console and file sinks
pub fn init(config: &LogConfig) -> Result<()> {
    std::fs::create_dir_all(&config.dir)
        .with_context(|| format!("Failed to create log directory: {}", config.dir.display()))?;

    let today = Local::now().date_naive();
    let info_file = open_append(&log_file_path(&config.dir, "logger", today))?;
    let error_file = open_append(&log_file_path(&config.dir, "error", today))?;

    tracing_subscriber::registry()
        .with(build_filter(&config.level))
        .with(fmt::layer())
        .with(file_layers(info_file, error_file))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
