//! Tracing setup shared by the service and the developer binaries.
//!
//! Events go to stdout and, when `[logging] file` is set, to one log file per
//! launch under `<app dir>/logs`. Older launch files beyond `max_files` are
//! removed on startup.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::app_dirs::{self, AppDirError};
use crate::config::LoggingSettings;

const LOG_FILE_PREFIX: &str = "churnlens_";
const LOG_FILE_SUFFIX: &str = ".log";

/// Keeps the non-blocking file writer flushing until process exit.
static FILE_GUARD: OnceLock<Option<WorkerGuard>> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Log directory unavailable: {0}")]
    Dir(#[from] AppDirError),
    #[error("Failed to prune old logs in {path}: {source}")]
    Prune {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to name log file: {0}")]
    FileName(#[from] time::error::Format),
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Install the global subscriber described by `settings`.
///
/// Only the first call has an effect. Callers report the error and carry on
/// without logs.
pub fn init(settings: &LoggingSettings) -> Result<(), LoggingError> {
    if FILE_GUARD.get().is_some() {
        return Ok(());
    }
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let timer = OffsetTime::new(offset, Rfc3339);

    let mut guard = None;
    let mut log_path = None;
    let file_layer = if settings.file {
        let dir = app_dirs::logs_dir()?;
        // The new file counts toward the limit.
        prune_old_logs(&dir, settings.max_files.saturating_sub(1))?;
        let name = log_file_name(OffsetDateTime::now_utc().to_offset(offset))?;
        let appender = tracing_appender::rolling::RollingFileAppender::builder()
            .rotation(tracing_appender::rolling::Rotation::NEVER)
            .filename_prefix(name.as_str())
            .build(&dir)
            .map_err(|err| LoggingError::Open {
                path: dir.join(&name),
                source: std::io::Error::other(err),
            })?;
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        guard = Some(file_guard);
        log_path = Some(dir.join(name));
        Some(
            fmt::layer()
                .with_ansi(false)
                .with_timer(timer.clone())
                .with_writer(writer),
        )
    } else {
        None
    };

    let subscriber = Registry::default()
        .with(env_filter(&settings.level))
        .with(fmt::layer().with_timer(timer))
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber)?;
    let _ = FILE_GUARD.set(guard);

    match log_path {
        Some(path) => tracing::info!("Logging to stdout and {}", path.display()),
        None => tracing::info!("Logging to stdout only"),
    }
    Ok(())
}

/// `RUST_LOG` first, then the configured level, then `info`.
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Sortable per-launch name, e.g. `churnlens_20231114T221320.log`.
fn log_file_name(now: OffsetDateTime) -> Result<String, time::error::Format> {
    let stamp = now.format(format_description!(
        "[year][month][day]T[hour][minute][second]"
    ))?;
    Ok(format!("{LOG_FILE_PREFIX}{stamp}{LOG_FILE_SUFFIX}"))
}

/// Delete the oldest launch logs so at most `keep` remain.
///
/// Names sort chronologically, so age is read from the name. Files that are
/// not launch logs are left alone.
fn prune_old_logs(dir: &Path, keep: usize) -> Result<(), LoggingError> {
    let prune_err = |source| LoggingError::Prune {
        path: dir.to_path_buf(),
        source,
    };
    let mut logs: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(prune_err)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path.file_name().and_then(|name| name.to_str()).is_some_and(|name| {
                    name.starts_with(LOG_FILE_PREFIX) && name.ends_with(LOG_FILE_SUFFIX)
                })
        })
        .collect();
    logs.sort();
    let excess = logs.len().saturating_sub(keep);
    for path in logs.into_iter().take(excess) {
        std::fs::remove_file(&path).map_err(prune_err)?;
    }
    Ok(())
}
