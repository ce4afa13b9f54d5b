//! Tracing configuration and log routing.
//!
//! Events go to stderr in compact form, leaving stdout to the JSON the CLI prints, and to a
//! log file. `SOP_INDEXER_LOG_FILE` picks the file; without it the indexer writes
//! `logs/sop-indexer.log`. Every event of a document run carries the `document_run` span, so
//! the file can be grepped by run id.
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE_VAR: &str = "SOP_INDEXER_LOG_FILE";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_NAME: &str = "sop-indexer.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Configure tracing subscribers for stderr and the run log file.
///
/// `RUST_LOG` wins over `default_directive` when set. The file layer is skipped, with a note
/// on stderr, when the log file cannot be opened.
pub fn init_tracing(default_directive: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer);

    match open_log_writer(&log_file_path()) {
        Some(writer) => {
            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false);
            registry.with(file_layer).init();
        }
        None => registry.init(),
    }
}

/// Path of the log file for this process.
pub fn log_file_path() -> PathBuf {
    resolve_log_path(std::env::var(LOG_FILE_VAR).ok().as_deref())
}

fn resolve_log_path(configured: Option<&str>) -> PathBuf {
    match configured.map(str::trim).filter(|value| !value.is_empty()) {
        Some(path) => PathBuf::from(path),
        None => Path::new(DEFAULT_LOG_DIR).join(DEFAULT_LOG_NAME),
    }
}

/// Append-mode non-blocking writer for `path`, creating its directory first.
fn open_log_writer(path: &Path) -> Option<NonBlocking> {
    let directory = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let Some(file_name) = path.file_name() else {
        eprintln!("Log path {} has no file name", path.display());
        return None;
    };
    if let Err(err) = std::fs::create_dir_all(directory) {
        eprintln!(
            "Failed to create log directory {}: {err}",
            directory.display()
        );
        return None;
    }
    let appender = match RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(directory)
    {
        Ok(appender) => appender,
        Err(err) => {
            eprintln!("Failed to open log file {}: {err}", path.display());
            return None;
        }
    };
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Some(non_blocking)
}
