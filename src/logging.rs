//! Tracing configuration and log routing.
//!
//! Pipeline decisions (scan classification, OCR page failures, summarizer fallbacks) are
//! logged to stdout with a compact formatter and mirrored to a file. When `DOCSIFT_LOG_FILE`
//! is set, logs are appended to that path; otherwise they go to `logs/docsift.log`. The file
//! layer uses a non‑blocking writer so OCR workers never wait on disk.
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_FILE: &str = "docsift.log";

/// Where the file layer writes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LogTarget {
    /// Explicit path from `DOCSIFT_LOG_FILE`, opened in append mode.
    Explicit(PathBuf),
    /// `logs/docsift.log` relative to the working directory.
    Default,
}

impl LogTarget {
    fn resolve(explicit: Option<String>) -> Self {
        match explicit.filter(|value| !value.trim().is_empty()) {
            Some(path) => Self::Explicit(PathBuf::from(path)),
            None => Self::Default,
        }
    }
}

/// Configure tracing subscribers for stdout and file logging.
///
/// - Respects `RUST_LOG` for filtering (defaults to `info`).
/// - Installs a compact stdout layer and, when the target is writable, a file layer.
/// - Keeps the non‑blocking writer guard alive for the process lifetime.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);

    let target = LogTarget::resolve(std::env::var("DOCSIFT_LOG_FILE").ok());
    match file_writer(&target) {
        Some(writer) => {
            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .compact();
            registry.with(file_layer).init();
        }
        None => registry.init(),
    }
}

fn file_writer(target: &LogTarget) -> Option<NonBlocking> {
    let (non_blocking, guard) = match target {
        LogTarget::Explicit(path) => tracing_appender::non_blocking(open_append(path)?),
        LogTarget::Default => {
            if let Err(err) = std::fs::create_dir_all(DEFAULT_LOG_DIR) {
                eprintln!("Failed to create logs directory: {err}");
                return None;
            }
            tracing_appender::non_blocking(tracing_appender::rolling::never(
                DEFAULT_LOG_DIR,
                DEFAULT_LOG_FILE,
            ))
        }
    };
    let _ = LOG_GUARD.set(guard);
    Some(non_blocking)
}

fn open_append(path: &Path) -> Option<std::fs::File> {
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
    {
        Ok(file) => Some(file),
        Err(err) => {
            eprintln!("Failed to open log file {}: {err}", path.display());
            None
        }
    }
}
