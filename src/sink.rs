//! Destination for output records.

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::record::{HEADERS, OutputRecord};

/// Errors raised while persisting a record.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Underlying file operation failed.
    #[error("record sink io error: {0}")]
    Io(#[from] std::io::Error),
    /// Store rejected the row.
    #[error("record sink rejected row: {0}")]
    Rejected(String),
}

/// Outcome of handing a record to the sink, reported back to the submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkStatus {
    /// Row stored.
    Appended,
    /// Row not stored; processing still succeeded.
    Failed(String),
    /// No sink configured.
    Skipped,
}

impl SinkStatus {
    /// Whether the row was stored.
    pub fn is_appended(&self) -> bool {
        matches!(self, Self::Appended)
    }
}

impl fmt::Display for SinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Appended => f.write_str("appended"),
            Self::Failed(reason) => write!(f, "failed ({reason})"),
            Self::Skipped => f.write_str("not configured"),
        }
    }
}

impl serde::Serialize for SinkStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<Result<(), SinkError>> for SinkStatus {
    fn from(result: Result<(), SinkError>) -> Self {
        match result {
            Ok(()) => Self::Appended,
            Err(error) => Self::Failed(error.to_string()),
        }
    }
}

/// Tabular store receiving one row per processed document.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Append `record` as a single row.
    async fn append(&self, record: &OutputRecord) -> Result<(), SinkError>;
}

/// Tab-separated file with a header row written once.
pub struct DelimitedFileSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl DelimitedFileSink {
    /// Sink appending to `path`; parent directories are created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Target file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordSink for DelimitedFileSink {
    async fn append(&self, record: &OutputRecord) -> Result<(), SinkError> {
        let _guard = self.lock.lock().await;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let needs_header = match tokio::fs::metadata(&self.path).await {
            Ok(metadata) => metadata.len() == 0,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => true,
            Err(error) => return Err(error.into()),
        };

        let mut payload = String::new();
        if needs_header {
            payload.push_str(&HEADERS.join("\t"));
            payload.push('\n');
        }
        let cells: Vec<String> = record.row().iter().map(|cell| escape_cell(cell)).collect();
        payload.push_str(&cells.join("\t"));
        payload.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(payload.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!(path = %self.path.display(), file = %record.file_name, "Record appended");
        Ok(())
    }
}

fn escape_cell(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '\t' => escaped.push_str("\\t"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}
