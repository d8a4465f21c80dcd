//! On-disk copies of extracted document text.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while archiving extracted text.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Underlying file operation failed.
    #[error("text archive io error: {0}")]
    Io(#[from] std::io::Error),
    /// Digest is not usable as a file name.
    #[error("invalid archive key: {0:?}")]
    InvalidKey(String),
}

/// Directory holding one `<sha256>.txt` file per distinct document.
#[derive(Debug, Clone)]
pub struct TextArchive {
    dir: PathBuf,
}

impl TextArchive {
    /// Archive rooted at `dir`; the directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `text` under the content digest and return the file path.
    ///
    /// Identical uploads map to the same file, which is overwritten.
    pub async fn store(&self, content_sha256: &str, text: &str) -> Result<PathBuf, ArchiveError> {
        if content_sha256.is_empty() || !content_sha256.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(ArchiveError::InvalidKey(content_sha256.to_string()));
        }
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("{content_sha256}.txt"));
        tokio::fs::write(&path, text).await?;
        tracing::debug!(path = %path.display(), chars = text.chars().count(), "Extracted text archived");
        Ok(path)
    }
}
