//! Output record assembly and the status reply sent back to the submitter.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

use crate::extraction::{ExtractionMethod, ExtractionResult};
use crate::format::file_type_label;
use crate::keywords::KeywordSet;
use crate::language::Language;
use crate::sanitize::{UNKNOWN, sanitize_string};
use crate::sink::SinkStatus;
use crate::summarization::{PLACEHOLDER, SummaryResult, SummarySource};

/// Column names, in row order.
pub const HEADERS: [&str; 15] = [
    "timestamp",
    "uploader",
    "file_name",
    "file_size_bytes",
    "file_type",
    "text_extract_method",
    "text_pages",
    "text_chars",
    "language",
    "summary",
    "summary_source",
    "keywords",
    "content_sha256",
    "note",
    "text_path",
];

const REPLY_SUMMARY_CHARS: usize = 700;

/// Errors raised while assembling a record.
#[derive(Debug, Error)]
pub enum RecordError {
    /// A required field was empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    /// Timestamp could not be rendered.
    #[error("invalid timestamp: {0}")]
    Timestamp(String),
}

/// Submission metadata captured at ingestion.
#[derive(Debug, Clone)]
pub struct DocumentMetadata {
    /// Declared filename.
    pub filename: String,
    /// Declared size in bytes.
    pub size_bytes: u64,
    /// Declared MIME type.
    pub mime_type: Option<String>,
    /// Uploader label (`@username` or numeric id).
    pub uploader: Option<String>,
    /// When the submission arrived.
    pub received_at: OffsetDateTime,
    /// Caption supplied with the upload.
    pub note: Option<String>,
    /// Hex SHA-256 of the raw bytes.
    pub content_sha256: String,
    /// Where the extracted text was archived, if it was.
    pub text_path: Option<PathBuf>,
}

/// One row of the tabular store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRecord {
    /// Receipt time, RFC 3339 UTC.
    pub timestamp: String,
    /// Uploader label or `unknown`.
    pub uploader: String,
    /// Declared filename.
    pub file_name: String,
    /// Declared size in bytes.
    pub file_size_bytes: u64,
    /// Extension without dot, else MIME, else `unknown`.
    pub file_type: String,
    /// Strategy that produced the text.
    pub text_extract_method: ExtractionMethod,
    /// Page count for paged formats.
    pub text_pages: Option<usize>,
    /// Characters of extracted text, page markers excluded.
    pub text_chars: usize,
    /// Detected language code or `unknown`.
    pub language: String,
    /// Summary text, never empty.
    pub summary: String,
    /// Which path produced the summary.
    pub summary_source: SummarySource,
    /// Comma-separated keywords, or a placeholder.
    pub keywords: String,
    /// Hex SHA-256 of the raw bytes.
    pub content_sha256: String,
    /// Submitter caption, possibly empty.
    pub note: String,
    /// Archived extracted text, empty when archiving is off or failed.
    pub text_path: String,
}

impl OutputRecord {
    /// Cell values in [`HEADERS`] order.
    pub fn row(&self) -> Vec<String> {
        vec![
            self.timestamp.clone(),
            self.uploader.clone(),
            self.file_name.clone(),
            self.file_size_bytes.to_string(),
            self.file_type.clone(),
            self.text_extract_method.to_string(),
            self.text_pages.map(|pages| pages.to_string()).unwrap_or_default(),
            self.text_chars.to_string(),
            self.language.clone(),
            self.summary.clone(),
            self.summary_source.to_string(),
            self.keywords.clone(),
            self.content_sha256.clone(),
            self.note.clone(),
            self.text_path.clone(),
        ]
    }
}

/// Assembles [`OutputRecord`]s from stage outputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordBuilder;

impl RecordBuilder {
    /// Build the record, substituting placeholders for missing optional values.
    pub fn build(
        &self,
        metadata: &DocumentMetadata,
        extraction: &ExtractionResult,
        language: Language,
        summary: &SummaryResult,
        keywords: &KeywordSet,
    ) -> Result<OutputRecord, RecordError> {
        let file_name = metadata.filename.trim();
        if file_name.is_empty() {
            return Err(RecordError::MissingField("file_name"));
        }
        if metadata.content_sha256.is_empty() {
            return Err(RecordError::MissingField("content_sha256"));
        }

        let timestamp = metadata
            .received_at
            .to_offset(UtcOffset::UTC)
            .format(&Rfc3339)
            .map_err(|error| RecordError::Timestamp(error.to_string()))?;

        let summary_text = summary.text.trim();
        Ok(OutputRecord {
            timestamp,
            uploader: sanitize_string(metadata.uploader.clone())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            file_name: file_name.to_string(),
            file_size_bytes: metadata.size_bytes,
            file_type: file_type_label(file_name, metadata.mime_type.as_deref()),
            text_extract_method: extraction.method,
            text_pages: extraction.pages,
            text_chars: extraction.body_text().chars().count(),
            language: language.code().to_string(),
            summary: if summary_text.is_empty() {
                PLACEHOLDER.to_string()
            } else {
                summary_text.to_string()
            },
            summary_source: summary.source,
            keywords: if keywords.is_empty() {
                PLACEHOLDER.to_string()
            } else {
                keywords.join(", ")
            },
            content_sha256: metadata.content_sha256.clone(),
            note: sanitize_string(metadata.note.clone()).unwrap_or_default(),
            text_path: metadata
                .text_path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_default(),
        })
    }
}

/// Hex SHA-256 digest of raw content.
pub fn content_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Status message delivered to the submitter after processing.
pub fn format_reply(record: &OutputRecord, sink_status: &SinkStatus) -> String {
    let size_kb = record.file_size_bytes as f64 / 1024.0;
    let pages = record
        .text_pages
        .map(|pages| pages.to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string());

    let mut summary = record.summary.trim().to_string();
    if summary.chars().count() > REPLY_SUMMARY_CHARS {
        summary = summary.chars().take(REPLY_SUMMARY_CHARS).collect::<String>();
        summary = summary.trim_end().to_string();
        summary.push('…');
    }

    let mut lines = vec![
        "Document processed".to_string(),
        String::new(),
        format!("File: {}", record.file_name),
        format!("Uploader: {}", record.uploader),
        format!("Received (UTC): {}", record.timestamp),
        format!("Size: {size_kb:.1} KB"),
        format!("Type: {}", record.file_type),
        format!(
            "Text: {}, pages: {pages}, chars: {}",
            record.text_extract_method, record.text_chars
        ),
        format!("Language: {}", record.language),
    ];
    if !record.note.is_empty() {
        lines.push(format!("Note: {}", record.note));
    }
    lines.extend([
        String::new(),
        format!("Summary ({}):", record.summary_source),
        summary,
        String::new(),
        "Keywords:".to_string(),
        record.keywords.clone(),
        String::new(),
        format!("Record store: {sink_status}"),
    ]);
    lines.join("\n")
}
