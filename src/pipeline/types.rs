use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

use crate::extraction::ExtractionError;
use crate::record::{OutputRecord, RecordError};
use crate::sink::SinkStatus;

/// One uploaded document plus the metadata the transport layer knows about it.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Raw file content.
    pub bytes: Vec<u8>,
    /// Declared filename.
    pub filename: String,
    /// Declared MIME type.
    pub mime_type: Option<String>,
    /// Declared size; defaults to the byte length.
    pub declared_size: Option<u64>,
    /// Uploader label (`@username` or numeric id).
    pub uploader: Option<String>,
    /// Caption supplied with the upload.
    pub note: Option<String>,
    /// When the submission arrived.
    pub received_at: OffsetDateTime,
}

impl Submission {
    /// Submission received now, with no optional metadata.
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
            mime_type: None,
            declared_size: None,
            uploader: None,
            note: None,
            received_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Result of a successfully processed document.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    /// Record handed to the sink.
    pub record: OutputRecord,
    /// Whether the sink stored the record.
    pub sink_status: SinkStatus,
    /// Status message for the submitter.
    pub reply: String,
    /// Extraction diagnostic, when the text is partial or empty.
    pub diagnostic: Option<String>,
}

/// Failures that stop a document from producing a record.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Format is outside the supported set; nothing was processed.
    #[error("unsupported file type {file_type} for {filename}")]
    Unsupported {
        /// Declared filename.
        filename: String,
        /// Extension or MIME label.
        file_type: String,
    },
    /// Neither direct extraction nor OCR produced anything.
    #[error("could not process document: {cause}")]
    Unprocessable {
        /// Underlying extraction failure.
        #[source]
        cause: ExtractionError,
    },
    /// Record could not be assembled.
    #[error(transparent)]
    Record(#[from] RecordError),
}

impl PipelineError {
    /// Message suitable for the submitter.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Unsupported { .. } => "Only PDF, DOCX, TXT and MD files are supported.",
            Self::Unprocessable { .. } => "Could not process document.",
            Self::Record(_) => "Could not record this document.",
        }
    }
}
