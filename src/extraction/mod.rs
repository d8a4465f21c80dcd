//! Text extraction: per-format strategies plus the PDF scan decision and OCR fallback.

pub mod docx;
pub mod markers;
pub mod ocr;
pub mod pdf;
pub mod plain;

#[cfg(test)]
#[path = "../../tests/fixtures/mod.rs"]
pub(crate) mod fixtures;

use crate::config::Config;
use crate::format::FormatTag;
use ocr::{OcrEngine, OcrError};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Strategy that produced a document's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMethod {
    /// PDF text layer.
    Direct,
    /// Optical character recognition of rasterized pages.
    Ocr,
    /// Decoded text, markdown or word-document paragraphs.
    PlainRead,
}

impl ExtractionMethod {
    /// Stable label used in records.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Ocr => "ocr",
            Self::PlainRead => "plain-read",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable upload handed to the extractor.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    bytes: Vec<u8>,
    filename: String,
    declared_size: u64,
    declared_mime: Option<String>,
    format: FormatTag,
}

impl SourceDocument {
    /// Wrap uploaded bytes. A missing declared size falls back to the byte length.
    pub fn new(
        bytes: Vec<u8>,
        filename: impl Into<String>,
        declared_size: Option<u64>,
        declared_mime: Option<String>,
        format: FormatTag,
    ) -> Self {
        let declared_size = declared_size.unwrap_or(bytes.len() as u64);
        Self {
            bytes,
            filename: filename.into(),
            declared_size,
            declared_mime,
            format,
        }
    }

    /// Raw content.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Filename declared by the uploader.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Size declared by the transport layer.
    pub fn declared_size(&self) -> u64 {
        self.declared_size
    }

    /// MIME type declared by the transport layer.
    pub fn declared_mime(&self) -> Option<&str> {
        self.declared_mime.as_deref()
    }

    /// Format inferred at ingestion.
    pub fn format(&self) -> FormatTag {
        self.format
    }
}

/// Text produced for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    /// Extracted text; PDF text carries page markers. May be empty.
    pub text: String,
    /// Strategy that produced `text`.
    pub method: ExtractionMethod,
    /// Language hint supplied by the strategy (OCR language set).
    pub language_hint: Option<String>,
    /// Page count for paged formats.
    pub pages: Option<usize>,
    /// Why the text is empty or partial, when something went wrong.
    pub diagnostic: Option<String>,
}

impl ExtractionResult {
    fn plain(text: String) -> Self {
        Self {
            text,
            method: ExtractionMethod::PlainRead,
            language_hint: None,
            pages: None,
            diagnostic: None,
        }
    }

    /// Text without page markers. Only paged output carries markers, so unpaged text is
    /// returned as read.
    pub fn body_text(&self) -> String {
        if self.pages.is_some() {
            markers::strip_page_markers(&self.text)
        } else {
            self.text.clone()
        }
    }

    fn degraded(method: ExtractionMethod, diagnostic: String) -> Self {
        Self {
            text: String::new(),
            method,
            language_hint: None,
            pages: None,
            diagnostic: Some(diagnostic),
        }
    }
}

/// Extraction failures that abort the document.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Format is not supported; callers should have rejected it earlier.
    #[error("unsupported format for {0}")]
    Unsupported(String),
    /// Neither the text layer nor OCR produced anything usable.
    #[error("no usable text layer and OCR failed: {0}")]
    Unprocessable(#[source] OcrError),
    /// Blocking extraction task panicked or was cancelled.
    #[error("extraction task failed: {0}")]
    Task(String),
}

/// Settings for the extraction stage.
#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    /// Average non-whitespace characters per page below which a PDF counts as scanned.
    pub scan_min_chars_per_page: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            scan_min_chars_per_page: 20,
        }
    }
}

impl ExtractionSettings {
    /// Derive extraction settings from the runtime configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            scan_min_chars_per_page: config.scan_min_chars_per_page,
        }
    }
}

/// Produces text for supported documents, routing scanned PDFs through OCR.
#[derive(Clone)]
pub struct TextExtractor {
    settings: ExtractionSettings,
    ocr: OcrEngine,
}

impl TextExtractor {
    /// Build an extractor with the given OCR engine.
    pub fn new(settings: ExtractionSettings, ocr: OcrEngine) -> Self {
        Self { settings, ocr }
    }

    /// Extract text from `document`.
    ///
    /// Corrupt content in a supported format yields empty text with a diagnostic. The only
    /// fatal outcome is a PDF where neither the text layer nor any OCR page produced text.
    pub async fn extract(
        &self,
        document: &SourceDocument,
    ) -> Result<ExtractionResult, ExtractionError> {
        match document.format() {
            FormatTag::Text | FormatTag::Markdown => {
                let (text, encoding) = plain::decode_text(document.bytes());
                tracing::debug!(filename = document.filename(), ?encoding, "Decoded text document");
                Ok(ExtractionResult::plain(text))
            }
            FormatTag::WordDocument => self.extract_docx(document).await,
            FormatTag::Pdf => self.extract_pdf(document).await,
            FormatTag::Unsupported => {
                Err(ExtractionError::Unsupported(document.filename().to_string()))
            }
        }
    }

    async fn extract_docx(
        &self,
        document: &SourceDocument,
    ) -> Result<ExtractionResult, ExtractionError> {
        let bytes = document.bytes().to_vec();
        let parsed = tokio::task::spawn_blocking(move || docx::extract_paragraphs(&bytes))
            .await
            .map_err(|error| ExtractionError::Task(error.to_string()))?;
        Ok(match parsed {
            Ok(text) => ExtractionResult::plain(text),
            Err(error) => {
                tracing::warn!(filename = document.filename(), error = %error, "Word document unreadable");
                ExtractionResult::degraded(ExtractionMethod::PlainRead, error.to_string())
            }
        })
    }

    async fn extract_pdf(
        &self,
        document: &SourceDocument,
    ) -> Result<ExtractionResult, ExtractionError> {
        let bytes = document.bytes().to_vec();
        let direct = tokio::task::spawn_blocking(move || pdf::extract_pages(&bytes))
            .await
            .map_err(|error| ExtractionError::Task(error.to_string()))?;

        let (direct_text, known_pages, load_error) = match direct {
            Ok(text) => {
                if !pdf::looks_scanned(&text, self.settings.scan_min_chars_per_page) {
                    tracing::info!(
                        filename = document.filename(),
                        pages = text.page_count(),
                        chars = text.non_whitespace_chars(),
                        "PDF text layer accepted"
                    );
                    return Ok(ExtractionResult {
                        text: markers::join_pages(&text.pages),
                        method: ExtractionMethod::Direct,
                        language_hint: None,
                        pages: Some(text.page_count()),
                        diagnostic: (text.failed_pages > 0).then(|| {
                            format!("{} page(s) had an unreadable text layer", text.failed_pages)
                        }),
                    });
                }
                tracing::info!(
                    filename = document.filename(),
                    pages = text.page_count(),
                    chars = text.non_whitespace_chars(),
                    threshold = self.settings.scan_min_chars_per_page,
                    "PDF looks scanned; running OCR"
                );
                let known_pages = Some(text.page_count());
                (text, known_pages, None)
            }
            Err(error) => {
                tracing::warn!(
                    filename = document.filename(),
                    error = %error,
                    "PDF text layer unreadable; running OCR"
                );
                (pdf::PdfText::default(), None, Some(error.to_string()))
            }
        };

        match self.ocr.recognize(document.bytes(), known_pages).await {
            Ok(output) => Ok(ExtractionResult {
                text: output.text,
                method: ExtractionMethod::Ocr,
                language_hint: Some(self.ocr.languages().to_string()),
                pages: Some(output.pages),
                diagnostic: (output.failed_pages > 0)
                    .then(|| format!("OCR failed on {} page(s)", output.failed_pages)),
            }),
            Err(error) if direct_text.non_whitespace_chars() > 0 => {
                tracing::warn!(
                    filename = document.filename(),
                    error = %error,
                    "OCR failed; keeping sparse text layer"
                );
                Ok(ExtractionResult {
                    text: markers::join_pages(&direct_text.pages),
                    method: ExtractionMethod::Ocr,
                    language_hint: None,
                    pages: known_pages,
                    diagnostic: Some(format!("OCR failed: {error}")),
                })
            }
            Err(error) => {
                tracing::error!(
                    filename = document.filename(),
                    error = %error,
                    load_error = ?load_error,
                    "Document could not be processed"
                );
                Err(ExtractionError::Unprocessable(error))
            }
        }
    }
}
