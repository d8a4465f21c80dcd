//! Per-document orchestration: classify, extract, analyze, record.

mod types;

pub use types::{PipelineError, PipelineOutcome, Submission};

use async_trait::async_trait;
use std::sync::Arc;

use crate::archive::TextArchive;
use crate::config::Config;
use crate::extraction::ocr::{OcrEngine, OcrSettings};
use crate::extraction::{
    ExtractionError, ExtractionSettings, SourceDocument, TextExtractor,
};
use crate::format::{classify, file_type_label};
use crate::keywords::{KeywordExtractor, KeywordSettings};
use crate::language::{Language, detect_language};
use crate::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::record::{DocumentMetadata, RecordBuilder, content_digest, format_reply};
use crate::sanitize::{sanitize_string, scrub_contacts};
use crate::sink::{DelimitedFileSink, RecordSink, SinkStatus};
use crate::summarization::{SummarizationClientError, Summarizer};

/// Abstraction over document processing used by external surfaces (HTTP, CLI).
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Process one submission end to end and store its record.
    async fn ingest(&self, submission: Submission) -> Result<PipelineOutcome, PipelineError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

/// Runs every stage for a single document.
///
/// The pipeline keeps no per-document state, so one instance is shared through an `Arc`
/// by every concurrent request. Sink failures are reported in the outcome and never fail
/// the document.
pub struct DocumentPipeline {
    extractor: TextExtractor,
    summarizer: Summarizer,
    keywords: KeywordExtractor,
    records: RecordBuilder,
    sink: Option<Arc<dyn RecordSink>>,
    archive: Option<TextArchive>,
    metrics: Arc<PipelineMetrics>,
}

impl DocumentPipeline {
    /// Assemble a pipeline from its stages; no sink is attached.
    pub fn new(extractor: TextExtractor, summarizer: Summarizer, keywords: KeywordExtractor) -> Self {
        Self {
            extractor,
            summarizer,
            keywords,
            records: RecordBuilder,
            sink: None,
            archive: None,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Attach the record sink.
    pub fn with_sink(mut self, sink: Arc<dyn RecordSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Keep a copy of each document's extracted text in `archive`.
    pub fn with_text_archive(mut self, archive: TextArchive) -> Self {
        self.archive = Some(archive);
        self
    }

    /// Build every stage from configuration, writing records to `RECORD_SINK_PATH` and
    /// extracted text to `TEXT_DIR` when set.
    pub fn from_config(config: &Config) -> Result<Self, SummarizationClientError> {
        let ocr = OcrEngine::tesseract(OcrSettings::from_config(config));
        let extractor = TextExtractor::new(ExtractionSettings::from_config(config), ocr);
        let summarizer = Summarizer::from_config(config)?;
        tracing::info!(
            remote_summaries = summarizer.has_remote(),
            sink = %config.record_sink_path.display(),
            text_dir = ?config.text_dir,
            "Document pipeline initialized"
        );
        let keywords = KeywordExtractor::new(KeywordSettings::from_config(config));
        let pipeline = Self::new(extractor, summarizer, keywords)
            .with_sink(Arc::new(DelimitedFileSink::new(&config.record_sink_path)));
        Ok(match &config.text_dir {
            Some(dir) => pipeline.with_text_archive(TextArchive::new(dir)),
            None => pipeline,
        })
    }

    /// Shared metrics handle.
    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Process one submission: classify, extract, summarize, extract keywords, build the
    /// record and hand it to the sink.
    pub async fn process(&self, submission: Submission) -> Result<PipelineOutcome, PipelineError> {
        let Submission {
            bytes,
            filename,
            mime_type,
            declared_size,
            uploader,
            note,
            received_at,
        } = submission;

        let mime_type = sanitize_string(mime_type);
        let format = classify(&filename, mime_type.as_deref());
        if !format.is_supported() {
            self.metrics.record_rejected();
            let file_type = file_type_label(&filename, mime_type.as_deref());
            tracing::warn!(filename = %filename, file_type = %file_type, "Rejected unsupported upload");
            return Err(PipelineError::Unsupported { filename, file_type });
        }

        let content_sha256 = content_digest(&bytes);
        let document = SourceDocument::new(bytes, &filename, declared_size, mime_type.clone(), format);
        tracing::info!(
            filename = %filename,
            format = %format,
            size = document.declared_size(),
            "Processing document"
        );

        let extraction = match self.extractor.extract(&document).await {
            Ok(extraction) => extraction,
            Err(error) => {
                self.metrics.record_failed();
                return Err(match error {
                    ExtractionError::Unsupported(filename) => PipelineError::Unsupported {
                        file_type: file_type_label(&filename, mime_type.as_deref()),
                        filename,
                    },
                    cause => PipelineError::Unprocessable { cause },
                });
            }
        };
        let size_bytes = document.declared_size();
        drop(document);

        let text_path = match &self.archive {
            Some(archive) => match archive.store(&content_sha256, &extraction.text).await {
                Ok(path) => Some(path),
                Err(error) => {
                    tracing::warn!(filename = %filename, error = %error, "Text archive write failed");
                    None
                }
            },
            None => None,
        };

        let text = extraction.body_text();
        let language = detect_language(&text);
        let clean = scrub_contacts(&text);

        // Undetected languages still try the remote model.
        let language_gate = (language != Language::Unknown).then(|| language.code());
        let summary = self.summarizer.summarize_in(&clean, language_gate).await;
        let keywords = self.keywords.extract(&clean);

        let metadata = DocumentMetadata {
            filename,
            size_bytes,
            mime_type,
            uploader,
            received_at,
            note,
            content_sha256,
            text_path,
        };
        let record = self
            .records
            .build(&metadata, &extraction, language, &summary, &keywords)?;
        self.metrics
            .record_document(extraction.method, summary.source);

        let sink_status = match self.sink.as_ref() {
            Some(sink) => SinkStatus::from(sink.append(&record).await),
            None => SinkStatus::Skipped,
        };
        if let SinkStatus::Failed(reason) = &sink_status {
            tracing::warn!(filename = %record.file_name, reason = %reason, "Record sink write failed");
        }

        tracing::info!(
            filename = %record.file_name,
            method = %record.text_extract_method,
            pages = ?record.text_pages,
            chars = record.text_chars,
            language = %record.language,
            summary_source = %record.summary_source,
            sink = %sink_status,
            "Document processed"
        );

        let reply = format_reply(&record, &sink_status);
        Ok(PipelineOutcome {
            record,
            sink_status,
            reply,
            diagnostic: extraction.diagnostic,
        })
    }
}

#[async_trait]
impl DocumentApi for DocumentPipeline {
    async fn ingest(&self, submission: Submission) -> Result<PipelineOutcome, PipelineError> {
        self.process(submission).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
