use std::sync::atomic::{AtomicU64, Ordering};

use crate::extraction::ExtractionMethod;
use crate::summarization::SummarySource;

/// Thread-safe counters describing pipeline activity.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_processed: AtomicU64,
    documents_rejected: AtomicU64,
    documents_failed: AtomicU64,
    ocr_documents: AtomicU64,
    direct_reads: AtomicU64,
    plain_reads: AtomicU64,
    remote_summaries: AtomicU64,
    fallback_summaries: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a document that made it through the pipeline.
    pub fn record_document(&self, method: ExtractionMethod, source: SummarySource) {
        self.documents_processed.fetch_add(1, Ordering::Relaxed);
        let counter = match method {
            ExtractionMethod::Ocr => &self.ocr_documents,
            ExtractionMethod::Direct => &self.direct_reads,
            ExtractionMethod::PlainRead => &self.plain_reads,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        match source {
            SummarySource::Remote => self.remote_summaries.fetch_add(1, Ordering::Relaxed),
            SummarySource::Fallback => self.fallback_summaries.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Record an upload rejected before extraction (unsupported format).
    pub fn record_rejected(&self) {
        self.documents_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a document that could not be processed at all.
    pub fn record_failed(&self) {
        self.documents_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_processed: self.documents_processed.load(Ordering::Relaxed),
            documents_rejected: self.documents_rejected.load(Ordering::Relaxed),
            documents_failed: self.documents_failed.load(Ordering::Relaxed),
            ocr_documents: self.ocr_documents.load(Ordering::Relaxed),
            direct_reads: self.direct_reads.load(Ordering::Relaxed),
            plain_reads: self.plain_reads.load(Ordering::Relaxed),
            remote_summaries: self.remote_summaries.load(Ordering::Relaxed),
            fallback_summaries: self.fallback_summaries.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Documents that produced an output record since startup.
    pub documents_processed: u64,
    /// Uploads rejected because of an unsupported format.
    pub documents_rejected: u64,
    /// Documents where no page could be processed.
    pub documents_failed: u64,
    /// Documents whose text came from OCR.
    pub ocr_documents: u64,
    /// PDFs read from their text layer.
    pub direct_reads: u64,
    /// Text, markdown and word documents read as-is.
    pub plain_reads: u64,
    /// Summaries produced by the remote service.
    pub remote_summaries: u64,
    /// Summaries produced by the local fallback.
    pub fallback_summaries: u64,
}
