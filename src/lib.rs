#![deny(missing_docs)]

//! Core library for docsift: document text extraction with OCR fallback, summarization with
//! a local fallback, keyword extraction and record assembly.

/// HTTP routing and REST handlers.
pub mod api;
/// Archive of extracted document text.
pub mod archive;
/// Environment-driven configuration management.
pub mod config;
/// Per-format text extraction and OCR.
pub mod extraction;
/// File format classification.
pub mod format;
/// Local keyword extraction.
pub mod keywords;
/// Language detection.
pub mod language;
/// Structured logging and tracing setup.
pub mod logging;
/// Processing metrics helpers.
pub mod metrics;
/// Document processing pipeline.
pub mod pipeline;
/// Output record assembly.
pub mod record;
/// Metadata normalization and contact scrubbing.
pub mod sanitize;
/// Record sinks.
pub mod sink;
/// Remote summarization and the local fallback.
pub mod summarization;
