mod fixtures;

use async_trait::async_trait;
use docsift::archive::TextArchive;
use docsift::extraction::ExtractionMethod;
use docsift::extraction::ocr::{OcrEngine, OcrError, OcrSettings, PageRecognizer};
use docsift::extraction::{ExtractionSettings, TextExtractor};
use docsift::keywords::KeywordExtractor;
use docsift::pipeline::{DocumentApi, DocumentPipeline, PipelineError, Submission};
use docsift::record::HEADERS;
use docsift::sink::{DelimitedFileSink, SinkStatus};
use docsift::summarization::{
    HttpSummarizationClient, SummarizerSettings, Summarizer, SummarySource,
};
use fixtures::{docx_with_paragraphs, pdf_with_pages};
use httpmock::{Method::POST, MockServer};
use serde_json::json;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use time::macros::datetime;

/// Recognizer standing in for tesseract: returns canned Russian text per page.
struct RussianScanRecognizer {
    calls: AtomicUsize,
}

#[async_trait]
impl PageRecognizer for RussianScanRecognizer {
    async fn page_count(&self, _pdf: &Path) -> Result<usize, OcrError> {
        Ok(2)
    }

    async fn recognize_page(
        &self,
        _pdf: &Path,
        page: usize,
        _scratch: &Path,
    ) -> Result<String, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(match page {
            1 => "Договор поставки оборудования заключён между сторонами сроком на один год.".into(),
            _ => "Оплата по договору поставки производится ежемесячно в течение срока действия.".into(),
        })
    }
}

fn pipeline_with(recognizer: Arc<dyn PageRecognizer>, summarizer: Summarizer) -> DocumentPipeline {
    let ocr = OcrEngine::new(recognizer, OcrSettings::default());
    DocumentPipeline::new(
        TextExtractor::new(ExtractionSettings::default(), ocr),
        summarizer,
        KeywordExtractor::default(),
    )
}

fn local_pipeline() -> (DocumentPipeline, Arc<RussianScanRecognizer>) {
    let recognizer = Arc::new(RussianScanRecognizer {
        calls: AtomicUsize::new(0),
    });
    let pipeline = pipeline_with(
        recognizer.clone(),
        Summarizer::new(None, SummarizerSettings::default()),
    );
    (pipeline, recognizer)
}

const ENGLISH_NOTES: &str = "The migration plan moves the billing service to the new cluster. \
    The billing service keeps its database until the cutover weekend. \
    After the cutover the old cluster is retired and the migration plan is closed.";

#[tokio::test]
async fn plain_text_upload_is_recorded() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sink_path = dir.path().join("records.tsv");
    let (pipeline, recognizer) = local_pipeline();
    let pipeline = pipeline.with_sink(Arc::new(DelimitedFileSink::new(&sink_path)));

    let mut submission = Submission::new(ENGLISH_NOTES.as_bytes().to_vec(), "plan.txt");
    submission.uploader = Some("@ops".into());
    let outcome = pipeline.ingest(submission).await.expect("processed");

    let record = &outcome.record;
    assert_eq!(record.text_extract_method, ExtractionMethod::PlainRead);
    assert_eq!(record.file_type, "txt");
    assert_eq!(record.language, "en");
    assert_eq!(record.summary_source, SummarySource::Fallback);
    assert!(record.summary.starts_with("The migration plan moves"));
    assert!(record.keywords.contains("billing service"));
    let phrases: Vec<&str> = record.keywords.split(", ").collect();
    assert!((5..=10).contains(&phrases.len()), "keywords: {phrases:?}");
    let unique: HashSet<&str> = phrases.iter().copied().collect();
    assert_eq!(unique.len(), phrases.len());
    assert_eq!(record.text_pages, None);
    assert_eq!(outcome.sink_status, SinkStatus::Appended);
    assert_eq!(recognizer.calls.load(Ordering::SeqCst), 0);

    let rows = std::fs::read_to_string(&sink_path).expect("sink file");
    let lines: Vec<&str> = rows.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], HEADERS.join("\t"));
    assert!(lines[1].contains("plan.txt"));
}

#[tokio::test]
async fn text_layer_pdf_is_extracted_directly() {
    let (pipeline, recognizer) = local_pipeline();
    let bytes = pdf_with_pages(&[
        Some("The board approved the annual budget for the research division."),
        Some("The research division will hire four engineers in the spring."),
    ]);

    let outcome = pipeline
        .ingest(Submission::new(bytes, "minutes.pdf"))
        .await
        .expect("processed");

    assert_eq!(outcome.record.text_extract_method, ExtractionMethod::Direct);
    assert_eq!(outcome.record.text_pages, Some(2));
    assert!(outcome.record.summary.contains("annual budget"));
    assert!(!outcome.record.summary.contains("[[page"));
    assert_eq!(recognizer.calls.load(Ordering::SeqCst), 0);
    assert_eq!(pipeline.metrics_snapshot().direct_reads, 1);
}

#[tokio::test]
async fn scanned_russian_pdf_goes_through_ocr() {
    let (pipeline, recognizer) = local_pipeline();
    let bytes = pdf_with_pages(&[None, None]);

    let outcome = pipeline
        .ingest(Submission::new(bytes, "скан.pdf"))
        .await
        .expect("processed");

    let record = &outcome.record;
    assert_eq!(record.text_extract_method, ExtractionMethod::Ocr);
    assert_eq!(record.text_pages, Some(2));
    assert_eq!(record.language, "ru");
    assert!(record.summary.starts_with("Договор поставки"));
    assert!(record.keywords.starts_with("договор поставки"));
    assert_eq!(recognizer.calls.load(Ordering::SeqCst), 2);
    assert_eq!(pipeline.metrics_snapshot().ocr_documents, 1);
}

#[tokio::test]
async fn scanned_pdf_text_is_archived_with_page_markers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (pipeline, _) = local_pipeline();
    let pipeline = pipeline.with_text_archive(TextArchive::new(dir.path().join("text")));

    let outcome = pipeline
        .ingest(Submission::new(pdf_with_pages(&[None, None]), "скан.pdf"))
        .await
        .expect("processed");

    let archived = std::fs::read_to_string(&outcome.record.text_path).expect("archived text");
    assert!(archived.starts_with("[[page 1]]\nДоговор поставки"));
    assert!(archived.contains("[[page 2]]"));
    assert!(outcome.record.text_chars < archived.chars().count());
}

#[tokio::test]
async fn executable_upload_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sink_path = dir.path().join("records.tsv");
    let (pipeline, _) = local_pipeline();
    let pipeline = pipeline.with_sink(Arc::new(DelimitedFileSink::new(&sink_path)));

    let error = pipeline
        .ingest(Submission::new(b"MZ\x90\x00\x03".to_vec(), "installer.exe"))
        .await
        .expect_err("rejected");

    assert!(matches!(error, PipelineError::Unsupported { .. }));
    assert!(!sink_path.exists());
}

#[tokio::test]
async fn word_document_is_read_as_paragraphs() {
    let (pipeline, _) = local_pipeline();
    let bytes = docx_with_paragraphs(&[
        "Quarterly hiring plan for the platform team.",
        "The platform team adds two reliability engineers.",
    ]);

    let outcome = pipeline
        .ingest(Submission::new(bytes, "hiring.docx"))
        .await
        .expect("processed");

    assert_eq!(outcome.record.text_extract_method, ExtractionMethod::PlainRead);
    assert_eq!(outcome.record.file_type, "docx");
    assert!(outcome.record.keywords.contains("platform team"));
}

#[tokio::test]
async fn identical_uploads_differ_only_in_timestamp() {
    let (pipeline, _) = local_pipeline();

    let mut first = Submission::new(ENGLISH_NOTES.as_bytes().to_vec(), "plan.md");
    first.received_at = datetime!(2024-05-01 08:00:00 UTC);
    let mut second = first.clone();
    second.received_at = datetime!(2024-05-02 09:15:00 UTC);

    let mut a = pipeline.ingest(first).await.expect("first").record;
    let mut b = pipeline.ingest(second).await.expect("second").record;
    assert_ne!(a.timestamp, b.timestamp);

    a.timestamp.clear();
    b.timestamp.clear();
    assert_eq!(a, b);
}

#[tokio::test]
async fn remote_summary_is_used_for_english_text() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/models/summarizer");
            then.status(200)
                .json_body(json!([{ "summary_text": "Billing moves to the new cluster." }]));
        })
        .await;

    let client = HttpSummarizationClient::new(
        server.url("/models/summarizer"),
        Some("token".into()),
        Duration::from_secs(5),
    )
    .expect("client");
    let recognizer = Arc::new(RussianScanRecognizer {
        calls: AtomicUsize::new(0),
    });
    let pipeline = pipeline_with(
        recognizer,
        Summarizer::new(Some(Arc::new(client)), SummarizerSettings::default()),
    );

    let text = format!("{ENGLISH_NOTES} {ENGLISH_NOTES}");
    let outcome = pipeline
        .ingest(Submission::new(text.into_bytes(), "plan.txt"))
        .await
        .expect("processed");

    mock.assert_async().await;
    assert_eq!(outcome.record.summary_source, SummarySource::Remote);
    assert_eq!(outcome.record.summary, "Billing moves to the new cluster.");
    assert_eq!(pipeline.metrics_snapshot().remote_summaries, 1);
}

#[tokio::test]
async fn failing_remote_summary_falls_back() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/models/summarizer");
            then.status(500).body("internal error");
        })
        .await;

    let client = HttpSummarizationClient::new(
        server.url("/models/summarizer"),
        None,
        Duration::from_secs(5),
    )
    .expect("client");
    let recognizer = Arc::new(RussianScanRecognizer {
        calls: AtomicUsize::new(0),
    });
    let pipeline = pipeline_with(
        recognizer,
        Summarizer::new(Some(Arc::new(client)), SummarizerSettings::default()),
    );

    let text = format!("{ENGLISH_NOTES} {ENGLISH_NOTES}");
    let outcome = pipeline
        .ingest(Submission::new(text.into_bytes(), "plan.txt"))
        .await
        .expect("processed");

    mock.assert_hits_async(1).await;
    assert_eq!(outcome.record.summary_source, SummarySource::Fallback);
    assert!(!outcome.record.summary.is_empty());
}
