//! HTTP surface for docsift.
//!
//! This module exposes a compact Axum router standing in for the chat transport:
//!
//! - `POST /documents` – Raw file bytes in the body; `filename` (required), `mime`,
//!   `username`, `user_id` and `note` as query parameters. Returns the output record, the
//!   sink status and the reply text that would be sent back to the submitter.
//! - `GET /metrics` – Pipeline counters (processed, rejected, failed, OCR, remote/fallback).
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! Unsupported formats answer `415`, documents nothing could be read from answer `422`.

use crate::metrics::MetricsSnapshot;
use crate::pipeline::{DocumentApi, PipelineError, PipelineOutcome, Submission};
use crate::sanitize::{sanitize_string, uploader_label};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use time::OffsetDateTime;

/// Build the HTTP router; request bodies above `max_upload_bytes` are rejected with `413`.
pub fn create_router<S>(service: Arc<S>, max_upload_bytes: usize) -> Router
where
    S: DocumentApi + 'static,
{
    Router::new()
        .route("/documents", post(submit_document::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(service)
}

/// Query parameters accompanying `POST /documents`.
#[derive(Debug, Deserialize)]
struct UploadParams {
    /// Declared filename; drives format detection.
    filename: String,
    /// Declared MIME type; falls back to the `Content-Type` header.
    #[serde(default)]
    mime: Option<String>,
    /// Uploader username, rendered as `@username`.
    #[serde(default)]
    username: Option<String>,
    /// Uploader numeric id, used when no username is given.
    #[serde(default)]
    user_id: Option<String>,
    /// Caption supplied with the upload.
    #[serde(default)]
    note: Option<String>,
}

/// Run one uploaded document through the pipeline.
async fn submit_document<S>(
    State(service): State<Arc<S>>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PipelineOutcome>, AppError>
where
    S: DocumentApi,
{
    let UploadParams {
        filename,
        mime,
        username,
        user_id,
        note,
    } = params;

    let mime_type = sanitize_string(mime).or_else(|| {
        headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.starts_with("application/octet-stream"))
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
    });

    let mut submission = Submission::new(body.to_vec(), filename);
    submission.mime_type = mime_type;
    submission.uploader = uploader_label(username, user_id);
    submission.note = note;
    submission.received_at = OffsetDateTime::now_utc();

    let outcome = service.ingest(submission).await?;
    tracing::info!(
        filename = %outcome.record.file_name,
        method = %outcome.record.text_extract_method,
        sink = %outcome.sink_status,
        "Document request completed"
    );
    Ok(Json(outcome))
}

/// Return the pipeline counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: DocumentApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "submit_document",
                method: "POST",
                path: "/documents",
                description: "Extract text (OCR for scanned PDFs), summarize, extract keywords and append a record. Body is the raw file; metadata goes in the query string. Supports PDF, DOCX, TXT and MD.",
                request_example: Some(json!({
                    "query": {
                        "filename": "report.pdf",
                        "mime": "application/pdf",
                        "username": "alice",
                        "note": "Q3 board pack"
                    }
                })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return processing counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

struct AppError(PipelineError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PipelineError::Unsupported { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            PipelineError::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::Record(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "error": self.0.user_message(),
            "detail": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(inner: PipelineError) -> Self {
        Self(inner)
    }
}
