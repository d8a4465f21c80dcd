//! Remote abstractive summarization with a deterministic local fallback.
//!
//! The remote client speaks the Hugging Face inference protocol (`{"inputs", "parameters"}`
//! in, `[{"summary_text"}]` out). Every failure is classified so the [`Summarizer`] can
//! decide between one retry (transient: transport errors, timeouts, 408/429/502/503/504) and going straight
//! to the local extractive fallback. Results are tagged with the path that produced them.

mod fallback;
mod strategy;

pub use fallback::{PLACEHOLDER, fallback_summary, split_sentences};
pub use strategy::{SummarizerSettings, Summarizer};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Path that produced a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarySource {
    /// Remote summarization service.
    Remote,
    /// Local extractive fallback.
    Fallback,
}

impl SummarySource {
    /// Stable label used in records.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for SummarySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary text plus the path that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryResult {
    /// Summary text; never empty.
    pub text: String,
    /// Which path produced `text`.
    pub source: SummarySource,
}

/// Errors surfaced while attempting remote summarization.
#[derive(Debug, Error)]
pub enum SummarizationClientError {
    /// HTTP client could not be constructed.
    #[error("Failed to build summarization client: {0}")]
    Client(String),
    /// Provider unreachable (connection refused, DNS, reset).
    #[error("Summarization provider unreachable: {0}")]
    Transport(String),
    /// Request exceeded the configured timeout.
    #[error("Summarization request timed out: {0}")]
    Timeout(String),
    /// Provider answered with a non-success status.
    #[error("Summarization provider returned {status}: {body}")]
    Status {
        /// HTTP status returned by the provider.
        status: StatusCode,
        /// Response body, for diagnostics.
        body: String,
    },
    /// Provider rejected the (already truncated) input as too long.
    #[error("Summarization input rejected as too long: {0}")]
    InputTooLong(String),
    /// Response body was empty or not in the expected shape.
    #[error("Malformed provider response: {0}")]
    Malformed(String),
}

impl SummarizationClientError {
    /// Whether a retry may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => matches!(
                *status,
                StatusCode::REQUEST_TIMEOUT
                    | StatusCode::TOO_MANY_REQUESTS
                    | StatusCode::BAD_GATEWAY
                    | StatusCode::SERVICE_UNAVAILABLE
                    | StatusCode::GATEWAY_TIMEOUT
            ),
            Self::Client(_) | Self::InputTooLong(_) | Self::Malformed(_) => false,
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Client(_) => "client",
            Self::Transport(_) => "transport",
            Self::Timeout(_) => "timeout",
            Self::Status { .. } => "status",
            Self::InputTooLong(_) => "input_too_long",
            Self::Malformed(_) => "malformed",
        }
    }
}

/// Request payload passed to the summarization provider.
#[derive(Debug, Clone)]
pub struct SummarizationRequest {
    /// Text to summarize, already truncated to the provider's input limit.
    pub inputs: String,
    /// Upper bound on summary length in model tokens.
    pub max_length: usize,
    /// Lower bound on summary length in model tokens.
    pub min_length: usize,
}

/// Interface implemented by remote summarization providers.
#[async_trait]
pub trait SummarizationClient: Send + Sync {
    /// Produce a summary for the request.
    async fn summarize(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError>;
}

/// Client for Hugging Face style inference endpoints.
pub struct HttpSummarizationClient {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpSummarizationClient {
    /// Build a client for `endpoint`, authenticating with `api_key` when present.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SummarizationClientError> {
        let http = Client::builder()
            .user_agent("docsift/summary")
            .timeout(timeout)
            .build()
            .map_err(|error| SummarizationClientError::Client(error.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

#[async_trait]
impl SummarizationClient for HttpSummarizationClient {
    async fn summarize(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError> {
        let payload = json!({
            "inputs": request.inputs,
            "parameters": {
                "max_length": request.max_length,
                "min_length": request.min_length,
                "do_sample": false,
            },
            "options": { "wait_for_model": true },
        });

        let mut builder = self.http.post(&self.endpoint).json(&payload);
        if let Some(api_key) = self.api_key.as_deref()
            && !api_key.is_empty()
        {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.map_err(classify_transport)?;
        let status = response.status();
        let body = response.text().await.map_err(classify_transport)?;

        if !status.is_success() {
            if status == StatusCode::PAYLOAD_TOO_LARGE || mentions_input_length(&body) {
                return Err(SummarizationClientError::InputTooLong(format!(
                    "{status}: {body}"
                )));
            }
            return Err(SummarizationClientError::Status { status, body });
        }

        parse_summary(&body)
    }
}

fn classify_transport(error: reqwest::Error) -> SummarizationClientError {
    if error.is_timeout() {
        SummarizationClientError::Timeout(error.to_string())
    } else {
        SummarizationClientError::Transport(error.to_string())
    }
}

fn mentions_input_length(body: &str) -> bool {
    let lowered = body.to_lowercase();
    lowered.contains("too long")
        || lowered.contains("sequence length")
        || lowered.contains("index out of range")
}

/// Extract `summary_text` from either a list or an object response.
fn parse_summary(body: &str) -> Result<String, SummarizationClientError> {
    let value: Value = serde_json::from_str(body).map_err(|error| {
        SummarizationClientError::Malformed(format!("response is not json: {error}"))
    })?;
    let summary = match &value {
        Value::Array(items) => items
            .first()
            .and_then(|item| item.get("summary_text"))
            .and_then(Value::as_str),
        Value::Object(map) => map.get("summary_text").and_then(Value::as_str),
        _ => None,
    }
    .ok_or_else(|| SummarizationClientError::Malformed("missing summary_text".into()))?;

    let trimmed = summary.trim();
    if trimmed.is_empty() {
        return Err(SummarizationClientError::Malformed(
            "summary_text is empty".into(),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn client_for(server: &MockServer, timeout: Duration) -> HttpSummarizationClient {
        HttpSummarizationClient::new(
            server.url("/models/bart"),
            Some("secret".into()),
            timeout,
        )
        .expect("client")
    }

    fn request() -> SummarizationRequest {
        SummarizationRequest {
            inputs: "Long text".into(),
            max_length: 160,
            min_length: 40,
        }
    }

    #[tokio::test]
    async fn list_response_is_parsed() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/models/bart")
                    .header("authorization", "Bearer secret")
                    .json_body_partial(r#"{"inputs": "Long text"}"#);
                then.status(200)
                    .json_body(json!([{ "summary_text": "  Short text. " }]));
            })
            .await;

        let summary = client_for(&server, Duration::from_secs(5))
            .summarize(request())
            .await
            .expect("summary");

        mock.assert_async().await;
        assert_eq!(summary, "Short text.");
    }

    #[tokio::test]
    async fn server_error_is_non_transient_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/bart");
                then.status(500).body("boom");
            })
            .await;

        let error = client_for(&server, Duration::from_secs(5))
            .summarize(request())
            .await
            .expect_err("error response");

        assert!(
            matches!(&error, SummarizationClientError::Status { status, .. } if *status == StatusCode::INTERNAL_SERVER_ERROR)
        );
        assert!(!error.is_transient());
    }

    #[tokio::test]
    async fn unavailable_model_is_transient() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/bart");
                then.status(503)
                    .json_body(json!({ "error": "loading", "estimated_time": 20.0 }));
            })
            .await;

        let error = client_for(&server, Duration::from_secs(5))
            .summarize(request())
            .await
            .expect_err("503");
        assert!(error.is_transient());
    }

    #[tokio::test]
    async fn slow_response_is_a_timeout() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/bart");
                then.status(200)
                    .delay(Duration::from_millis(500))
                    .json_body(json!([{ "summary_text": "late" }]));
            })
            .await;

        let error = client_for(&server, Duration::from_millis(50))
            .summarize(request())
            .await
            .expect_err("timeout");
        assert!(matches!(error, SummarizationClientError::Timeout(_)));
        assert!(error.is_transient());
    }

    #[tokio::test]
    async fn oversized_input_is_classified() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/bart");
                then.status(400)
                    .json_body(json!({ "error": "index out of range in self" }));
            })
            .await;

        let error = client_for(&server, Duration::from_secs(5))
            .summarize(request())
            .await
            .expect_err("too long");
        assert!(matches!(error, SummarizationClientError::InputTooLong(_)));
        assert!(!error.is_transient());
    }

    #[test]
    fn parse_summary_rejects_unexpected_shapes() {
        assert!(parse_summary("not json").is_err());
        assert!(parse_summary(r#"{"generated_text": "x"}"#).is_err());
        assert!(parse_summary(r#"[{"summary_text": "   "}]"#).is_err());
        assert_eq!(
            parse_summary(r#"{"summary_text": "ok"}"#).expect("object"),
            "ok"
        );
    }
}
