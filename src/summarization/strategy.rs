use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;

use super::{
    HttpSummarizationClient, SummarizationClient, SummarizationClientError,
    SummarizationRequest, SummaryResult, SummarySource, fallback_summary,
};

/// Tunables for choosing between the remote and local summary paths.
#[derive(Debug, Clone)]
pub struct SummarizerSettings {
    /// Leading characters forwarded to the remote service.
    pub max_input_chars: usize,
    /// Extra attempts allowed after a transient failure.
    pub max_retries: u32,
    /// Pause before retry `n` is `retry_backoff * n`.
    pub retry_backoff: Duration,
    /// Texts shorter than this go straight to the local path.
    pub remote_min_chars: usize,
    /// Languages the remote model handles; empty accepts any.
    pub remote_languages: Vec<String>,
    /// Upper bound on remote summary length in model tokens.
    pub max_length: usize,
    /// Lower bound on remote summary length in model tokens.
    pub min_length: usize,
    /// Sentences kept by the local path.
    pub fallback_sentences: usize,
    /// Character cap for the local path.
    pub fallback_max_chars: usize,
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            max_input_chars: 12_000,
            max_retries: 1,
            retry_backoff: Duration::from_millis(500),
            remote_min_chars: 300,
            remote_languages: vec!["en".into()],
            max_length: 160,
            min_length: 40,
            fallback_sentences: 3,
            fallback_max_chars: 900,
        }
    }
}

impl SummarizerSettings {
    /// Settings derived from the runtime configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_input_chars: config.summarization_max_input_chars,
            max_retries: config.summarization_max_retries,
            ..Self::default()
        }
    }
}

/// Produces a summary for every input, preferring the remote service when it is usable.
#[derive(Clone)]
pub struct Summarizer {
    client: Option<Arc<dyn SummarizationClient>>,
    settings: SummarizerSettings,
}

impl Summarizer {
    /// Build a summarizer; without a client every summary comes from the local path.
    pub fn new(client: Option<Arc<dyn SummarizationClient>>, settings: SummarizerSettings) -> Self {
        Self { client, settings }
    }

    /// Build the HTTP client from configuration when an endpoint is set.
    pub fn from_config(config: &Config) -> Result<Self, SummarizationClientError> {
        let client = match config.summarization_url.as_deref() {
            Some(url) if !url.trim().is_empty() => {
                let http = HttpSummarizationClient::new(
                    url,
                    config.summarization_api_key.clone(),
                    Duration::from_secs(config.summarization_timeout_secs),
                )?;
                Some(Arc::new(http) as Arc<dyn SummarizationClient>)
            }
            _ => None,
        };
        Ok(Self::new(client, SummarizerSettings::from_config(config)))
    }

    /// Whether a remote client is configured.
    pub fn has_remote(&self) -> bool {
        self.client.is_some()
    }

    /// Summarize `text` without a language gate.
    pub async fn summarize(&self, text: &str) -> SummaryResult {
        self.summarize_in(text, None).await
    }

    /// Summarize `text`, skipping the remote path when `language` is not one it handles.
    /// Never fails; any remote problem degrades to the local summary.
    pub async fn summarize_in(&self, text: &str, language: Option<&str>) -> SummaryResult {
        let text = text.trim();
        if let Some(client) = self.client.as_ref()
            && self.remote_applies(text, language)
        {
            match self.call_remote(client.as_ref(), text).await {
                Ok(summary) => {
                    return SummaryResult {
                        text: summary,
                        source: SummarySource::Remote,
                    };
                }
                Err(error) => {
                    tracing::warn!(
                        error = %error,
                        kind = error.kind(),
                        "Remote summarization failed; falling back to extractive"
                    );
                }
            }
        }

        SummaryResult {
            text: fallback_summary(
                text,
                self.settings.fallback_sentences,
                self.settings.fallback_max_chars,
            ),
            source: SummarySource::Fallback,
        }
    }

    fn remote_applies(&self, text: &str, language: Option<&str>) -> bool {
        if text.chars().count() < self.settings.remote_min_chars.max(1) {
            return false;
        }
        match language {
            Some(language) if !self.settings.remote_languages.is_empty() => self
                .settings
                .remote_languages
                .iter()
                .any(|accepted| accepted.eq_ignore_ascii_case(language)),
            _ => true,
        }
    }

    async fn call_remote(
        &self,
        client: &dyn SummarizationClient,
        text: &str,
    ) -> Result<String, SummarizationClientError> {
        let request = SummarizationRequest {
            inputs: truncate_chars(text, self.settings.max_input_chars).to_string(),
            max_length: self.settings.max_length,
            min_length: self.settings.min_length,
        };

        let mut attempt = 0u32;
        loop {
            match client.summarize(request.clone()).await {
                Ok(summary) => return Ok(summary),
                Err(error) if error.is_transient() && attempt < self.settings.max_retries => {
                    attempt += 1;
                    tracing::debug!(error = %error, attempt, "Retrying summarization");
                    tokio::time::sleep(self.settings.retry_backoff * attempt).await;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

/// Prefix of at most `max_chars` characters, cut on a char boundary.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
