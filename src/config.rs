use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the docsift pipeline and server.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Remote summarization endpoint (Hugging Face inference style). Remote calls are skipped when unset.
    pub summarization_url: Option<String>,
    /// Bearer token sent to the summarization endpoint.
    pub summarization_api_key: Option<String>,
    /// Per-request timeout for the summarization call.
    pub summarization_timeout_secs: u64,
    /// Retries allowed for transient summarization failures.
    pub summarization_max_retries: u32,
    /// Leading characters of the text forwarded to the summarization service.
    pub summarization_max_input_chars: usize,
    /// Average non-whitespace characters per page below which a PDF counts as scanned.
    pub scan_min_chars_per_page: usize,
    /// Tesseract language set, e.g. `rus+eng`.
    pub ocr_languages: String,
    /// Rasterization resolution used before recognition.
    pub ocr_dpi: u32,
    /// Upper bound on pages sent through OCR for a single document.
    pub ocr_max_pages: usize,
    /// Pages rasterized and recognized at the same time.
    pub ocr_concurrency: usize,
    /// Override for the `tesseract` executable.
    pub tesseract_cmd: Option<String>,
    /// Override for the `pdftoppm` executable.
    pub pdftoppm_cmd: Option<String>,
    /// Delimited file receiving one row per processed document.
    pub record_sink_path: PathBuf,
    /// Directory receiving each document's extracted text. Archiving is off when unset.
    pub text_dir: Option<PathBuf>,
    /// Largest upload accepted by the HTTP surface.
    pub max_upload_bytes: usize,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            summarization_url: load_env_optional("SUMMARIZATION_URL"),
            summarization_api_key: load_env_optional("SUMMARIZATION_API_KEY")
                .or_else(|| load_env_optional("HF_TOKEN")),
            summarization_timeout_secs: parse_env_or("SUMMARIZATION_TIMEOUT_SECS", 60)?,
            summarization_max_retries: parse_env_or("SUMMARIZATION_MAX_RETRIES", 1)?,
            summarization_max_input_chars: parse_env_or("SUMMARIZATION_MAX_INPUT_CHARS", 12_000)?,
            scan_min_chars_per_page: parse_env_or("SCAN_MIN_CHARS_PER_PAGE", 20)?,
            ocr_languages: load_env_optional("OCR_LANGUAGES").unwrap_or_else(|| "rus+eng".into()),
            ocr_dpi: parse_env_or("OCR_DPI", 300)?,
            ocr_max_pages: parse_env_or("OCR_MAX_PAGES", 25)?,
            ocr_concurrency: parse_env_or("OCR_CONCURRENCY", 1)?,
            tesseract_cmd: load_env_optional("TESSERACT_CMD"),
            pdftoppm_cmd: load_env_optional("PDFTOPPM_CMD"),
            record_sink_path: load_env("RECORD_SINK_PATH")?.into(),
            text_dir: load_env_optional("TEXT_DIR").map(PathBuf::from),
            max_upload_bytes: parse_env_or("MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?,
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        })
        .and_then(Self::validated)
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.ocr_languages.trim().is_empty() {
            return Err(ConfigError::InvalidValue("OCR_LANGUAGES".into()));
        }
        if self.ocr_dpi == 0 {
            return Err(ConfigError::InvalidValue("OCR_DPI".into()));
        }
        if self.ocr_concurrency == 0 {
            return Err(ConfigError::InvalidValue("OCR_CONCURRENCY".into()));
        }
        if self.summarization_max_input_chars == 0 {
            return Err(ConfigError::InvalidValue(
                "SUMMARIZATION_MAX_INPUT_CHARS".into(),
            ));
        }
        Ok(self)
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    load_env_optional(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        summarization_url = ?config.summarization_url,
        has_api_key = config.summarization_api_key.is_some(),
        ocr_languages = %config.ocr_languages,
        scan_min_chars_per_page = config.scan_min_chars_per_page,
        sink = %config.record_sink_path.display(),
        text_dir = ?config.text_dir,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_or_falls_back_to_default() {
        let value: usize = parse_env_or("DOCSIFT_TEST_UNSET_VARIABLE", 42).expect("default");
        assert_eq!(value, 42);
    }

    #[test]
    fn validation_rejects_zero_concurrency() {
        let config = Config {
            summarization_url: None,
            summarization_api_key: None,
            summarization_timeout_secs: 60,
            summarization_max_retries: 1,
            summarization_max_input_chars: 12_000,
            scan_min_chars_per_page: 20,
            ocr_languages: "rus+eng".into(),
            ocr_dpi: 300,
            ocr_max_pages: 25,
            ocr_concurrency: 0,
            tesseract_cmd: None,
            pdftoppm_cmd: None,
            record_sink_path: "records.tsv".into(),
            text_dir: None,
            max_upload_bytes: 1024,
            server_port: None,
        };
        let error = config.validated().expect_err("zero concurrency rejected");
        assert!(matches!(error, ConfigError::InvalidValue(key) if key == "OCR_CONCURRENCY"));
    }
}
