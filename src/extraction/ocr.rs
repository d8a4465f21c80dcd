//! Optical character recognition for scanned PDFs.
//!
//! The engine writes the PDF once into a scoped temporary directory, then rasterizes and
//! recognizes one page at a time through a [`PageRecognizer`]. Each page result is
//! independently fallible: a page that fails contributes an empty string, and only a
//! document where every page failed is reported as an error. Pages may run concurrently
//! (bounded by [`OcrSettings::concurrency`]) but results are always reassembled in page order.

use crate::config::Config;
use crate::extraction::markers::join_pages;
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;

/// Errors surfaced by OCR.
#[derive(Debug, Error)]
pub enum OcrError {
    /// Scratch directory or file I/O failed.
    #[error("OCR scratch storage failed: {0}")]
    Io(#[from] std::io::Error),
    /// An external tool could not be started.
    #[error("{tool} is unavailable: {reason}")]
    ToolUnavailable {
        /// Executable that failed to start.
        tool: String,
        /// Underlying spawn error.
        reason: String,
    },
    /// An external tool exited unsuccessfully.
    #[error("{tool} failed on page {page} ({status}): {stderr}")]
    CommandFailed {
        /// Executable that failed.
        tool: String,
        /// Page being processed.
        page: usize,
        /// Exit status description.
        status: String,
        /// Captured standard error.
        stderr: String,
    },
    /// Rasterization finished without producing an image.
    #[error("no raster produced for page {0}")]
    MissingRaster(usize),
    /// Page count could not be determined.
    #[error("could not determine page count: {0}")]
    PageCount(String),
    /// Every page failed; nothing could be recognized.
    #[error("no page of {pages} could be recognized (last error: {last_error})")]
    NoPagesRecognized {
        /// Pages attempted.
        pages: usize,
        /// Message of the last page failure.
        last_error: String,
    },
}

/// Settings for the OCR stage.
#[derive(Debug, Clone)]
pub struct OcrSettings {
    /// Tesseract language set, e.g. `rus+eng`.
    pub languages: String,
    /// Rasterization resolution.
    pub dpi: u32,
    /// Maximum pages recognized per document.
    pub max_pages: usize,
    /// Pages processed at the same time.
    pub concurrency: usize,
    /// `tesseract` executable.
    pub tesseract_cmd: String,
    /// `pdftoppm` executable.
    pub pdftoppm_cmd: String,
    /// `pdfinfo` executable, used when the page count is not known up front.
    pub pdfinfo_cmd: String,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            languages: "rus+eng".into(),
            dpi: 300,
            max_pages: 25,
            concurrency: 1,
            tesseract_cmd: "tesseract".into(),
            pdftoppm_cmd: "pdftoppm".into(),
            pdfinfo_cmd: "pdfinfo".into(),
        }
    }
}

impl OcrSettings {
    /// Derive OCR settings from the runtime configuration.
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::default();
        Self {
            languages: config.ocr_languages.clone(),
            dpi: config.ocr_dpi,
            max_pages: config.ocr_max_pages,
            concurrency: config.ocr_concurrency.max(1),
            tesseract_cmd: config
                .tesseract_cmd
                .clone()
                .unwrap_or(defaults.tesseract_cmd),
            pdftoppm_cmd: config.pdftoppm_cmd.clone().unwrap_or(defaults.pdftoppm_cmd),
            pdfinfo_cmd: defaults.pdfinfo_cmd,
        }
    }
}

/// Rasterizes and recognizes a single page of a PDF stored on disk.
#[async_trait]
pub trait PageRecognizer: Send + Sync {
    /// Count pages when the text layer could not be parsed.
    async fn page_count(&self, pdf: &Path) -> Result<usize, OcrError>;

    /// Recognize page `page` (1-based). Any intermediate raster must live under `scratch`
    /// and be released before returning.
    async fn recognize_page(
        &self,
        pdf: &Path,
        page: usize,
        scratch: &Path,
    ) -> Result<String, OcrError>;
}

/// Recognized text for a document.
#[derive(Debug, Clone)]
pub struct OcrOutput {
    /// Page-ordered text joined with page markers.
    pub text: String,
    /// Pages attempted.
    pub pages: usize,
    /// Pages that failed and contributed empty text.
    pub failed_pages: usize,
}

/// Drives page-by-page OCR with failure isolation.
#[derive(Clone)]
pub struct OcrEngine {
    recognizer: Arc<dyn PageRecognizer>,
    settings: OcrSettings,
}

impl OcrEngine {
    /// Build an engine over a page recognizer.
    pub fn new(recognizer: Arc<dyn PageRecognizer>, settings: OcrSettings) -> Self {
        Self {
            recognizer,
            settings,
        }
    }

    /// Build an engine backed by `pdftoppm` and `tesseract`.
    pub fn tesseract(settings: OcrSettings) -> Self {
        let recognizer = Arc::new(TesseractRecognizer::new(settings.clone()));
        Self::new(recognizer, settings)
    }

    /// Languages passed to the recognizer.
    pub fn languages(&self) -> &str {
        &self.settings.languages
    }

    /// Recognize every page (up to the configured cap) of `pdf_bytes`.
    ///
    /// `known_pages` comes from the direct-extraction attempt; when absent the recognizer
    /// is asked to count pages.
    pub async fn recognize(
        &self,
        pdf_bytes: &[u8],
        known_pages: Option<usize>,
    ) -> Result<OcrOutput, OcrError> {
        let scratch = tempfile::Builder::new().prefix("docsift-ocr-").tempdir()?;
        let pdf_path = scratch.path().join("input.pdf");
        tokio::fs::write(&pdf_path, pdf_bytes).await?;

        let total_pages = match known_pages {
            Some(pages) => pages,
            None => self.recognizer.page_count(&pdf_path).await?,
        };
        let pages = total_pages.min(self.settings.max_pages);
        if pages < total_pages {
            tracing::warn!(
                total_pages,
                max_pages = self.settings.max_pages,
                "Document exceeds OCR page cap; trailing pages skipped"
            );
        }

        let results = self.recognize_pages(&pdf_path, pages, scratch.path()).await;
        // `scratch` is dropped (and its contents deleted) when this function returns.
        fold_pages(results)
    }

    async fn recognize_pages(
        &self,
        pdf: &Path,
        pages: usize,
        scratch: &Path,
    ) -> Vec<Result<String, OcrError>> {
        let recognizer = &self.recognizer;
        stream::iter(1..=pages)
            .map(|page| async move {
                let result = recognizer.recognize_page(pdf, page, scratch).await;
                if let Err(error) = &result {
                    tracing::warn!(page, error = %error, "OCR failed on page; continuing");
                }
                result
            })
            .buffered(self.settings.concurrency.max(1))
            .collect()
            .await
    }
}

/// Fold ordered page results into document text; a failed page contributes an empty string.
pub fn fold_pages(results: Vec<Result<String, OcrError>>) -> Result<OcrOutput, OcrError> {
    let pages = results.len();
    let mut texts = Vec::with_capacity(pages);
    let mut failed_pages = 0usize;
    let mut last_error = None;

    for result in results {
        match result {
            Ok(text) => texts.push(text),
            Err(error) => {
                failed_pages += 1;
                last_error = Some(error.to_string());
                texts.push(String::new());
            }
        }
    }

    if failed_pages == pages {
        return Err(OcrError::NoPagesRecognized {
            pages,
            last_error: last_error.unwrap_or_else(|| "document has no pages".into()),
        });
    }

    Ok(OcrOutput {
        text: join_pages(&texts),
        pages,
        failed_pages,
    })
}

/// Page recognizer shelling out to poppler's `pdftoppm` and `tesseract`.
pub struct TesseractRecognizer {
    settings: OcrSettings,
}

impl TesseractRecognizer {
    /// Create a recognizer using the given executables and languages.
    pub fn new(settings: OcrSettings) -> Self {
        Self { settings }
    }

    async fn rasterize(&self, pdf: &Path, page: usize, scratch: &Path) -> Result<PathBuf, OcrError> {
        let prefix = scratch.join(format!("page-{page}"));
        let page_arg = page.to_string();
        let output = Command::new(&self.settings.pdftoppm_cmd)
            .arg("-r")
            .arg(self.settings.dpi.to_string())
            .arg("-f")
            .arg(&page_arg)
            .arg("-l")
            .arg(&page_arg)
            .arg("-png")
            .arg("-singlefile")
            .arg(pdf)
            .arg(&prefix)
            .output()
            .await
            .map_err(|error| OcrError::ToolUnavailable {
                tool: self.settings.pdftoppm_cmd.clone(),
                reason: error.to_string(),
            })?;
        if !output.status.success() {
            return Err(OcrError::CommandFailed {
                tool: self.settings.pdftoppm_cmd.clone(),
                page,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let raster = prefix.with_extension("png");
        if tokio::fs::try_exists(&raster).await.unwrap_or(false) {
            Ok(raster)
        } else {
            Err(OcrError::MissingRaster(page))
        }
    }

    async fn run_tesseract(&self, raster: &Path, page: usize) -> Result<String, OcrError> {
        let output = Command::new(&self.settings.tesseract_cmd)
            .arg(raster)
            .arg("stdout")
            .arg("-l")
            .arg(&self.settings.languages)
            .output()
            .await
            .map_err(|error| OcrError::ToolUnavailable {
                tool: self.settings.tesseract_cmd.clone(),
                reason: error.to_string(),
            })?;
        if !output.status.success() {
            return Err(OcrError::CommandFailed {
                tool: self.settings.tesseract_cmd.clone(),
                page,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl PageRecognizer for TesseractRecognizer {
    async fn page_count(&self, pdf: &Path) -> Result<usize, OcrError> {
        let output = Command::new(&self.settings.pdfinfo_cmd)
            .arg(pdf)
            .output()
            .await
            .map_err(|error| OcrError::ToolUnavailable {
                tool: self.settings.pdfinfo_cmd.clone(),
                reason: error.to_string(),
            })?;
        if !output.status.success() {
            return Err(OcrError::PageCount(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        parse_pdfinfo_pages(&String::from_utf8_lossy(&output.stdout))
            .ok_or_else(|| OcrError::PageCount("pdfinfo reported no page count".into()))
    }

    async fn recognize_page(
        &self,
        pdf: &Path,
        page: usize,
        scratch: &Path,
    ) -> Result<String, OcrError> {
        let raster = self.rasterize(pdf, page, scratch).await?;
        let recognized = self.run_tesseract(&raster, page).await;
        if let Err(error) = tokio::fs::remove_file(&raster).await {
            tracing::debug!(page, error = %error, "Failed to remove page raster");
        }
        recognized
    }
}

fn parse_pdfinfo_pages(stdout: &str) -> Option<usize> {
    stdout.lines().find_map(|line| {
        line.strip_prefix("Pages:")
            .and_then(|value| value.trim().parse().ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Recognizer returning canned page text, failing the listed pages.
    struct ScriptedRecognizer {
        pages: Vec<&'static str>,
        failing: Vec<usize>,
        scratch_seen: Mutex<Option<PathBuf>>,
    }

    impl ScriptedRecognizer {
        fn new(pages: Vec<&'static str>, failing: Vec<usize>) -> Self {
            Self {
                pages,
                failing,
                scratch_seen: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl PageRecognizer for ScriptedRecognizer {
        async fn page_count(&self, _pdf: &Path) -> Result<usize, OcrError> {
            Ok(self.pages.len())
        }

        async fn recognize_page(
            &self,
            pdf: &Path,
            page: usize,
            scratch: &Path,
        ) -> Result<String, OcrError> {
            assert!(pdf.exists(), "pdf copied into scratch before recognition");
            *self.scratch_seen.lock().expect("lock") = Some(scratch.to_path_buf());
            // Earlier pages finish last to exercise reordering.
            let delay = (self.pages.len() - page) as u64 * 5;
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if self.failing.contains(&page) {
                return Err(OcrError::MissingRaster(page));
            }
            Ok(self.pages[page - 1].to_string())
        }
    }

    fn settings(concurrency: usize, max_pages: usize) -> OcrSettings {
        OcrSettings {
            concurrency,
            max_pages,
            ..OcrSettings::default()
        }
    }

    #[tokio::test]
    async fn pages_are_reassembled_in_order_under_concurrency() {
        let recognizer = Arc::new(ScriptedRecognizer::new(vec!["один", "два", "три"], vec![]));
        let engine = OcrEngine::new(recognizer, settings(3, 10));

        let output = engine.recognize(b"%PDF-stub", Some(3)).await.expect("ocr");
        assert_eq!(output.text, "[[page 1]]\nодин\n[[page 2]]\nдва\n[[page 3]]\nтри");
        assert_eq!(output.failed_pages, 0);
    }

    #[tokio::test]
    async fn failed_page_contributes_empty_text() {
        let recognizer = Arc::new(ScriptedRecognizer::new(vec!["a", "b", "c"], vec![2]));
        let engine = OcrEngine::new(recognizer, settings(2, 10));

        let output = engine.recognize(b"%PDF-stub", None).await.expect("ocr");
        assert_eq!(output.text, "[[page 1]]\na\n[[page 2]]\n\n[[page 3]]\nc");
        assert_eq!(output.pages, 3);
        assert_eq!(output.failed_pages, 1);
    }

    #[tokio::test]
    async fn every_page_failing_is_fatal() {
        let recognizer = Arc::new(ScriptedRecognizer::new(vec!["a", "b"], vec![1, 2]));
        let engine = OcrEngine::new(recognizer, settings(1, 10));

        let error = engine.recognize(b"%PDF-stub", Some(2)).await.expect_err("fatal");
        assert!(matches!(error, OcrError::NoPagesRecognized { pages: 2, .. }));
    }

    #[tokio::test]
    async fn page_cap_limits_recognized_pages() {
        let recognizer = Arc::new(ScriptedRecognizer::new(vec!["a", "b", "c", "d"], vec![]));
        let engine = OcrEngine::new(recognizer, settings(1, 2));

        let output = engine.recognize(b"%PDF-stub", Some(4)).await.expect("ocr");
        assert_eq!(output.pages, 2);
        assert!(!output.text.contains("[[page 3]]"));
    }

    #[tokio::test]
    async fn scratch_directory_is_removed_after_success_and_failure() {
        for failing in [vec![], vec![1]] {
            let recognizer = Arc::new(ScriptedRecognizer::new(vec!["a"], failing));
            let engine = OcrEngine::new(recognizer.clone(), settings(1, 10));
            let _ = engine.recognize(b"%PDF-stub", Some(1)).await;

            let scratch = recognizer
                .scratch_seen
                .lock()
                .expect("lock")
                .clone()
                .expect("scratch used");
            assert!(!scratch.exists(), "scratch dir {scratch:?} should be cleaned up");
        }
    }

    #[test]
    fn pdfinfo_page_count_is_parsed() {
        let stdout = "Producer:       scanner\nPages:          7\nEncrypted:      no\n";
        assert_eq!(parse_pdfinfo_pages(stdout), Some(7));
        assert_eq!(parse_pdfinfo_pages("Title: x"), None);
    }

    #[tokio::test]
    #[ignore = "Requires pdftoppm and tesseract with rus+eng data"]
    async fn live_tesseract_recognizes_rendered_pdf() {
        let bytes = crate::extraction::fixtures::pdf_with_pages(&[Some(
            "Invoice number forty two for consulting services",
        )]);
        let engine = OcrEngine::tesseract(OcrSettings::default());
        let output = engine.recognize(&bytes, Some(1)).await.expect("live ocr");
        assert!(output.text.to_lowercase().contains("invoice"));
    }
}
