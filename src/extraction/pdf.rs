//! Direct text-layer extraction for PDFs and the scanned-document heuristic.

use lopdf::Document;
use thiserror::Error;

/// PDF could not be opened at all.
#[derive(Debug, Error)]
#[error("failed to load pdf: {0}")]
pub struct PdfLoadError(String);

/// Per-page text read from the PDF text layer.
#[derive(Debug, Clone, Default)]
pub struct PdfText {
    /// Text for each page in page order; pages that failed to decode are empty.
    pub pages: Vec<String>,
    /// Pages whose text layer could not be decoded.
    pub failed_pages: usize,
}

impl PdfText {
    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total non-whitespace characters across all pages.
    pub fn non_whitespace_chars(&self) -> usize {
        self.pages
            .iter()
            .map(|page| page.chars().filter(|ch| !ch.is_whitespace()).count())
            .sum()
    }
}

/// Read the text layer page by page.
pub fn extract_pages(bytes: &[u8]) -> Result<PdfText, PdfLoadError> {
    let document =
        Document::load_mem(bytes).map_err(|error| PdfLoadError(error.to_string()))?;
    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();

    let mut text = PdfText::default();
    for page in page_numbers {
        match document.extract_text(&[page]) {
            Ok(page_text) => text.pages.push(page_text),
            Err(error) => {
                tracing::debug!(page, error = %error, "Text layer unreadable on page");
                text.failed_pages += 1;
                text.pages.push(String::new());
            }
        }
    }
    Ok(text)
}

/// A PDF counts as scanned when it has no text at all, or when the average number of
/// non-whitespace characters per page falls below `min_chars_per_page`.
pub fn looks_scanned(text: &PdfText, min_chars_per_page: usize) -> bool {
    let chars = text.non_whitespace_chars();
    if chars == 0 || text.page_count() == 0 {
        return true;
    }
    chars < min_chars_per_page.saturating_mul(text.page_count())
}
