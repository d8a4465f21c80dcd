//! Upload classification by file extension, with the declared MIME type as a secondary signal.

use serde::Serialize;
use std::fmt;
use std::path::Path;

/// MIME type of OOXML word-processing documents.
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
/// MIME type of PDF documents.
pub const MIME_PDF: &str = "application/pdf";

/// Format families the pipeline knows how to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatTag {
    /// Plain text (`.txt`).
    Text,
    /// Markdown (`.md`, `.markdown`).
    Markdown,
    /// OOXML word-processing document (`.docx`).
    WordDocument,
    /// Portable Document Format (`.pdf`).
    Pdf,
    /// Anything else; rejected before extraction.
    Unsupported,
}

impl FormatTag {
    /// Whether the pipeline may run on this format.
    pub fn is_supported(self) -> bool {
        !matches!(self, Self::Unsupported)
    }

    /// Stable label used in logs and records.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Markdown => "markdown",
            Self::WordDocument => "word-document",
            Self::Pdf => "pdf",
            Self::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify an upload. The extension decides when present; the MIME hint only applies to
/// extensionless names.
pub fn classify(filename: &str, declared_mime: Option<&str>) -> FormatTag {
    match extension(filename).as_deref() {
        Some("txt") => FormatTag::Text,
        Some("md" | "markdown") => FormatTag::Markdown,
        Some("docx") => FormatTag::WordDocument,
        Some("pdf") => FormatTag::Pdf,
        Some(_) => FormatTag::Unsupported,
        None => declared_mime.map_or(FormatTag::Unsupported, classify_mime),
    }
}

fn classify_mime(mime: &str) -> FormatTag {
    let essence = mime
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "text/plain" => FormatTag::Text,
        "text/markdown" | "text/x-markdown" => FormatTag::Markdown,
        MIME_DOCX => FormatTag::WordDocument,
        MIME_PDF => FormatTag::Pdf,
        _ => FormatTag::Unsupported,
    }
}

/// Lowercased extension without the leading dot.
pub fn extension(filename: &str) -> Option<String> {
    Path::new(filename.trim())
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.trim().to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// File type label stored in records: the extension, else the declared MIME, else `unknown`.
pub fn file_type_label(filename: &str, declared_mime: Option<&str>) -> String {
    extension(filename)
        .or_else(|| {
            declared_mime
                .map(str::trim)
                .filter(|mime| !mime.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "unknown".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_case_insensitive() {
        assert_eq!(classify("Report.PDF", None), FormatTag::Pdf);
        assert_eq!(classify("notes.Md", None), FormatTag::Markdown);
        assert_eq!(classify("letter.DOCX", None), FormatTag::WordDocument);
        assert_eq!(classify("plain.txt", Some(MIME_PDF)), FormatTag::Text);
    }

    #[test]
    fn unknown_extensions_are_rejected_even_with_supported_mime() {
        assert_eq!(classify("setup.exe", None), FormatTag::Unsupported);
        assert_eq!(classify("setup.exe", Some("text/plain")), FormatTag::Unsupported);
        assert_eq!(classify("legacy.doc", None), FormatTag::Unsupported);
    }

    #[test]
    fn mime_decides_for_extensionless_names() {
        assert_eq!(classify("scan", Some("application/pdf")), FormatTag::Pdf);
        assert_eq!(
            classify("README", Some("text/plain; charset=utf-8")),
            FormatTag::Text
        );
        assert_eq!(classify("blob", Some("image/png")), FormatTag::Unsupported);
        assert_eq!(classify("blob", None), FormatTag::Unsupported);
    }

    #[test]
    fn file_type_label_prefers_extension() {
        assert_eq!(file_type_label("a.PDF", Some(MIME_PDF)), "pdf");
        assert_eq!(file_type_label("scan", Some(MIME_PDF)), MIME_PDF);
        assert_eq!(file_type_label("scan", None), "unknown");
    }
}
