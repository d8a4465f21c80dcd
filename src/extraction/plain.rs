//! Plain-text and markdown decoding.

use encoding_rs::WINDOWS_1251;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Which decoder produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// Valid UTF-8 (BOM stripped when present).
    Utf8,
    /// Legacy Cyrillic code page, used when the bytes are not valid UTF-8.
    Windows1251,
}

/// Decode text bytes verbatim, trying UTF-8 first and the legacy code page second.
pub fn decode_text(bytes: &[u8]) -> (String, TextEncoding) {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(body) {
        Ok(text) => (text.to_string(), TextEncoding::Utf8),
        Err(error) => {
            tracing::debug!(
                valid_up_to = error.valid_up_to(),
                "Input is not UTF-8; decoding as windows-1251"
            );
            let (text, _) = WINDOWS_1251.decode_without_bom_handling(body);
            (text.into_owned(), TextEncoding::Windows1251)
        }
    }
}
