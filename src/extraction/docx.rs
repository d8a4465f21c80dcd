//! Paragraph text from OOXML word-processing documents.

use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::{Cursor, Read};
use thiserror::Error;

/// Decompressed size cap for `word/document.xml` (zip-bomb guard).
const MAX_DOCUMENT_XML_BYTES: u64 = 50 * 1024 * 1024;
const DOCUMENT_XML: &str = "word/document.xml";

/// Reasons a word document could not be read.
#[derive(Debug, Error)]
pub enum DocxError {
    /// Container is not a readable zip archive or lacks the main part.
    #[error("invalid docx container: {0}")]
    Container(String),
    /// Main document part exceeded the size cap.
    #[error("{DOCUMENT_XML} exceeds {MAX_DOCUMENT_XML_BYTES} bytes")]
    TooLarge,
    /// Main document part is not well-formed XML.
    #[error("malformed document xml: {0}")]
    Xml(String),
}

/// Concatenate paragraph text in document order, one paragraph per line.
pub fn extract_paragraphs(bytes: &[u8]) -> Result<String, DocxError> {
    let xml = read_document_xml(bytes)?;
    paragraphs_from_xml(&xml).map(|paragraphs| paragraphs.join("\n"))
}

fn read_document_xml(bytes: &[u8]) -> Result<Vec<u8>, DocxError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|error| DocxError::Container(error.to_string()))?;
    let entry = archive
        .by_name(DOCUMENT_XML)
        .map_err(|error| DocxError::Container(format!("{DOCUMENT_XML}: {error}")))?;
    let mut xml = Vec::new();
    entry
        .take(MAX_DOCUMENT_XML_BYTES)
        .read_to_end(&mut xml)
        .map_err(|error| DocxError::Container(error.to_string()))?;
    if xml.len() as u64 >= MAX_DOCUMENT_XML_BYTES {
        return Err(DocxError::TooLarge);
    }
    Ok(xml)
}

fn paragraphs_from_xml(xml: &[u8]) -> Result<Vec<String>, DocxError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    // Paragraphs can nest through text boxes; the innermost one receives text.
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(element)) => match element.local_name().as_ref() {
                b"p" => open.push(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(element)) => match (element.local_name().as_ref(), open.last_mut()) {
                (b"p", _) => paragraphs.push(String::new()),
                (b"tab", Some(current)) => current.push('\t'),
                (b"br" | b"cr", Some(current)) => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(text)) if in_text => {
                let unescaped = text
                    .unescape()
                    .map_err(|error| DocxError::Xml(error.to_string()))?;
                if let Some(current) = open.last_mut() {
                    current.push_str(&unescaped);
                }
            }
            Ok(Event::End(element)) => match element.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    if let Some(paragraph) = open.pop() {
                        paragraphs.push(paragraph);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(error) => return Err(DocxError::Xml(error.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}
