//! Lightweight language detection for English and Russian text.

use serde::Serialize;
use std::fmt;

use crate::sanitize::collapse_whitespace;

const MIN_CHARS: usize = 30;
const SAMPLE_CHARS: usize = 4_000;
const ENGLISH_MARKERS: &[&str] = &[
    "the", "and", "of", "to", "in", "is", "for", "that", "with", "on", "are", "was", "this",
    "be", "as", "it", "by", "from", "or", "at",
];

/// Detected document language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Language {
    /// English.
    #[serde(rename = "en")]
    English,
    /// Russian.
    #[serde(rename = "ru")]
    Russian,
    /// Too short, mixed, or some other language.
    #[serde(rename = "unknown")]
    Unknown,
}

impl Language {
    /// ISO 639-1 code, or `unknown`.
    pub fn code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Russian => "ru",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Detect the language from the leading portion of `text`.
///
/// Cyrillic-dominant text is Russian. Latin-dominant text is English only when common
/// English function words show up; other Latin-script languages come back as `Unknown`.
pub fn detect_language(text: &str) -> Language {
    let collapsed = collapse_whitespace(text);
    if collapsed.chars().count() < MIN_CHARS {
        return Language::Unknown;
    }

    let sample: String = collapsed.chars().take(SAMPLE_CHARS).collect();
    let (mut cyrillic, mut latin) = (0usize, 0usize);
    for ch in sample.chars().filter(|ch| ch.is_alphabetic()) {
        if is_cyrillic(ch) {
            cyrillic += 1;
        } else if ch.is_ascii_alphabetic() {
            latin += 1;
        }
    }
    let letters = cyrillic + latin;
    if letters == 0 {
        return Language::Unknown;
    }

    if cyrillic * 2 > letters {
        return Language::Russian;
    }
    if latin * 2 > letters {
        let words: Vec<String> = sample
            .split(|ch: char| !ch.is_ascii_alphabetic())
            .filter(|word| !word.is_empty())
            .map(str::to_ascii_lowercase)
            .collect();
        let markers = words
            .iter()
            .filter(|word| ENGLISH_MARKERS.contains(&word.as_str()))
            .count();
        if markers >= 2 && markers * 20 >= words.len() {
            return Language::English;
        }
    }
    Language::Unknown
}

fn is_cyrillic(ch: char) -> bool {
    matches!(ch, '\u{0400}'..='\u{04FF}')
}
