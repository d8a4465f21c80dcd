//! Deterministic extractive summary used when the remote path is unusable.

use crate::sanitize::scrub_contacts;

/// Summary emitted for input with no usable text.
pub const PLACEHOLDER: &str = "—";

/// Split text after `.`, `!`, `?` or `…` runs that are followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if !matches!(ch, '.' | '!' | '?' | '…') {
            continue;
        }
        if let Some((_, next)) = chars.peek()
            && next.is_whitespace()
        {
            let end = idx + ch.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// First `max_sentences` sentences of the contact-scrubbed text, or a character prefix when
/// the text does not segment into at least two sentences. Output is capped at `max_chars`.
pub fn fallback_summary(text: &str, max_sentences: usize, max_chars: usize) -> String {
    let clean = scrub_contacts(text);
    if clean.is_empty() {
        return PLACEHOLDER.to_string();
    }

    let sentences = split_sentences(&clean);
    let summary = if sentences.len() >= 2 {
        sentences
            .iter()
            .take(max_sentences.max(1))
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        clean
    };
    truncate_with_ellipsis(&summary, max_chars)
}

fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated = text
        .chars()
        .take(max_chars.max(1))
        .collect::<String>()
        .trim_end()
        .to_string();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentences_split_on_terminal_punctuation() {
        let sentences = split_sentences("One. Two?! Three… Four v1.2 stays. Last");
        assert_eq!(sentences, vec!["One.", "Two?!", "Three…", "Four v1.2 stays.", "Last"]);
    }

    #[test]
    fn first_three_sentences_are_kept() {
        let summary = fallback_summary("A one. B two. C three. D four.", 3, 900);
        assert_eq!(summary, "A one. B two. C three.");
    }

    #[test]
    fn single_sentence_becomes_character_prefix() {
        let text = "word ".repeat(400);
        let summary = fallback_summary(&text, 3, 100);
        assert!(summary.ends_with('…'));
        assert!(summary.chars().count() <= 101);
    }

    #[test]
    fn contacts_are_scrubbed_before_selection() {
        let summary = fallback_summary("Call +7 (912) 345-67-89 now. Mail me@example.com today.", 3, 900);
        assert!(!summary.contains("345"));
        assert!(!summary.contains("example.com"));
    }

    #[test]
    fn empty_input_yields_placeholder() {
        assert_eq!(fallback_summary("   \n ", 3, 900), PLACEHOLDER);
    }

    #[test]
    fn deterministic_for_identical_input() {
        let text = "Сервис обрабатывает документы. Результат сохраняется в таблицу. Готово.";
        assert_eq!(fallback_summary(text, 3, 900), fallback_summary(text, 3, 900));
    }
}
