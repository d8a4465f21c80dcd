//! Local keyword extraction.
//!
//! Content tokens form runs split at stopwords, punctuation and short tokens (RAKE). Every
//! window of one up to `max_phrase_words` words inside a run is a candidate. Each word scores
//! `degree / frequency`; a phrase scores the sum of its word scores, boosted by
//! `ln(1 + occurrences)` so repeated phrases outrank one-off ones. A phrase already contained
//! in a higher-ranked one is skipped.

mod stopwords;

pub use stopwords::is_stopword;

use serde::Serialize;
use std::collections::HashMap;

use crate::config::Config;

/// Ordered, duplicate-free keyword phrases, most relevant first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct KeywordSet(Vec<String>);

impl KeywordSet {
    /// Phrases in relevance order.
    pub fn phrases(&self) -> &[String] {
        &self.0
    }

    /// Number of phrases.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no phrase was found.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Phrases joined with `separator`.
    pub fn join(&self, separator: &str) -> String {
        self.0.join(separator)
    }
}

/// Tunables for keyword extraction.
#[derive(Debug, Clone)]
pub struct KeywordSettings {
    /// Phrases below this count are logged, never padded.
    pub min_keywords: usize,
    /// Upper bound on returned phrases.
    pub max_keywords: usize,
    /// Longest candidate phrase in words.
    pub max_phrase_words: usize,
    /// Shortest token, in letters, that can belong to a phrase.
    pub min_token_chars: usize,
}

impl Default for KeywordSettings {
    fn default() -> Self {
        Self {
            min_keywords: 5,
            max_keywords: 10,
            max_phrase_words: 2,
            min_token_chars: 3,
        }
    }
}

impl KeywordSettings {
    /// Settings derived from the runtime configuration.
    pub fn from_config(_config: &Config) -> Self {
        Self::default()
    }
}

/// Deterministic RAKE-style extractor.
#[derive(Debug, Clone, Default)]
pub struct KeywordExtractor {
    settings: KeywordSettings,
}

impl KeywordExtractor {
    /// Build an extractor with explicit settings.
    pub fn new(settings: KeywordSettings) -> Self {
        Self { settings }
    }

    /// Extract using the configured bounds.
    pub fn extract(&self, text: &str) -> KeywordSet {
        self.extract_keywords(text, self.settings.min_keywords, self.settings.max_keywords)
    }

    /// Extract at most `max` phrases. Short texts may yield fewer than `min`.
    pub fn extract_keywords(&self, text: &str, min: usize, max: usize) -> KeywordSet {
        let runs = self.runs(text);
        if runs.is_empty() || max == 0 {
            return KeywordSet::default();
        }
        let max_words = self.settings.max_phrase_words.max(1);

        // Degree counts only the words a phrase can actually span, so long runs do not
        // outweigh short ones.
        let mut word_frequency: HashMap<&str, f64> = HashMap::new();
        let mut word_degree: HashMap<&str, f64> = HashMap::new();
        for run in &runs {
            let span = run.len().min(max_words) as f64;
            for word in run {
                *word_frequency.entry(word.as_str()).or_default() += 1.0;
                *word_degree.entry(word.as_str()).or_default() += span;
            }
        }

        // phrase -> (first occurrence, occurrences, base score)
        let mut phrases: HashMap<String, (usize, usize, f64)> = HashMap::new();
        let mut position = 0;
        for run in &runs {
            for start in 0..run.len() {
                for window in (1..=max_words).filter_map(|len| run.get(start..start + len)) {
                    let entry = phrases.entry(window.join(" ")).or_insert_with(|| {
                        let base = window
                            .iter()
                            .map(|word| word_degree[word.as_str()] / word_frequency[word.as_str()])
                            .sum();
                        (position, 0, base)
                    });
                    entry.1 += 1;
                    position += 1;
                }
            }
        }

        let mut ranked: Vec<(String, usize, f64)> = phrases
            .into_iter()
            .map(|(phrase, (first, count, base))| {
                (phrase, first, base * (1.0 + (count as f64).ln_1p()))
            })
            .collect();
        ranked.sort_by(|a, b| b.2.total_cmp(&a.2).then(a.1.cmp(&b.1)));

        let mut keywords: Vec<String> = Vec::new();
        for (phrase, _, _) in ranked {
            if keywords.len() == max {
                break;
            }
            if keywords.iter().any(|kept| covers(kept, &phrase)) {
                continue;
            }
            keywords.push(phrase);
        }
        if keywords.len() < min {
            tracing::debug!(found = keywords.len(), min, "Fewer keywords than requested");
        }
        KeywordSet(keywords)
    }

    /// Maximal runs of content words in document order, each lowercased.
    fn runs(&self, text: &str) -> Vec<Vec<String>> {
        let mut runs = Vec::new();
        let mut run: Vec<String> = Vec::new();
        let mut word = String::new();

        let flush_run = |run: &mut Vec<String>, runs: &mut Vec<Vec<String>>| {
            if !run.is_empty() {
                runs.push(std::mem::take(run));
            }
        };

        for ch in text.chars().chain(std::iter::once(' ')) {
            if ch.is_alphabetic() {
                word.extend(ch.to_lowercase());
                continue;
            }
            if !word.is_empty() {
                let token = std::mem::take(&mut word);
                if token.chars().count() < self.settings.min_token_chars || is_stopword(&token) {
                    flush_run(&mut run, &mut runs);
                } else {
                    run.push(token);
                }
            }
            if !ch.is_whitespace() {
                flush_run(&mut run, &mut runs);
            }
        }
        flush_run(&mut run, &mut runs);
        runs
    }
}

/// Whether `phrase` is a strictly shorter word sequence inside `kept`.
fn covers(kept: &str, phrase: &str) -> bool {
    let kept: Vec<&str> = kept.split(' ').collect();
    let words: Vec<&str> = phrase.split(' ').collect();
    words.len() < kept.len() && kept.windows(words.len()).any(|window| window == words.as_slice())
}

/// Extract keywords with default settings.
pub fn extract_keywords(text: &str, min: usize, max: usize) -> KeywordSet {
    KeywordExtractor::default().extract_keywords(text, min, max)
}
