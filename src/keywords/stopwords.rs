//! English and Russian stopwords that break candidate phrases.

use std::collections::HashSet;
use std::sync::OnceLock;

const ENGLISH: &[&str] = &[
    "about", "above", "after", "again", "against", "all", "also", "and", "any", "are", "because",
    "been", "before", "being", "below", "between", "both", "but", "can", "could", "did", "does",
    "doing", "down", "during", "each", "either", "else", "ever", "every", "few", "for", "from",
    "further", "had", "has", "have", "having", "her", "here", "hers", "herself", "him", "himself",
    "his", "how", "however", "into", "its", "itself", "just", "may", "might", "more", "most",
    "much", "must", "myself", "neither", "nor", "not", "now", "off", "once", "one", "only",
    "other", "ought", "our", "ours", "ourselves", "out", "over", "own", "per", "same", "shall",
    "she", "should", "since", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "though", "through", "thus",
    "too", "under", "until", "upon", "very", "via", "was", "were", "what", "when", "where",
    "whether", "which", "while", "who", "whom", "whose", "why", "will", "with", "within",
    "without", "would", "yet", "you", "your", "yours", "yourself", "yourselves",
];

const RUSSIAN: &[&str] = &[
    "без", "более", "больше", "будет", "будто", "бы", "был", "была", "были", "было", "быть",
    "вам", "вас", "весь", "вот", "все", "всего", "всех", "всё", "вы", "где", "да", "даже",
    "для", "до", "его", "ее", "её", "если", "есть", "еще", "ещё", "же", "за", "здесь", "из",
    "или", "им", "их", "как", "какая", "какой", "когда", "кто", "ли", "либо", "между", "меня",
    "мне", "может", "можно", "мой", "мы", "на", "над", "надо", "наш", "не", "него", "нее",
    "неё", "нет", "ни", "них", "но", "ну", "об", "однако", "он", "она", "они", "оно", "от",
    "очень", "по", "под", "после", "потом", "потому", "при", "про", "раз", "разве", "сам",
    "свой", "себе", "себя", "со", "так", "также", "такой", "там", "тем", "теперь", "то",
    "тогда", "того", "тоже", "только", "том", "тот", "тут", "ты", "уже", "чем", "через", "что",
    "чтобы", "чуть", "эти", "этим", "этого", "этой", "этом", "этот", "эту", "это",
];

fn stopwords() -> &'static HashSet<&'static str> {
    static STOPWORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    STOPWORDS.get_or_init(|| ENGLISH.iter().chain(RUSSIAN).copied().collect())
}

/// Whether the lowercased token is a stopword in either language.
pub fn is_stopword(token: &str) -> bool {
    stopwords().contains(token)
}
