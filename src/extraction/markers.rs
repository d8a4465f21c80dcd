//! Page-boundary markers inserted between per-page text.

use regex::Regex;
use std::sync::OnceLock;

/// Marker placed before the text of page `page` (1-based).
pub fn page_marker(page: usize) -> String {
    format!("[[page {page}]]")
}

/// Join per-page text in order, each page preceded by its marker.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    let mut output = String::new();
    for (idx, page) in pages.iter().enumerate() {
        if idx > 0 {
            output.push('\n');
        }
        output.push_str(&page_marker(idx + 1));
        output.push('\n');
        output.push_str(page.as_ref().trim());
    }
    output
}

/// Remove page markers, leaving the page text separated by newlines.
pub fn strip_page_markers(text: &str) -> String {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    let marker = MARKER.get_or_init(|| Regex::new(r"\[\[page \d+\]\]\n?").expect("marker pattern"));
    marker.replace_all(text, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_keeps_page_order_and_empty_pages() {
        let joined = join_pages(&["first", "", " third "]);
        assert_eq!(joined, "[[page 1]]\nfirst\n[[page 2]]\n\n[[page 3]]\nthird");
    }

    #[test]
    fn strip_removes_every_marker() {
        let joined = join_pages(&["alpha", "beta"]);
        assert_eq!(strip_page_markers(&joined), "alpha\nbeta");
        assert_eq!(strip_page_markers(&join_pages(&["", ""])), "");
    }
}
