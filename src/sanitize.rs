//! Helpers for normalizing metadata values and scrubbing contact details from text.

use regex::Regex;
use std::sync::OnceLock;

/// Placeholder substituted for optional record fields that were not supplied.
pub const UNKNOWN: &str = "unknown";

/// Sanitize arbitrary string input by trimming whitespace and dropping empties.
pub fn sanitize_string(value: Option<String>) -> Option<String> {
    value.and_then(|input| {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Uploader label: `@username` when a username exists, otherwise the numeric identity.
pub fn uploader_label(username: Option<String>, user_id: Option<String>) -> Option<String> {
    sanitize_string(username)
        .map(|name| {
            if name.starts_with('@') {
                name
            } else {
                format!("@{name}")
            }
        })
        .or_else(|| sanitize_string(user_id))
}

struct ContactPatterns {
    email: Regex,
    handle: Regex,
    phone: Regex,
    label: Regex,
    whitespace: Regex,
}

fn contact_patterns() -> &'static ContactPatterns {
    static PATTERNS: OnceLock<ContactPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| ContactPatterns {
        email: Regex::new(r"\b[\w.\-]+@[\w.\-]+\.\w+\b").expect("email pattern"),
        handle: Regex::new(r"@\w{3,}").expect("handle pattern"),
        phone: Regex::new(r"\+?\d[\d\s\-()]{7,}\d").expect("phone pattern"),
        label: Regex::new(r"(?i)\b(?:e-?mail|тел\.?|телефон)\b\s*[:\-]?\s*").expect("label pattern"),
        whitespace: Regex::new(r"\s+").expect("whitespace pattern"),
    })
}

/// Remove e-mail addresses, @handles, phone numbers and contact labels, then collapse whitespace.
pub fn scrub_contacts(text: &str) -> String {
    let patterns = contact_patterns();
    let text = patterns.email.replace_all(text, " ");
    let text = patterns.handle.replace_all(&text, " ");
    let text = patterns.phone.replace_all(&text, " ");
    let text = patterns.label.replace_all(&text, " ");
    patterns
        .whitespace
        .replace_all(&text, " ")
        .trim()
        .to_string()
}

/// Collapse runs of whitespace into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_string_trims_and_drops_empty() {
        assert_eq!(sanitize_string(Some("  doc  ".into())), Some("doc".into()));
        assert_eq!(sanitize_string(Some("   ".into())), None);
        assert_eq!(sanitize_string(None), None);
    }

    #[test]
    fn uploader_prefers_username() {
        assert_eq!(
            uploader_label(Some("alice".into()), Some("42".into())),
            Some("@alice".into())
        );
        assert_eq!(
            uploader_label(Some("@bob".into()), None),
            Some("@bob".into())
        );
        assert_eq!(uploader_label(Some(" ".into()), Some("42".into())), Some("42".into()));
        assert_eq!(uploader_label(None, None), None);
    }

    #[test]
    fn scrub_removes_contacts() {
        let scrubbed = scrub_contacts(
            "Write to jane.doe@example.org or ping @jane_doe.\nPhone: +1 (555) 123-4567 today.",
        );
        assert!(!scrubbed.contains("example.org"));
        assert!(!scrubbed.contains("jane_doe"));
        assert!(!scrubbed.contains("555"));
        assert!(!scrubbed.contains('\n'));
        assert!(scrubbed.starts_with("Write to"));
        assert!(scrubbed.ends_with("today."));
    }

    #[test]
    fn scrub_removes_cyrillic_labels() {
        let scrubbed = scrub_contacts("Контакт тел.: 8 800 555 35 35 отдел продаж");
        assert!(!scrubbed.contains("тел"));
        assert!(!scrubbed.contains("555"));
        assert!(scrubbed.contains("отдел продаж"));
    }
}
