/**
 * Link Filter
 *
 * Edits may not add URLs or e-mail addresses to a document.
 */

use regex::Regex;
use std::sync::LazyLock;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:https?://|ftp://|www\.)[^\s<>"{}|\\^`\[\]]+"#)
        .expect("URL_PATTERN is a compile-time constant")
});

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
        .expect("EMAIL_PATTERN is a compile-time constant")
});

/// Whether `content` contains a URL or an e-mail address
pub fn contains_links(content: &str) -> bool {
    URL_PATTERN.is_match(content) || EMAIL_PATTERN.is_match(content)
}
