//! Syntactic URL validation. Pure and deterministic; no network lookups.

use std::sync::LazyLock;

use regex::Regex;

use crate::CoreError;

/// Absolute http(s) URL whose host is a dotted domain with a 2-6 letter TLD,
/// `localhost`, or a dotted quad, with an optional port and an optional
/// non-whitespace path or query.
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^https?://",
        r"(?:(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+[A-Z]{2,6}\.?",
        r"|localhost",
        r"|\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})",
        r"(?::\d+)?",
        r"(?:/?|[/?]\S+)$",
    ))
    .expect("url pattern is valid")
});

/// Placeholder a form typically pre-fills; submitting it unchanged counts as empty.
const PLACEHOLDER: &str = "https://";

/// Returns true when `s` is a well-formed absolute HTTP/HTTPS URL.
pub fn is_valid_url(s: &str) -> bool {
    URL_RE.is_match(s)
}

/// Validate an original URL before shortening, telling an empty submission
/// apart from a malformed one.
pub fn validate_original_url(s: &str) -> Result<(), CoreError> {
    if s.is_empty() || s == PLACEHOLDER {
        return Err(CoreError::EmptyUrl);
    }
    if !is_valid_url(s) {
        return Err(CoreError::InvalidUrl(
            "expected an absolute http or https URL".into(),
        ));
    }
    Ok(())
}
