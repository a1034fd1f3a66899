//! Upstream query construction.
//!
//! Identifier lookups and free-text lookups use different `q` parameters:
//! a DOI is matched exactly against the `id` field, anything else is a
//! percent-encoded search on `title`.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{BridgeError, Result};

/// Crossref's recommended DOI pattern, with lowercase letters allowed.
static DOI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^10\.\d{4,9}/[-._;()/:a-zA-Z0-9]+$").expect("DOI pattern is valid")
});

/// How a search term is looked up upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
    /// A document identifier (DOI), looked up exactly.
    Identifier,
    /// Free text matched against titles.
    Title,
}

/// Classify a (trimmed) search term.
#[must_use]
pub fn classify_term(term: &str) -> TermKind {
    if DOI_PATTERN.is_match(term.trim()) {
        TermKind::Identifier
    } else {
        TermKind::Title
    }
}

/// The `q` parameter value for `term`, already encoded for a query string.
#[must_use]
pub fn query_value(term: &str) -> String {
    let term = term.trim();
    match classify_term(term) {
        TermKind::Identifier => format!("id:%22{term}%22"),
        TermKind::Title => format!("title:{}", urlencoding::encode(term)),
    }
}

/// Full upstream GET URL for one page of results.
pub fn build_search_url(
    base_url: &str,
    term: &str,
    offset: usize,
    fields: &[String],
) -> Result<String> {
    if term.trim().is_empty() {
        return Err(BridgeError::InvalidRequest(
            "search term is empty".to_string(),
        ));
    }
    let separator = if base_url.contains('?') { '&' } else { '?' };
    Ok(format!(
        "{base_url}{separator}q={}&fl={}&start={offset}",
        query_value(term),
        fields.join(",")
    ))
}
