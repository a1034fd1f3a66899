//! Search request and result-set types.
//!
//! `ResultSet` keeps its fields private: the only ways to obtain one are
//! [`ResultSet::success`], [`ResultSet::soft_error`] and deserialization,
//! and all three uphold the same invariants:
//!
//! - `is_error` implies `items` is empty and `error_message` is non-empty
//! - `next_offset == offset + items.len()`

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Fallback message for a soft error built from a blank reason.
const UNKNOWN_ERROR: &str = "unknown error";

/// One search call: what to look for and where to start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    term: String,
    offset: usize,
}

impl SearchRequest {
    #[must_use]
    pub fn new(term: impl Into<String>, offset: usize) -> Self {
        Self {
            term: term.into(),
            offset,
        }
    }

    #[must_use]
    pub fn term(&self) -> &str {
        &self.term
    }

    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }
}

/// A single normalized document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub abstract_paragraphs: Vec<String>,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub authors: Vec<String>,
    /// `YYYY-MM-DD` when the upstream date parsed, the raw value otherwise.
    #[serde(default)]
    pub published_at: String,
}

/// Canonical search outcome handed to rendering collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ResultSetWire")]
pub struct ResultSet {
    search_term: String,
    total_found: u64,
    offset: usize,
    next_offset: usize,
    items: Vec<ResultItem>,
    is_error: bool,
    error_message: String,
}

impl ResultSet {
    /// A successful page of results.
    ///
    /// Fails when `offset` is so large that the page end is not addressable.
    pub fn success(
        search_term: impl Into<String>,
        total_found: u64,
        offset: usize,
        items: Vec<ResultItem>,
    ) -> Result<Self> {
        let next_offset = page_end(offset, items.len()).ok_or_else(|| {
            BridgeError::InvalidRequest(format!(
                "offset {offset} leaves no room for {} results",
                items.len()
            ))
        })?;
        Ok(Self {
            search_term: search_term.into(),
            total_found,
            offset,
            next_offset,
            items,
            is_error: false,
            error_message: String::new(),
        })
    }

    /// A result set flagged as an error for rendering purposes.
    #[must_use]
    pub fn soft_error(search_term: impl Into<String>, message: impl Into<String>) -> Self {
        let mut error_message: String = message.into();
        if error_message.trim().is_empty() {
            error_message = UNKNOWN_ERROR.to_string();
        }
        Self {
            search_term: search_term.into(),
            total_found: 0,
            offset: 0,
            next_offset: 0,
            items: Vec::new(),
            is_error: true,
            error_message,
        }
    }

    /// Decode and validate a serialized result set (e.g. a broker reply).
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    #[must_use]
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    #[must_use]
    pub const fn total_found(&self) -> u64 {
        self.total_found
    }

    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub const fn next_offset(&self) -> usize {
        self.next_offset
    }

    #[must_use]
    pub fn items(&self) -> &[ResultItem] {
        &self.items
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.is_error
    }

    /// Empty unless `is_error()`.
    #[must_use]
    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    /// Whether another page may follow this one.
    #[must_use]
    pub fn has_more(&self) -> bool {
        !self.is_error && (self.next_offset as u64) < self.total_found
    }

    /// Offset of the previous page for a page size equal to this page.
    #[must_use]
    pub fn previous_offset(&self) -> Option<usize> {
        if self.offset == 0 || self.is_error {
            return None;
        }
        Some(self.offset.saturating_sub(self.items.len().max(1)))
    }
}

fn page_end(offset: usize, len: usize) -> Option<usize> {
    offset.checked_add(len)
}

/// Unvalidated wire shape; converted through [`ResultSet::try_from`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSetWire {
    search_term: String,
    #[serde(default)]
    total_found: u64,
    #[serde(default)]
    offset: usize,
    #[serde(default)]
    next_offset: usize,
    #[serde(default)]
    items: Vec<ResultItem>,
    #[serde(default)]
    is_error: bool,
    #[serde(default)]
    error_message: String,
}

impl TryFrom<ResultSetWire> for ResultSet {
    type Error = String;

    fn try_from(wire: ResultSetWire) -> std::result::Result<Self, String> {
        if wire.is_error {
            if !wire.items.is_empty() {
                return Err("error result set carries items".to_string());
            }
            if wire.error_message.trim().is_empty() {
                return Err("error result set without a message".to_string());
            }
            return Ok(Self::soft_error(wire.search_term, wire.error_message));
        }

        if page_end(wire.offset, wire.items.len()) != Some(wire.next_offset) {
            return Err(format!(
                "nextOffset {} does not match offset {} + {} items",
                wire.next_offset,
                wire.offset,
                wire.items.len()
            ));
        }
        Self::success(
            wire.search_term,
            wire.total_found,
            wire.offset,
            wire.items,
        )
        .map_err(|err| err.to_string())
    }
}
