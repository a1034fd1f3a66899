//! Upstream payload decoding.
//!
//! The search API answers with a Solr envelope:
//! `{ "response": { "numFound": N, "start": S, "docs": [...] } }`.

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

use crate::error::{BridgeError, Result};

use super::types::{ResultItem, ResultSet};

#[derive(Debug, Deserialize)]
struct Envelope {
    response: Option<EnvelopeBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeBody {
    #[serde(default)]
    num_found: u64,
    #[serde(default)]
    docs: Vec<UpstreamDoc>,
}

#[derive(Debug, Deserialize)]
struct UpstreamDoc {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    abstract_primary_display: Vec<String>,
    #[serde(default)]
    journal: String,
    #[serde(default)]
    author: Vec<String>,
    #[serde(default)]
    publication_date: String,
}

impl From<UpstreamDoc> for ResultItem {
    fn from(doc: UpstreamDoc) -> Self {
        Self {
            published_at: normalize_date(&doc.publication_date),
            id: doc.id,
            title: doc.title,
            abstract_paragraphs: doc.abstract_primary_display,
            venue: doc.journal,
            authors: doc.author,
        }
    }
}

/// Decode an upstream payload into a result set for `term` starting at
/// `offset`.
///
/// An empty document list is a valid, successful result set here; turning it
/// into a "nothing found" message is the bridge's job.
pub fn normalize(raw: &[u8], term: &str, offset: usize) -> Result<ResultSet> {
    let envelope: Envelope = serde_json::from_slice(raw)
        .map_err(|err| BridgeError::MalformedUpstreamPayload(err.to_string()))?;
    let body = envelope.response.ok_or_else(|| {
        BridgeError::MalformedUpstreamPayload("missing \"response\" object".to_string())
    })?;

    let items: Vec<ResultItem> = body.docs.into_iter().map(ResultItem::from).collect();
    ResultSet::success(term, body.num_found, offset, items)
}

/// Reformat an upstream timestamp to `YYYY-MM-DD`.
///
/// Values that do not parse are returned unchanged.
#[must_use]
pub fn normalize_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return ts.date_naive().format("%Y-%m-%d").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    raw.to_string()
}
