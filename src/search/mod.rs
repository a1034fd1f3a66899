//! Search results: types, normalization and the caller-facing service.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐   term, offset   ┌──────────────┐   raw bytes   ┌──────────────┐
//! │ SearchService│ ───────────────▶ │ ReplyBridge  │ ────────────▶ │  normalize   │
//! └──────────────┘                  └──────────────┘               └──────────────┘
//!        ▲                                 │                              │
//!        │        serialized ResultSet     │  publish on reply topic      │
//!        └─────────────────────────────────┴──────────────────────────────┘
//! ```

pub mod normalize;
pub mod service;
mod types;

pub use normalize::{normalize, normalize_date};
pub use service::SearchService;
pub use types::{ResultItem, ResultSet, SearchRequest};

use crate::error::BridgeError;
use crate::upstream::UpstreamSource;

/// Turn an error message into a result set the renderer can display.
#[must_use]
pub fn project_error(term: &str, message: impl Into<String>) -> ResultSet {
    ResultSet::soft_error(term, message)
}

/// Fetch and normalize one page, folding every failure into a soft error.
///
/// Upstream failures, undecodable payloads and empty pages all come back as
/// `is_error` result sets; this never fails.
pub fn fetch_result_set(source: &dyn UpstreamSource, request: &SearchRequest) -> ResultSet {
    let term = request.term();
    let outcome = source
        .fetch(term, request.offset())
        .and_then(|raw| normalize(&raw, term, request.offset()));

    match outcome {
        Ok(results) if results.items().is_empty() => {
            tracing::debug!(term, offset = request.offset(), "upstream returned no documents");
            project_error(
                term,
                BridgeError::EmptyResult {
                    term: term.to_string(),
                }
                .to_string(),
            )
        }
        Ok(results) => results,
        Err(err) => {
            tracing::warn!(term, code = %err.code(), error = %err, "search failed upstream");
            project_error(term, err.to_string())
        }
    }
}
