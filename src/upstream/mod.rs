//! Upstream search API access.
//!
//! [`PlosClient`] issues one HTTP GET per call and hands back the raw body;
//! [`classify_term`] decides whether a term is looked up as a DOI or as
//! title text.

mod client;
mod query;

pub use client::{PlosClient, UpstreamSource};
pub use query::{TermKind, build_search_url, classify_term, query_value};
