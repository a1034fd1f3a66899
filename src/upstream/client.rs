use std::time::Duration;

use crate::config::UpstreamConfig;
use crate::error::{BridgeError, Result};

use super::query::{build_search_url, classify_term};

const USER_AGENT: &str = concat!("paperbridge/", env!("CARGO_PKG_VERSION"));

/// Source of raw upstream search payloads.
///
/// Implementations return the wire bytes untouched; decoding belongs to the
/// normalizer.
pub trait UpstreamSource: Send + Sync {
    /// Fetch one page of results for `term` starting at `offset`.
    fn fetch(&self, term: &str, offset: usize) -> Result<Vec<u8>>;
}

/// HTTP client for the PLOS Solr search API.
pub struct PlosClient {
    client: reqwest::blocking::Client,
    base_url: String,
    fields: Vec<String>,
}

impl std::fmt::Debug for PlosClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlosClient")
            .field("base_url", &self.base_url)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl PlosClient {
    pub fn from_config(config: &UpstreamConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(BridgeError::MissingConfig("upstream.base_url".to_string()));
        }
        if config.fields.is_empty() {
            return Err(BridgeError::Config(
                "upstream.fields is empty; the search API needs a field list".to_string(),
            ));
        }
        Self::new(&config.base_url, config.fields.clone(), config.timeout())
    }

    pub fn new(base_url: &str, fields: Vec<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| BridgeError::Config(format!("upstream http client: {err}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            fields,
        })
    }
}

impl UpstreamSource for PlosClient {
    fn fetch(&self, term: &str, offset: usize) -> Result<Vec<u8>> {
        let url = build_search_url(&self.base_url, term, offset, &self.fields)?;
        tracing::debug!(%url, kind = ?classify_term(term), "querying upstream");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .map_err(|err| BridgeError::UpstreamUnavailable(format!("request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::UpstreamUnavailable(format!("HTTP {status}")));
        }

        response
            .bytes()
            .map(|body| body.to_vec())
            .map_err(|err| BridgeError::UpstreamUnavailable(format!("read body failed: {err}")))
    }
}
