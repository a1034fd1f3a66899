//! Caller-facing search entry point.

use std::sync::Arc;

use crate::bridge::ReplyBridge;
use crate::cancel::CancelToken;
use crate::error::Result;

use super::{ResultSet, SearchRequest, project_error};

/// Blocking search over a [`ReplyBridge`].
///
/// Safe to share between threads; every call is independent.
#[derive(Clone)]
pub struct SearchService {
    bridge: Arc<dyn ReplyBridge>,
}

impl SearchService {
    #[must_use]
    pub fn new(bridge: Arc<dyn ReplyBridge>) -> Self {
        Self { bridge }
    }

    /// Search for `term` starting at `offset`.
    ///
    /// `Ok` carries either results or a soft error; `Err` means no result
    /// set was delivered (timeout, broker down, cancelled).
    pub fn search(&self, term: &str, offset: usize, in_cloud: bool) -> Result<ResultSet> {
        self.search_with_cancel(term, offset, in_cloud, &CancelToken::new())
    }

    pub fn search_with_cancel(
        &self,
        term: &str,
        offset: usize,
        in_cloud: bool,
        cancel: &CancelToken,
    ) -> Result<ResultSet> {
        let request = SearchRequest::new(term, offset);
        let reply = self.bridge.query(&request, in_cloud, cancel)?;
        ResultSet::from_slice(&reply)
    }

    /// Collapse a search outcome into something renderable.
    #[must_use]
    pub fn render_outcome(term: &str, outcome: Result<ResultSet>) -> ResultSet {
        outcome.unwrap_or_else(|err| project_error(term, err.to_string()))
    }
}

impl std::fmt::Debug for SearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchService").finish_non_exhaustive()
    }
}
