use std::sync::Arc;

use crate::cancel::CancelToken;
use crate::error::{BridgeError, Result};
use crate::search::{SearchRequest, fetch_result_set};
use crate::upstream::UpstreamSource;

use super::ReplyBridge;

/// Bridge that skips the broker and returns the result in-process.
///
/// Useful where no broker is deployed. The deployment context is ignored.
pub struct DirectBridge {
    source: Arc<dyn UpstreamSource>,
}

impl DirectBridge {
    #[must_use]
    pub fn new(source: Arc<dyn UpstreamSource>) -> Self {
        Self { source }
    }
}

impl ReplyBridge for DirectBridge {
    fn query(
        &self,
        request: &SearchRequest,
        _in_cloud: bool,
        cancel: &CancelToken,
    ) -> Result<Vec<u8>> {
        if cancel.is_cancelled() {
            return Err(BridgeError::Cancelled {
                topic: "direct".to_string(),
            });
        }
        let results = fetch_result_set(self.source.as_ref(), request);
        tracing::debug!(
            term = request.term(),
            is_error = results.is_error(),
            "direct search complete"
        );
        results.to_vec()
    }
}
