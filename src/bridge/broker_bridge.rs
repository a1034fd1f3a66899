use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::broker::BrokerPool;
use crate::cancel::CancelToken;
use crate::error::{BridgeError, Result};
use crate::search::{SearchRequest, fetch_result_set};
use crate::upstream::UpstreamSource;

use super::{ReplyBridge, ReplyChannelAllocator};

/// Bridge that delivers every result through a fresh broker reply topic.
///
/// Per request: select broker, subscribe to a unique topic, fetch and
/// normalize, publish once, wait at most `reply_timeout`, unsubscribe.
pub struct BrokerBridge {
    brokers: BrokerPool,
    source: Arc<dyn UpstreamSource>,
    allocator: ReplyChannelAllocator,
    reply_timeout: Duration,
}

impl BrokerBridge {
    #[must_use]
    pub const fn new(
        brokers: BrokerPool,
        source: Arc<dyn UpstreamSource>,
        allocator: ReplyChannelAllocator,
        reply_timeout: Duration,
    ) -> Self {
        Self {
            brokers,
            source,
            allocator,
            reply_timeout,
        }
    }

    #[must_use]
    pub const fn reply_timeout(&self) -> Duration {
        self.reply_timeout
    }
}

impl ReplyBridge for BrokerBridge {
    fn query(
        &self,
        request: &SearchRequest,
        in_cloud: bool,
        cancel: &CancelToken,
    ) -> Result<Vec<u8>> {
        let span = tracing::debug_span!(
            "bridge_query",
            term = request.term(),
            offset = request.offset(),
            in_cloud
        );
        let _enter = span.enter();

        let broker = self.brokers.select(in_cloud)?;
        let mut channel = self.allocator.allocate(&broker)?;
        debug!(broker = broker.name(), topic = channel.topic(), "subscribed");

        if cancel.is_cancelled() {
            return Err(cancelled(channel.topic()));
        }

        let results = fetch_result_set(self.source.as_ref(), request);
        debug!(
            is_error = results.is_error(),
            items = results.items().len(),
            "fetched"
        );

        let payload = results.to_vec()?;
        broker.publish(channel.topic(), &payload)?;
        debug!(bytes = payload.len(), "published");

        // A cancel that arrived during fetch or publish must not be raced
        // against the reply that is now queued.
        if cancel.is_cancelled() {
            debug!("cancelled before waiting");
            return Err(cancelled(channel.topic()));
        }

        let reply = channel.receive(self.reply_timeout, cancel);
        channel.release();

        match reply {
            Ok(message) => {
                debug!("reply received");
                Ok(message.payload)
            }
            Err(err) => {
                warn!(code = %err.code(), error = %err, "no reply delivered");
                Err(err)
            }
        }
    }
}

fn cancelled(topic: &str) -> BridgeError {
    BridgeError::Cancelled {
        topic: topic.to_string(),
    }
}
