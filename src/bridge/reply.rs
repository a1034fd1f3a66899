//! Per-request reply channels.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::broker::{Broker, Message, Subscription};
use crate::cancel::CancelToken;
use crate::error::Result;

pub const DEFAULT_INBOX_PREFIX: &str = "_INBOX";

/// Mints reply topics and subscribes to them.
#[derive(Debug, Clone)]
pub struct ReplyChannelAllocator {
    prefix: String,
}

impl ReplyChannelAllocator {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// A fresh topic name: `<prefix>.<random 128-bit id>`.
    #[must_use]
    pub fn next_topic(&self) -> String {
        format!("{}.{}", self.prefix, Uuid::new_v4().simple())
    }

    /// Subscribe to a fresh topic on `broker`. The subscription is active
    /// when this returns.
    pub fn allocate(&self, broker: &Arc<dyn Broker>) -> Result<ReplyChannel> {
        let topic = self.next_topic();
        let subscription = broker.subscribe_sync(&topic)?;
        Ok(ReplyChannel {
            broker: Arc::clone(broker),
            subscription,
            released: false,
        })
    }
}

impl Default for ReplyChannelAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_INBOX_PREFIX)
    }
}

/// An exclusive, single-use reply subscription.
///
/// Released explicitly with [`ReplyChannel::release`] or on drop, whichever
/// comes first.
#[derive(Debug)]
pub struct ReplyChannel {
    broker: Arc<dyn Broker>,
    subscription: Subscription,
    released: bool,
}

impl ReplyChannel {
    #[must_use]
    pub fn topic(&self) -> &str {
        self.subscription.topic()
    }

    pub fn receive(&self, timeout: Duration, cancel: &CancelToken) -> Result<Message> {
        self.subscription.receive(timeout, cancel)
    }

    /// Unsubscribe. Safe to call more than once.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(err) = self.broker.unsubscribe(self.subscription.sid()) {
            tracing::warn!(topic = self.topic(), error = %err, "failed to release reply channel");
        }
    }
}

impl Drop for ReplyChannel {
    fn drop(&mut self) {
        self.release();
    }
}
