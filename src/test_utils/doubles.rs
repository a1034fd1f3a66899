//! Test doubles for the upstream and broker seams.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::broker::{Broker, MemoryBroker, Subscription};
use crate::error::{BridgeError, Result};
use crate::upstream::UpstreamSource;

use super::fixtures::{plos_doc, plos_response};

/// Upstream that answers every call with the same body.
#[derive(Debug)]
pub struct StaticSource {
    body: Vec<u8>,
    delay: Duration,
    calls: AtomicUsize,
}

impl StaticSource {
    #[must_use]
    pub fn new(body: Vec<u8>) -> Self {
        Self {
            body,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl UpstreamSource for StaticSource {
    fn fetch(&self, _term: &str, _offset: usize) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(self.body.clone())
    }
}

/// Upstream that returns one document whose id and title echo the term,
/// so concurrent callers can check they got their own result.
#[derive(Debug, Default)]
pub struct EchoSource {
    delay: Duration,
}

impl EchoSource {
    #[must_use]
    pub const fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

impl UpstreamSource for EchoSource {
    fn fetch(&self, term: &str, offset: usize) -> Result<Vec<u8>> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(plos_response(
            1,
            offset,
            &[plos_doc(&format!("echo/{term}"), term)],
        ))
    }
}

/// Upstream that always fails as if the host were down.
#[derive(Debug, Default)]
pub struct DownSource;

impl UpstreamSource for DownSource {
    fn fetch(&self, _term: &str, _offset: usize) -> Result<Vec<u8>> {
        Err(BridgeError::UpstreamUnavailable(
            "request failed: connection refused".to_string(),
        ))
    }
}

/// Broker that accepts publishes but never delivers them.
#[derive(Debug, Default)]
pub struct SilentBroker {
    inner: MemoryBroker,
    dropped: AtomicUsize,
}

impl SilentBroker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes swallowed so far.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }
}

impl Broker for SilentBroker {
    fn name(&self) -> &str {
        "silent"
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    fn subscribe_sync(&self, topic: &str) -> Result<Subscription> {
        self.inner.subscribe_sync(topic)
    }

    fn publish(&self, _topic: &str, _payload: &[u8]) -> Result<()> {
        self.dropped.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn unsubscribe(&self, sid: u64) -> Result<()> {
        self.inner.unsubscribe(sid)
    }

    fn live_subscriptions(&self) -> usize {
        self.inner.live_subscriptions()
    }
}
