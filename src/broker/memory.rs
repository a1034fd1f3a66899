//! In-process broker.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crossbeam_channel::{Sender, unbounded};
use parking_lot::Mutex;

use crate::error::{BridgeError, Result};

use super::{Broker, Message, Subscription, validate_topic};

/// Broker that lives entirely inside the current process.
///
/// Subscriptions are registered under the registry lock before
/// `subscribe_sync` returns, so delivery to a fresh subscriber is immediate.
#[derive(Debug)]
pub struct MemoryBroker {
    name: String,
    registry: Mutex<Registry>,
    next_sid: AtomicU64,
    closed: AtomicBool,
}

#[derive(Debug, Default)]
struct Registry {
    topics: HashMap<String, Vec<u64>>,
    subscribers: HashMap<u64, Entry>,
}

#[derive(Debug)]
struct Entry {
    topic: String,
    sender: Sender<Message>,
}

impl MemoryBroker {
    #[must_use]
    pub fn new() -> Self {
        Self::named("mem://local")
    }

    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry: Mutex::new(Registry::default()),
            next_sid: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    /// Shut the broker down. Every open subscription observes a closed
    /// channel and further publishes fail.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let mut registry = self.registry.lock();
        registry.topics.clear();
        registry.subscribers.clear();
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BridgeError::BrokerUnavailable(format!(
                "{} is closed",
                self.name
            )));
        }
        Ok(())
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl Broker for MemoryBroker {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    fn subscribe_sync(&self, topic: &str) -> Result<Subscription> {
        validate_topic(topic)?;
        self.ensure_open()?;

        let sid = self.next_sid.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = unbounded();
        let mut registry = self.registry.lock();
        registry
            .topics
            .entry(topic.to_string())
            .or_default()
            .push(sid);
        registry.subscribers.insert(
            sid,
            Entry {
                topic: topic.to_string(),
                sender,
            },
        );
        Ok(Subscription::new(sid, topic, receiver))
    }

    fn publish(&self, topic: &str, payload: &[u8]) -> Result<()> {
        validate_topic(topic)?;
        self.ensure_open()?;

        let registry = self.registry.lock();
        let Some(sids) = registry.topics.get(topic) else {
            tracing::trace!(topic, "publish with no subscribers");
            return Ok(());
        };
        for sid in sids {
            if let Some(entry) = registry.subscribers.get(sid) {
                // A dropped receiver just means nobody is listening any more.
                let _ = entry.sender.send(Message {
                    topic: topic.to_string(),
                    payload: payload.to_vec(),
                });
            }
        }
        Ok(())
    }

    fn unsubscribe(&self, sid: u64) -> Result<()> {
        let mut registry = self.registry.lock();
        if let Some(entry) = registry.subscribers.remove(&sid) {
            if let Some(sids) = registry.topics.get_mut(&entry.topic) {
                sids.retain(|other| *other != sid);
                if sids.is_empty() {
                    registry.topics.remove(&entry.topic);
                }
            }
        }
        Ok(())
    }

    fn live_subscriptions(&self) -> usize {
        self.registry.lock().subscribers.len()
    }
}
