//! Publish/subscribe broker clients.
//!
//! The bridge only needs four primitives: synchronous subscribe, publish,
//! a bounded receive on a subscription, and unsubscribe. [`Broker`] captures
//! those; [`MemoryBroker`] runs in-process and [`NatsBroker`] talks to a NATS
//! server through `async-nats`.
//!
//! Broker handles are long-lived and shared (`Arc<dyn Broker>`); the process
//! bootstrap builds them and hands them to the bridge through a
//! [`BrokerPool`].

mod memory;
mod nats;
mod pool;

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, select};

use crate::cancel::CancelToken;
use crate::error::{BridgeError, Result};

pub use memory::MemoryBroker;
pub use nats::NatsBroker;
pub use pool::BrokerPool;

/// A message delivered on a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Client side of a publish/subscribe broker.
///
/// Implementations must be safe for concurrent use from many request threads.
pub trait Broker: Send + Sync + std::fmt::Debug {
    /// Short name for logs (e.g. the server URL).
    fn name(&self) -> &str;

    /// Whether the client can still publish and receive.
    fn is_connected(&self) -> bool;

    /// Subscribe to `topic`. Returns only once the subscription is active,
    /// so a publish issued afterwards cannot be missed.
    fn subscribe_sync(&self, topic: &str) -> Result<Subscription>;

    /// Publish `payload` to every current subscriber of `topic`.
    fn publish(&self, topic: &str, payload: &[u8]) -> Result<()>;

    /// Drop subscription `sid`. Unknown or already-removed ids are a no-op.
    fn unsubscribe(&self, sid: u64) -> Result<()>;

    /// Number of subscriptions currently registered on this client.
    fn live_subscriptions(&self) -> usize;
}

/// Receiving end of one subscription.
///
/// Dropping a `Subscription` does not unsubscribe it; whoever created it
/// (normally a `ReplyChannel`) is responsible for calling
/// [`Broker::unsubscribe`].
#[derive(Debug)]
pub struct Subscription {
    sid: u64,
    topic: String,
    receiver: Receiver<Message>,
}

impl Subscription {
    #[must_use]
    pub fn new(sid: u64, topic: impl Into<String>, receiver: Receiver<Message>) -> Self {
        Self {
            sid,
            topic: topic.into(),
            receiver,
        }
    }

    #[must_use]
    pub const fn sid(&self) -> u64 {
        self.sid
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Block for at most `timeout` for the next message.
    ///
    /// Returns `ReplyTimeout` when nothing arrives in time, `Cancelled` when
    /// `cancel` fires first and `BrokerUnavailable` when the broker drops the
    /// subscription (connection lost). A token cancelled before the call wins
    /// over a message that is already queued.
    pub fn receive(&self, timeout: Duration, cancel: &CancelToken) -> Result<Message> {
        if cancel.is_cancelled() {
            return Err(self.cancelled());
        }
        select! {
            recv(self.receiver) -> message => message.map_err(|_| {
                BridgeError::BrokerUnavailable(format!(
                    "subscription {} on {} closed by broker",
                    self.sid, self.topic
                ))
            }),
            recv(cancel.signal()) -> _ => Err(self.cancelled()),
            default(timeout) => Err(BridgeError::ReplyTimeout {
                topic: self.topic.clone(),
                waited: timeout,
            }),
        }
    }

    fn cancelled(&self) -> BridgeError {
        BridgeError::Cancelled {
            topic: self.topic.clone(),
        }
    }
}

/// Build a broker client for `url`.
///
/// `mem://<name>` creates an in-process broker; `nats://host[:port]` connects
/// to a NATS server.
pub fn connect(url: &str, connect_timeout: Duration) -> Result<Arc<dyn Broker>> {
    let scheme = url.split_once("://").map_or("", |(scheme, _)| scheme);
    match scheme {
        "mem" => Ok(Arc::new(MemoryBroker::named(url))),
        "nats" => Ok(Arc::new(NatsBroker::connect(url, connect_timeout)?)),
        _ => Err(BridgeError::Config(format!(
            "unsupported broker url {url} (expected mem:// or nats://)"
        ))),
    }
}

/// Subjects are non-empty and free of whitespace.
pub(crate) fn validate_topic(topic: &str) -> Result<()> {
    if topic.is_empty() || topic.contains(char::is_whitespace) {
        return Err(BridgeError::InvalidRequest(format!(
            "invalid broker topic {topic:?}"
        )));
    }
    Ok(())
}
