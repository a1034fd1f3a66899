//! NATS broker client on top of `async-nats`.
//!
//! The async client lives on a small private tokio runtime and the blocking
//! [`Broker`] calls drive it with `block_on`. Every subscription gets a
//! forwarding task that copies messages into a crossbeam channel, so waits
//! still go through [`Subscription::receive`]. Reconnects, including
//! re-subscribing live subjects, are handled by `async-nats`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_nats::connection::State;
use async_nats::{ConnectOptions, Event};
use crossbeam_channel::{Sender, unbounded};
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::runtime::Runtime;
use tokio::sync::oneshot;

use crate::error::{BridgeError, Result};

use super::{Broker, Message, Subscription, validate_topic};

const IO_THREADS: usize = 2;

struct Registration {
    topic: String,
    /// `None` once the server rejected the subscription.
    stop: Option<oneshot::Sender<()>>,
}

type Registry = Mutex<HashMap<u64, Registration>>;

/// Client connection to a NATS server.
pub struct NatsBroker {
    server: String,
    client: async_nats::Client,
    registry: Arc<Registry>,
    next_sid: AtomicU64,
    op_timeout: Duration,
    runtime: Runtime,
}

impl std::fmt::Debug for NatsBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatsBroker")
            .field("server", &self.server)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl NatsBroker {
    /// Connect and complete the protocol handshake within `timeout`.
    ///
    /// `timeout` also bounds each later subscribe, flush and publish.
    pub fn connect(url: &str, timeout: Duration) -> Result<Self> {
        validate_url(url)?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(IO_THREADS)
            .thread_name("nats-io")
            .enable_all()
            .build()?;

        let registry: Arc<Registry> = Arc::default();
        let options = ConnectOptions::new()
            .name("paperbridge")
            .connection_timeout(timeout)
            .event_callback({
                let registry = Arc::clone(&registry);
                let server = url.to_string();
                move |event| {
                    let registry = Arc::clone(&registry);
                    let server = server.clone();
                    async move { on_event(&registry, &server, event) }
                }
            });

        let client = runtime
            .block_on(async { tokio::time::timeout(timeout * 2, options.connect(url)).await })
            .map_err(|_| BridgeError::BrokerUnavailable(format!("connect to {url} timed out")))?
            .map_err(|err| BridgeError::BrokerUnavailable(format!("connect to {url}: {err}")))?;

        let info = client.server_info();
        tracing::debug!(
            server = url,
            server_id = %info.server_id,
            version = %info.version,
            "connected to broker"
        );

        Ok(Self {
            server: url.to_string(),
            client,
            registry,
            next_sid: AtomicU64::new(1),
            op_timeout: timeout,
            runtime,
        })
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(BridgeError::BrokerUnavailable(format!(
                "connection to {} is down",
                self.server
            )))
        }
    }

    /// Run one client operation to completion, bounded by `op_timeout`.
    fn block_on<T, E, F>(&self, operation: &str, future: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: std::fmt::Display,
    {
        let timeout = self.op_timeout;
        match self
            .runtime
            .block_on(async { tokio::time::timeout(timeout, future).await })
        {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(BridgeError::BrokerUnavailable(format!(
                "{operation} on {} failed: {err}",
                self.server
            ))),
            Err(_) => Err(BridgeError::BrokerUnavailable(format!(
                "{operation} on {} timed out after {}ms",
                self.server,
                timeout.as_millis()
            ))),
        }
    }
}

impl Broker for NatsBroker {
    fn name(&self) -> &str {
        &self.server
    }

    fn is_connected(&self) -> bool {
        matches!(self.client.connection_state(), State::Connected)
    }

    fn subscribe_sync(&self, topic: &str) -> Result<Subscription> {
        validate_topic(topic)?;
        self.ensure_connected()?;

        let sid = self.next_sid.fetch_add(1, Ordering::Relaxed);
        let (stop, stopped) = oneshot::channel();
        self.registry.lock().insert(
            sid,
            Registration {
                topic: topic.to_string(),
                stop: Some(stop),
            },
        );

        let subscribed = self
            .block_on("subscribe", self.client.subscribe(topic.to_string()))
            .and_then(|subscriber| {
                self.block_on("flush", self.client.flush())
                    .map(|()| subscriber)
            });
        let mut subscriber = match subscribed {
            Ok(subscriber) => subscriber,
            Err(err) => {
                self.registry.lock().remove(&sid);
                return Err(err);
            }
        };

        let rejected = self
            .registry
            .lock()
            .get(&sid)
            .is_some_and(|registration| registration.stop.is_none());
        if rejected {
            self.registry.lock().remove(&sid);
            if let Err(err) = self.block_on("unsubscribe", subscriber.unsubscribe()) {
                tracing::debug!(sid, topic, error = %err, "unsubscribe not sent");
            }
            return Err(BridgeError::BrokerUnavailable(format!(
                "{} rejected subscription to {topic}",
                self.server
            )));
        }

        let (sender, receiver) = unbounded();
        self.runtime.spawn(forward(subscriber, stopped, sender));
        Ok(Subscription::new(sid, topic, receiver))
    }

    fn publish(&self, topic: &str, payload: &[u8]) -> Result<()> {
        validate_topic(topic)?;
        self.ensure_connected()?;
        self.block_on(
            "publish",
            self.client.publish(topic.to_string(), payload.to_vec().into()),
        )
    }

    fn unsubscribe(&self, sid: u64) -> Result<()> {
        // Dropping the stop sender ends the forwarding task, which sends UNSUB.
        self.registry.lock().remove(&sid);
        Ok(())
    }

    fn live_subscriptions(&self) -> usize {
        self.registry.lock().len()
    }
}

/// Copy messages from one subscriber into its crossbeam channel until the
/// subscription is stopped or the client shuts down.
async fn forward(
    mut subscriber: async_nats::Subscriber,
    mut stopped: oneshot::Receiver<()>,
    sender: Sender<Message>,
) {
    loop {
        tokio::select! {
            _ = &mut stopped => break,
            next = subscriber.next() => {
                let Some(message) = next else { break };
                let delivered = sender.send(Message {
                    topic: message.subject.to_string(),
                    payload: message.payload.to_vec(),
                });
                if delivered.is_err() {
                    break;
                }
            }
        }
    }
    if let Err(err) = subscriber.unsubscribe().await {
        tracing::debug!(error = %err, "unsubscribe not sent");
    }
}

fn on_event(registry: &Registry, server: &str, event: Event) {
    match event {
        Event::ServerError(err) => {
            let reason = err.to_string();
            tracing::warn!(server, %reason, "broker reported an error");
            reject_named_subscriptions(registry, &reason);
        }
        Event::Disconnected => tracing::warn!(server, "broker connection lost, reconnecting"),
        Event::Connected => tracing::info!(server, "broker connection established"),
        other => tracing::debug!(server, event = ?other, "broker event"),
    }
}

/// Stop every subscription whose subject a server error names, e.g.
/// `Permissions Violation for Subscription to "_INBOX.x"`. Stopping drops
/// the delivery channel, so a pending receive fails as broker-unavailable.
fn reject_named_subscriptions(registry: &Registry, reason: &str) {
    let mut registry = registry.lock();
    for registration in registry.values_mut() {
        if reason.contains(&format!("\"{}\"", registration.topic)) {
            if let Some(stop) = registration.stop.take() {
                let _ = stop.send(());
            }
        }
    }
}

fn validate_url(url: &str) -> Result<()> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|err| BridgeError::Config(format!("invalid broker url {url}: {err}")))?;
    if parsed.scheme() != "nats" {
        return Err(BridgeError::Config(format!(
            "broker url {url} must use the nats:// scheme"
        )));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(BridgeError::Config(format!("broker url {url} has no host")));
    }
    Ok(())
}
