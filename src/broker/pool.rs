use std::sync::Arc;

use crate::error::{BridgeError, Result};

use super::Broker;

/// Broker handles for the two deployment contexts.
///
/// Built once at bootstrap and shared by every request. A request picks the
/// local or cloud broker with [`BrokerPool::select`].
#[derive(Debug, Clone, Default)]
pub struct BrokerPool {
    local: Option<Arc<dyn Broker>>,
    cloud: Option<Arc<dyn Broker>>,
}

impl BrokerPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_local(mut self, broker: Arc<dyn Broker>) -> Self {
        self.local = Some(broker);
        self
    }

    #[must_use]
    pub fn with_cloud(mut self, broker: Arc<dyn Broker>) -> Self {
        self.cloud = Some(broker);
        self
    }

    /// The broker for the requested deployment context.
    pub fn select(&self, in_cloud: bool) -> Result<Arc<dyn Broker>> {
        let (slot, context) = if in_cloud {
            (&self.cloud, "cloud")
        } else {
            (&self.local, "local")
        };
        let broker = slot.as_ref().ok_or_else(|| {
            BridgeError::BrokerUnavailable(format!("no {context} broker configured"))
        })?;
        if !broker.is_connected() {
            return Err(BridgeError::BrokerUnavailable(format!(
                "{context} broker {} is disconnected",
                broker.name()
            )));
        }
        Ok(Arc::clone(broker))
    }
}
