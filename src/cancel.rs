//! Caller-side cancellation for blocking waits.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, bounded};
use parking_lot::Mutex;

/// Cloneable cancellation handle.
///
/// Cancelling drops the only sender of an internal channel, which wakes every
/// `select!` waiting on [`CancelToken::signal`] at once. Nothing is ever sent
/// on the channel.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

struct CancelInner {
    trigger: Mutex<Option<Sender<()>>>,
    signal: Receiver<()>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        let (trigger, signal) = bounded(0);
        Self {
            inner: Arc::new(CancelInner {
                trigger: Mutex::new(Some(trigger)),
                signal,
            }),
        }
    }

    /// Cancel every wait sharing this token. Repeated calls are no-ops.
    pub fn cancel(&self) {
        self.inner.trigger.lock().take();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.trigger.lock().is_none()
    }

    /// Becomes ready (disconnected) once the token is cancelled.
    #[must_use]
    pub fn signal(&self) -> &Receiver<()> {
        &self.inner.signal
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
