//! Synchronous request/reply over an asynchronous broker.
//!
//! A [`ReplyBridge`] turns one search request into one serialized
//! [`ResultSet`](crate::search::ResultSet). [`BrokerBridge`] routes the
//! result through a broker reply topic; [`DirectBridge`] hands it back
//! in-process.

mod broker_bridge;
mod direct;
mod reply;

pub use broker_bridge::BrokerBridge;
pub use direct::DirectBridge;
pub use reply::{DEFAULT_INBOX_PREFIX, ReplyChannel, ReplyChannelAllocator};

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::search::SearchRequest;

/// Blocking request/reply for a single search.
///
/// Soft failures (upstream down, nothing found, bad payload) come back as a
/// serialized error result set inside `Ok`. `Err` is reserved for delivery
/// failures: reply timeout, broker unavailable and cancellation.
pub trait ReplyBridge: Send + Sync {
    fn query(&self, request: &SearchRequest, in_cloud: bool, cancel: &CancelToken)
    -> Result<Vec<u8>>;
}
