//! paperbridge: blocking search over an asynchronous publish/subscribe broker.
//!
//! A caller asks for one page of results and blocks; the bridge fetches from
//! the upstream search API, normalizes the payload, publishes it on a unique
//! reply topic and waits (bounded) for it to come back through the broker.

pub mod app;
pub mod bridge;
pub mod broker;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod error;
pub mod search;
pub mod test_utils;
pub mod upstream;

pub use cancel::CancelToken;
pub use error::{BridgeError, Result};
pub use search::{ResultItem, ResultSet, SearchService};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
