//! Shared test utilities for paperbridge.
//!
//! Compiled into the library so integration tests and benches can use the
//! same fixtures and doubles as the unit tests.

pub mod doubles;
pub mod fixtures;
pub mod logging;
