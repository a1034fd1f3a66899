//! Error handling for paperbridge.
//!
//! This module provides:
//! - [`BridgeError`]: The main error enum for all bridge operations
//! - [`ErrorCode`]: Standardized error codes for machine parsing
//! - [`StructuredError`]: Rich error type with suggestion and context

mod codes;

use std::io;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use codes::ErrorCode;

/// Main error type for paperbridge operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Invalid search request: {0}")]
    InvalidRequest(String),

    #[error("Upstream search API unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Malformed upstream payload: {0}")]
    MalformedUpstreamPayload(String),

    #[error("Nothing found for search \"{term}\"")]
    EmptyResult { term: String },

    #[error("No reply on {topic} within {}ms", .waited.as_millis())]
    ReplyTimeout { topic: String, waited: Duration },

    #[error("Broker unavailable: {0}")]
    BrokerUnavailable(String),

    #[error("Search cancelled while waiting on {topic}")]
    Cancelled { topic: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing required config: {0}")]
    MissingConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BridgeError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidRequest(_) => ErrorCode::InvalidRequest,
            Self::UpstreamUnavailable(_) => ErrorCode::UpstreamUnavailable,
            Self::MalformedUpstreamPayload(_) => ErrorCode::MalformedUpstreamPayload,
            Self::EmptyResult { .. } => ErrorCode::EmptyResult,
            Self::ReplyTimeout { .. } => ErrorCode::ReplyTimeout,
            Self::BrokerUnavailable(_) => ErrorCode::BrokerUnavailable,
            Self::Cancelled { .. } => ErrorCode::Cancelled,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::MissingConfig(_) => ErrorCode::ConfigMissingRequired,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::SerializationError,
        }
    }

    /// Whether this condition travels to the caller as a soft-error result
    /// set rather than as a hard error.
    #[must_use]
    pub const fn is_soft(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest(_)
                | Self::UpstreamUnavailable(_)
                | Self::MalformedUpstreamPayload(_)
                | Self::EmptyResult { .. }
        )
    }

    /// HTTP status an HTTP front end should answer with for this error.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::UpstreamUnavailable(_) | Self::MalformedUpstreamPayload(_) => 502,
            Self::EmptyResult { .. } => 404,
            Self::ReplyTimeout { .. } => 504,
            Self::BrokerUnavailable(_) => 503,
            Self::Cancelled { .. } => 499,
            Self::Config(_) | Self::MissingConfig(_) | Self::Io(_) | Self::Json(_) => 500,
        }
    }

    /// Get context information for this error as JSON.
    #[must_use]
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::EmptyResult { term } => Some(serde_json::json!({ "term": term })),
            Self::ReplyTimeout { topic, waited } => Some(serde_json::json!({
                "topic": topic,
                "waited_ms": u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
            })),
            Self::Cancelled { topic } => Some(serde_json::json!({ "topic": topic })),
            Self::MissingConfig(key) => Some(serde_json::json!({ "config_key": key })),
            _ => None,
        }
    }

    /// Convert this error to a structured error.
    #[must_use]
    pub fn to_structured(&self) -> StructuredError {
        StructuredError::from_bridge_error(self)
    }
}

/// A structured error with machine-readable code, suggestion, and context.
///
/// Robot-mode output emits this shape so scripts can branch on `code`
/// rather than on message text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// The error code (e.g., "REPLY_TIMEOUT")
    pub code: ErrorCode,

    /// The numeric error code (e.g., 401)
    pub numeric_code: u16,

    /// Human-readable error message
    pub message: String,

    /// Actionable suggestion for recovery
    pub suggestion: String,

    /// Additional context for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// Whether this error is potentially recoverable by the user
    pub recoverable: bool,

    /// Error category (e.g., "broker", "upstream")
    pub category: String,
}

impl StructuredError {
    /// Create a new structured error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            numeric_code: code.numeric(),
            suggestion: code.suggestion().to_string(),
            context: None,
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
            code,
            message: message.into(),
        }
    }

    /// Create a structured error from a `BridgeError`.
    #[must_use]
    pub fn from_bridge_error(err: &BridgeError) -> Self {
        Self {
            context: err.context(),
            ..Self::new(err.code(), err.to_string())
        }
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<BridgeError> for StructuredError {
    fn from(err: BridgeError) -> Self {
        Self::from_bridge_error(&err)
    }
}

impl From<&BridgeError> for StructuredError {
    fn from(err: &BridgeError) -> Self {
        Self::from_bridge_error(err)
    }
}

/// Result type alias using `BridgeError`.
pub type Result<T> = std::result::Result<T, BridgeError>;
