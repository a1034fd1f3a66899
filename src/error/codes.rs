//! Standardized error codes for machine-parseable output.
//!
//! Error codes follow a numeric taxonomy:
//! - 1xx: Request errors
//! - 2xx: Upstream search API errors
//! - 3xx: Config errors
//! - 4xx: Broker errors
//! - 9xx: Internal errors

use serde::{Deserialize, Serialize};

/// Standardized error codes for robot mode output.
///
/// Each variant maps to a numeric code (e.g., `UpstreamUnavailable` -> E201).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================
    // Request errors (1xx)
    // ========================================
    /// E101: Search request is invalid (e.g. blank term)
    InvalidRequest,
    /// E102: The caller abandoned the request before a reply arrived
    Cancelled,

    // ========================================
    // Upstream errors (2xx)
    // ========================================
    /// E201: Upstream search API unreachable or returned non-2xx
    UpstreamUnavailable,
    /// E202: Upstream payload could not be decoded
    MalformedUpstreamPayload,
    /// E203: Search returned zero documents
    EmptyResult,

    // ========================================
    // Config errors (3xx)
    // ========================================
    /// E301: Config file has invalid syntax or values
    ConfigInvalid,
    /// E302: Required config value is missing
    ConfigMissingRequired,

    // ========================================
    // Broker errors (4xx)
    // ========================================
    /// E401: No reply arrived on the reply channel in time
    ReplyTimeout,
    /// E402: Broker connection missing, refused or lost
    BrokerUnavailable,

    // ========================================
    // Internal errors (9xx)
    // ========================================
    /// E901: Serialization/deserialization failed
    SerializationError,
    /// E902: IO operation failed
    IoError,
}

impl ErrorCode {
    /// Get the numeric error code (e.g., `ReplyTimeout` -> 401).
    #[must_use]
    pub const fn numeric(&self) -> u16 {
        match self {
            Self::InvalidRequest => 101,
            Self::Cancelled => 102,

            Self::UpstreamUnavailable => 201,
            Self::MalformedUpstreamPayload => 202,
            Self::EmptyResult => 203,

            Self::ConfigInvalid => 301,
            Self::ConfigMissingRequired => 302,

            Self::ReplyTimeout => 401,
            Self::BrokerUnavailable => 402,

            Self::SerializationError => 901,
            Self::IoError => 902,
        }
    }

    /// Get the error code as a formatted string (e.g., "E401").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("E{}", self.numeric())
    }

    /// Get the default suggestion for this error code.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "Provide a non-empty search term, e.g. `paperbridge search covid`",
            Self::Cancelled => "The search was interrupted before a reply arrived. Run it again",
            Self::UpstreamUnavailable => "Check network access to the search API or override [upstream].base_url",
            Self::MalformedUpstreamPayload => "The search API answered with an unexpected payload. Check [upstream].base_url points at a Solr search endpoint",
            Self::EmptyResult => "Try broader search terms, or search by DOI (e.g. 10.1371/journal.pone.0000001)",
            Self::ConfigInvalid => "Run `paperbridge config` to see current values. Check TOML syntax in config file",
            Self::ConfigMissingRequired => "Set the required value in config.toml or through its PAPERBRIDGE_* variable",
            Self::ReplyTimeout => "The broker did not deliver the reply in time. Retry, or raise [broker].reply_timeout_ms",
            Self::BrokerUnavailable => "Check the broker URL and that the broker is running. Use --cloud only when the demo broker is reachable",
            Self::SerializationError => "The data format may be corrupted. Check input data for validity",
            Self::IoError => "File operation failed. Check path exists and permissions are correct",
        }
    }

    /// Check if this error is potentially recoverable by the user.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidRequest
            | Self::Cancelled
            | Self::UpstreamUnavailable
            | Self::EmptyResult
            | Self::ConfigInvalid
            | Self::ConfigMissingRequired
            | Self::ReplyTimeout
            | Self::BrokerUnavailable
            | Self::IoError => true,

            Self::MalformedUpstreamPayload | Self::SerializationError => false,
        }
    }

    /// Get the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.numeric() / 100 {
            1 => "request",
            2 => "upstream",
            3 => "config",
            4 => "broker",
            9 => "internal",
            _ => "unknown",
        }
    }

    /// Iterate over all error codes.
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::InvalidRequest,
            Self::Cancelled,
            Self::UpstreamUnavailable,
            Self::MalformedUpstreamPayload,
            Self::EmptyResult,
            Self::ConfigInvalid,
            Self::ConfigMissingRequired,
            Self::ReplyTimeout,
            Self::BrokerUnavailable,
            Self::SerializationError,
            Self::IoError,
        ]
        .into_iter()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code_string())
    }
}
