use chrono::{DateTime, Utc};
use clap::ValueEnum;
use console::style;
use serde::Serialize;

use crate::error::{BridgeError, ErrorCode, Result, StructuredError};
use crate::search::ResultSet;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable formatted output with colors (default)
    #[default]
    Human,
    /// Pretty-printed JSON
    Json,
    /// Plain text without colors
    Plain,
}

impl OutputFormat {
    /// Determine format from CLI args (robot flag overrides explicit format)
    #[must_use]
    pub fn from_args(robot: bool, format: Option<Self>) -> Self {
        if robot {
            Self::Json
        } else {
            format.unwrap_or_default()
        }
    }

    #[must_use]
    pub const fn use_colors(&self) -> bool {
        matches!(self, Self::Human)
    }

    #[must_use]
    pub const fn is_machine_readable(&self) -> bool {
        matches!(self, Self::Json)
    }
}

#[derive(Serialize)]
pub struct RobotResponse<T> {
    pub status: RobotStatus,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub data: T,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotStatus {
    Ok,
    #[serde(rename = "error")]
    StructuredError {
        /// Error code enum value (e.g., "REPLY_TIMEOUT")
        code: ErrorCode,
        numeric_code: u16,
        message: String,
        suggestion: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        context: Option<serde_json::Value>,
        recoverable: bool,
        category: String,
    },
}

impl From<StructuredError> for RobotStatus {
    fn from(err: StructuredError) -> Self {
        Self::StructuredError {
            code: err.code,
            numeric_code: err.numeric_code,
            message: err.message,
            suggestion: err.suggestion,
            context: err.context,
            recoverable: err.recoverable,
            category: err.category,
        }
    }
}

pub fn robot_ok<T: Serialize>(data: T) -> RobotResponse<T> {
    RobotResponse {
        status: RobotStatus::Ok,
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        data,
    }
}

/// Robot error envelope carrying code, suggestion and context.
pub fn robot_error(err: &BridgeError) -> RobotResponse<serde_json::Value> {
    RobotResponse {
        status: err.to_structured().into(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        data: serde_json::Value::Null,
    }
}

pub fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value)?;
    println!("{payload}");
    Ok(())
}

/// Render a result set for a terminal.
#[must_use]
pub fn render_result_set(results: &ResultSet, format: OutputFormat) -> String {
    let colors = format.use_colors();
    let paint = |text: String, f: fn(console::StyledObject<String>) -> console::StyledObject<String>| {
        if colors {
            f(style(text)).to_string()
        } else {
            text
        }
    };

    let mut out = String::new();
    if results.is_error() {
        out.push_str(&paint(
            format!("No results: {}", results.error_message()),
            |s| s.yellow(),
        ));
        out.push('\n');
        return out;
    }

    let last = results.offset() + results.items().len();
    out.push_str(&paint(
        format!(
            "{} results for \"{}\" (showing {}-{})",
            results.total_found(),
            results.search_term(),
            results.offset() + 1,
            last
        ),
        |s| s.bold(),
    ));
    out.push('\n');

    for (index, item) in results.items().iter().enumerate() {
        out.push('\n');
        out.push_str(&paint(
            format!("{:>3}. {}", results.offset() + index + 1, item.title),
            |s| s.cyan().bold(),
        ));
        out.push('\n');
        out.push_str(&format!("     {}\n", item.id));

        let mut meta = Vec::new();
        if !item.venue.is_empty() {
            meta.push(item.venue.clone());
        }
        if !item.published_at.is_empty() {
            meta.push(item.published_at.clone());
        }
        if !meta.is_empty() {
            out.push_str(&paint(format!("     {}", meta.join(" | ")), |s| s.dim()));
            out.push('\n');
        }
        if !item.authors.is_empty() {
            out.push_str(&format!("     {}\n", item.authors.join(", ")));
        }
    }

    if results.has_more() {
        out.push('\n');
        out.push_str(&paint(
            format!("Next page: --offset {}", results.next_offset()),
            |s| s.dim(),
        ));
        out.push('\n');
    }
    out
}
