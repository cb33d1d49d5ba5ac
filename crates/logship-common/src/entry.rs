//! Log entry payload types
//!
//! These are the domain records the sink delivers to the primary store.
//! They are distinct from the diagnostic `tracing` output of the process
//! itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Severity level of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Very detailed trace-level entries
    Trace,
    /// Debug-level entries for development
    Debug,
    /// Informational entries
    #[default]
    Info,
    /// Warning entries
    Warn,
    /// Error entries
    Error,
}

impl LogLevel {
    /// String form used in database columns and wire payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(anyhow::anyhow!("Invalid log level: {}", s)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single log entry
///
/// Immutable once created: the constructor stamps the timestamp and callers
/// hand the entry off to the sink as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Severity level
    pub level: LogLevel,

    /// Human-readable message
    pub message: String,

    /// Creation time (UTC)
    pub timestamp: DateTime<Utc>,

    /// Structured metadata (JSON)
    #[serde(default)]
    pub metadata: JsonValue,
}

impl LogEntry {
    /// Create a new entry stamped with the current time
    pub fn new(level: LogLevel, message: impl Into<String>, metadata: JsonValue) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
            metadata,
        }
    }

    /// Create a new entry without metadata
    pub fn message_only(level: LogLevel, message: impl Into<String>) -> Self {
        Self::new(level, message, JsonValue::Null)
    }
}
