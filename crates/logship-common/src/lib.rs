//! Logship Common Library
//!
//! Shared types and diagnostic logging setup for the logship workspace
//! members:
//!
//! - **Entries**: the `LogEntry` payload type and its severity levels
//! - **Logging**: tracing subscriber initialization for binaries
//!
//! # Example
//!
//! ```
//! use logship_common::entry::{LogEntry, LogLevel};
//! use serde_json::json;
//!
//! let entry = LogEntry::new(LogLevel::Warn, "disk space low", json!({"free": "15%"}));
//! assert_eq!(entry.level, LogLevel::Warn);
//! ```

pub mod entry;
pub mod logging;

// Re-export commonly used types
pub use entry::{LogEntry, LogLevel};
