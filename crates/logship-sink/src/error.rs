//! Error types for the resilient sink
//!
//! The taxonomy mirrors the degradation paths: primary-store failures
//! (`StoreError`) are absorbed by falling back to the backlog, while a
//! backlog failure (`BacklogError`) has no further fallback and surfaces
//! to the caller through `SinkError`.

use thiserror::Error;

/// Result type alias for primary-store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for backlog operations
pub type BacklogResult<T> = std::result::Result<T, BacklogError>;

/// Result type alias for sink operations
pub type SinkResult<T> = std::result::Result<T, SinkError>;

/// Errors raised by the primary store collaborator
///
/// These never propagate out of `ResilientSink::log`; they trigger the
/// backlog fallback instead.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Store unreachable, connection refused, or authentication failed
    #[error("Primary store connection failed: {0}")]
    Connection(String),

    /// Store reachable but the write was rejected or timed out
    #[error("Primary store rejected write: {0}")]
    Write(String),

    /// Aggregate stats query failed
    #[error("Primary store query failed: {0}")]
    Query(String),
}

impl StoreError {
    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a write error
    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }

    /// Create a query error
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }
}

/// Errors raised by the local durable backlog
///
/// Fatal for the affected call: when the backlog is unavailable there is no
/// further degradation path.
#[derive(Error, Debug)]
pub enum BacklogError {
    /// SQLite operation failed
    #[error("Backlog database error: {0}. The local fallback store is unavailable.")]
    Db(#[from] rusqlite::Error),

    /// Entry metadata could not be encoded or decoded
    #[error("Backlog serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backlog file location could not be prepared
    #[error("Backlog IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection mutex was poisoned by a panicking writer
    #[error("Backlog lock poisoned")]
    LockPoisoned,
}

/// Caller-facing error type for sink operations
///
/// Store failures are handled internally, so the only variant is the
/// backlog failing underneath the sink.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error(transparent)]
    Backlog(#[from] BacklogError),
}
