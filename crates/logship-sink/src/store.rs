//! Primary store trait and aggregate stats
//!
//! The sink treats the remote store as an opaque collaborator: any backend
//! that can open a session, accept writes, and answer an aggregate stats
//! query works. The trait is object-safe for use behind `Arc<dyn
//! PrimaryStore>`, which is also what lets the test suite substitute a
//! scripted in-memory double.

use crate::error::StoreResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use logship_common::entry::LogEntry;
use serde::Serialize;

/// Remote store for log entries (dependency injection seam)
#[async_trait]
pub trait PrimaryStore: Send + Sync {
    /// Establish a session with the store
    ///
    /// Implementations must bound the attempt with a timeout so a stalled
    /// network cannot block reconnection indefinitely.
    async fn connect(&self) -> StoreResult<()>;

    /// Write a single entry durably into the store
    async fn write(&self, entry: &LogEntry) -> StoreResult<()>;

    /// Query aggregate counts over the stored entries
    async fn query_stats(&self) -> StoreResult<StoreStats>;

    /// Release the session; must be idempotent
    async fn disconnect(&self);
}

/// Aggregate counts reported by the primary store
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    /// Total number of stored entries
    pub total: i64,

    /// Entries at info level
    pub info: i64,

    /// Entries at warn level
    pub warn: i64,

    /// Entries at error level
    pub error: i64,

    /// Timestamp of the most recent entry, if any
    pub latest: Option<DateTime<Utc>>,
}
