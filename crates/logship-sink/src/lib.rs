//! Logship Sink Library
//!
//! A resilient log sink: entries are delivered to a remote primary store
//! when it is reachable, spill into a local durable backlog when it is not,
//! and are replayed into the primary store in arrival order once the
//! connection recovers.
//!
//! # Overview
//!
//! - [`store::PrimaryStore`]: the remote store collaborator (Postgres
//!   implementation in [`postgres`])
//! - [`backlog::Backlog`]: the local durable queue collaborator (SQLite
//!   implementation included)
//! - [`sink::ResilientSink`]: the state machine tying the two together
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use logship_common::entry::LogLevel;
//! use logship_sink::backlog::SqliteBacklog;
//! use logship_sink::postgres::PgStore;
//! use logship_sink::sink::ResilientSink;
//! use serde_json::json;
//!
//! # async fn run(pool: sqlx::PgPool) -> Result<(), logship_sink::error::SinkError> {
//! let store = Arc::new(PgStore::new(pool));
//! let backlog = Arc::new(SqliteBacklog::open("./backlog.db")?);
//! let sink = ResilientSink::new(store, backlog);
//!
//! sink.connect_with_retry().await?;
//! let delivered = sink.log(LogLevel::Info, "application started", json!({"version": "1.0"})).await?;
//! # let _ = delivered;
//! # Ok(())
//! # }
//! ```

pub mod backlog;
pub mod error;
pub mod postgres;
pub mod sink;
pub mod store;

// Re-export the main entry points
pub use error::{BacklogError, SinkError, StoreError};
pub use sink::{ConnectionState, ReplayOutcome, ResilientSink, RetryPolicy, SinkStats};
pub use store::{PrimaryStore, StoreStats};
