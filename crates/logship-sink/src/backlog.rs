//! Local durable backlog
//!
//! Entries that cannot reach the primary store are queued here. The backlog
//! must survive process restarts, so the provided implementation is a
//! SQLite file; arrival order is the rowid order and replay never reorders
//! entries.

use crate::error::{BacklogError, BacklogResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use logship_common::entry::{LogEntry, LogLevel};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Local durable queue for undelivered entries (dependency injection seam)
#[async_trait]
pub trait Backlog: Send + Sync {
    /// Append an entry at the tail of the queue
    async fn append(&self, entry: &LogEntry) -> BacklogResult<()>;

    /// Read all pending entries with their queue ids, in arrival order
    async fn read_all(&self) -> BacklogResult<Vec<(i64, LogEntry)>>;

    /// Remove all entries with id up to and including `id`
    ///
    /// Used by reconciliation to confirm a delivered prefix without
    /// touching entries appended while the replay was running.
    async fn remove_through(&self, id: i64) -> BacklogResult<()>;

    /// Remove every pending entry
    async fn clear(&self) -> BacklogResult<()>;

    /// Number of pending entries
    async fn len(&self) -> BacklogResult<u64>;
}

/// SQLite-backed backlog
///
/// All statements run under a single connection mutex, so concurrent
/// appends serialize and cannot interleave partial writes.
pub struct SqliteBacklog {
    db: Arc<Mutex<Connection>>,
}

impl SqliteBacklog {
    /// Open (or create) a backlog database at the given path
    pub fn open(path: impl AsRef<Path>) -> BacklogResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        init_schema(&conn)?;

        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory backlog
    ///
    /// Not durable across restarts; intended for tests and throwaway
    /// experiments only.
    pub fn open_in_memory() -> BacklogResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;

        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> BacklogResult<MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|_| BacklogError::LockPoisoned)
    }
}

/// Initialize the backlog schema (idempotent)
fn init_schema(conn: &Connection) -> BacklogResult<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS pending_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            level TEXT NOT NULL,
            message TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            metadata TEXT NOT NULL
        )
        "#,
        [],
    )?;

    Ok(())
}

#[async_trait]
impl Backlog for SqliteBacklog {
    async fn append(&self, entry: &LogEntry) -> BacklogResult<()> {
        let metadata = serde_json::to_string(&entry.metadata)?;
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO pending_entries (level, message, timestamp, metadata)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                entry.level.as_str(),
                entry.message,
                entry.timestamp.to_rfc3339(),
                metadata,
            ],
        )?;

        Ok(())
    }

    async fn read_all(&self) -> BacklogResult<Vec<(i64, LogEntry)>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, level, message, timestamp, metadata
            FROM pending_entries
            ORDER BY id ASC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let id: i64 = row.get(0)?;

            let level_str = row.get::<_, String>(1)?;
            let level: LogLevel = level_str.parse().map_err(|e: anyhow::Error| {
                rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, e.into())
            })?;

            let timestamp_str = row.get::<_, String>(3)?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        3,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?
                .with_timezone(&Utc);

            let metadata_str = row.get::<_, String>(4)?;
            let metadata = serde_json::from_str(&metadata_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
            })?;

            Ok((
                id,
                LogEntry {
                    level,
                    message: row.get(2)?,
                    timestamp,
                    metadata,
                },
            ))
        })?;

        let entries = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    async fn remove_through(&self, id: i64) -> BacklogResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM pending_entries WHERE id <= ?1", params![id])?;
        Ok(())
    }

    async fn clear(&self) -> BacklogResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM pending_entries", [])?;
        Ok(())
    }

    async fn len(&self) -> BacklogResult<u64> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM pending_entries", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
