//! Postgres-backed primary store
//!
//! Wraps an injected `sqlx::PgPool`. The pool is explicitly owned by the
//! store rather than shared through a module-level singleton, so multiple
//! independent sinks (and tests) can each carry their own session handle.

use crate::error::{StoreError, StoreResult};
use crate::store::{PrimaryStore, StoreStats};
use async_trait::async_trait;
use logship_common::entry::LogEntry;
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::debug;

/// Default bound on the connection probe.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Primary store over a Postgres connection pool
pub struct PgStore {
    pool: PgPool,
    connect_timeout: Duration,
}

impl PgStore {
    /// Create a store over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }

    /// Override the connection probe timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Create the logs table if it does not exist
    async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS logs (
                id BIGSERIAL PRIMARY KEY,
                level TEXT NOT NULL,
                message TEXT NOT NULL,
                timestamp TIMESTAMPTZ NOT NULL,
                metadata JSONB
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::connection(format!("schema setup failed: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl PrimaryStore for PgStore {
    async fn connect(&self) -> StoreResult<()> {
        // Round-trip probe, bounded so a stalled network cannot wedge the
        // reconnect loop.
        let probe = sqlx::query("SELECT 1").execute(&self.pool);

        match tokio::time::timeout(self.connect_timeout, probe).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(StoreError::connection(e.to_string())),
            Err(_) => {
                return Err(StoreError::connection(format!(
                    "connection probe timed out after {:?}",
                    self.connect_timeout
                )))
            }
        }

        self.ensure_schema().await?;
        debug!("primary store session established");
        Ok(())
    }

    async fn write(&self, entry: &LogEntry) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO logs (level, message, timestamp, metadata)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(entry.level.as_str())
        .bind(&entry.message)
        .bind(entry.timestamp)
        .bind(&entry.metadata)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::write(e.to_string()))?;

        Ok(())
    }

    async fn query_stats(&self) -> StoreResult<StoreStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*)                                   AS total,
                COUNT(*) FILTER (WHERE level = 'info')     AS info,
                COUNT(*) FILTER (WHERE level = 'warn')     AS warn,
                COUNT(*) FILTER (WHERE level = 'error')    AS error,
                MAX(timestamp)                             AS latest
            FROM logs
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::query(e.to_string()))?;

        let stats = StoreStats {
            total: row
                .try_get("total")
                .map_err(|e| StoreError::query(e.to_string()))?,
            info: row
                .try_get("info")
                .map_err(|e| StoreError::query(e.to_string()))?,
            warn: row
                .try_get("warn")
                .map_err(|e| StoreError::query(e.to_string()))?,
            error: row
                .try_get("error")
                .map_err(|e| StoreError::query(e.to_string()))?,
            latest: row
                .try_get("latest")
                .map_err(|e| StoreError::query(e.to_string()))?,
        };

        Ok(stats)
    }

    async fn disconnect(&self) {
        // PgPool::close is safe to call more than once.
        self.pool.close().await;
        debug!("primary store session closed");
    }
}
