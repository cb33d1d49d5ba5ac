//! Resilient sink state machine
//!
//! Ties the primary store and the local backlog together: entries go to the
//! primary store while the session is healthy, spill into the backlog on
//! any failure, and the backlog is replayed in arrival order after a
//! reconnect.
//!
//! Connection management and backlog replay share a maintenance mutex, so
//! at most one connect attempt or reconciliation runs per sink instance at
//! any time.

use crate::backlog::Backlog;
use crate::error::{SinkResult, StoreError};
use crate::store::{PrimaryStore, StoreStats};
use logship_common::entry::{LogEntry, LogLevel};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default number of automatic connection attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default fixed delay between connection attempts, in seconds.
pub const DEFAULT_BACKOFF_SECS: u64 = 5;

/// Default bound on a single remote write, in seconds.
pub const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 5;

/// Connection state of the sink
///
/// `Connected` is the only state from which direct remote writes are
/// attempted. Mutated only by the sink itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No session with the primary store
    #[default]
    Disconnected,
    /// Connection attempt in flight
    Connecting,
    /// Session established; writes go to the primary store
    Connected,
}

/// Bounded fixed-backoff retry schedule for connection attempts
///
/// Delays go through tokio's clock, so tests can pause and advance time
/// instead of sleeping for real.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts made before giving up
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Duration::from_secs(DEFAULT_BACKOFF_SECS),
        }
    }
}

/// Result of one backlog reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplayOutcome {
    /// Entries confirmed delivered to the primary store
    pub replayed: u64,
    /// Entries still pending (the replay stopped early, or they arrived
    /// while it ran)
    pub remaining: u64,
}

/// Aggregate view reported by [`ResilientSink::stats`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SinkStats {
    /// Counts from the primary store; `None` when disconnected or the
    /// query failed (degraded stats)
    pub primary: Option<StoreStats>,
    /// Entries waiting in the local backlog
    pub backlog_pending: u64,
}

/// Durable log sink with remote-first delivery and local fallback
pub struct ResilientSink {
    store: Arc<dyn PrimaryStore>,
    backlog: Arc<dyn Backlog>,
    retry: RetryPolicy,
    write_timeout: Duration,
    state: Mutex<ConnectionState>,
    last_failure: Mutex<Option<String>>,
    // Serializes connect attempts and backlog replay.
    maintenance: tokio::sync::Mutex<()>,
}

impl ResilientSink {
    /// Create a sink over the given collaborators
    ///
    /// The sink starts `Disconnected`; call [`connect`](Self::connect) or
    /// [`connect_with_retry`](Self::connect_with_retry) to open the
    /// session.
    pub fn new(store: Arc<dyn PrimaryStore>, backlog: Arc<dyn Backlog>) -> Self {
        Self {
            store,
            backlog,
            retry: RetryPolicy::default(),
            write_timeout: Duration::from_secs(DEFAULT_WRITE_TIMEOUT_SECS),
            state: Mutex::new(ConnectionState::Disconnected),
            last_failure: Mutex::new(None),
            maintenance: tokio::sync::Mutex::new(()),
        }
    }

    /// Override the retry schedule
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Override the per-write timeout
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(ConnectionState::Disconnected)
    }

    /// Reason recorded for the most recent store failure, if any
    pub fn last_failure(&self) -> Option<String> {
        self.last_failure.lock().map(|f| f.clone()).unwrap_or(None)
    }

    fn set_state(&self, next: ConnectionState) {
        if let Ok(mut state) = self.state.lock() {
            *state = next;
        }
    }

    fn record_failure(&self, err: &StoreError) {
        if let Ok(mut failure) = self.last_failure.lock() {
            *failure = Some(err.to_string());
        }
    }

    /// Log an entry built from its parts
    ///
    /// Returns `Ok(true)` when the entry went straight to the primary
    /// store, `Ok(false)` when it was queued to the backlog. See
    /// [`log_entry`](Self::log_entry).
    pub async fn log(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        metadata: JsonValue,
    ) -> SinkResult<bool> {
        self.log_entry(LogEntry::new(level, message, metadata)).await
    }

    /// Log a prepared entry
    ///
    /// Never blocks the caller beyond issuing the (timeout-bounded) write,
    /// and never fails on a primary-store error; the entry degrades to the
    /// backlog instead. Only a backlog failure is returned as `Err`.
    pub async fn log_entry(&self, entry: LogEntry) -> SinkResult<bool> {
        if self.state() == ConnectionState::Connected {
            match self.remote_write(&entry).await {
                Ok(()) => {
                    debug!(level = %entry.level, "entry delivered to primary store");
                    return Ok(true);
                }
                Err(e) => {
                    warn!(error = %e, "primary store write failed, falling back to backlog");
                    self.record_failure(&e);
                    self.set_state(ConnectionState::Disconnected);
                }
            }
        }

        self.backlog.append(&entry).await?;
        debug!(level = %entry.level, "entry queued to backlog");
        Ok(false)
    }

    /// Attempt a single connection to the primary store
    ///
    /// On success the sink transitions to `Connected` and immediately
    /// replays the backlog. Returns whether the sink is `Connected`
    /// afterwards (a replay failure drops it back to `Disconnected`).
    pub async fn connect(&self) -> SinkResult<bool> {
        let _guard = self.maintenance.lock().await;
        self.connect_locked().await
    }

    /// Attempt to connect, retrying on a fixed backoff
    ///
    /// Gives up after `RetryPolicy::max_attempts` failures; after that no
    /// further automatic attempts happen until `connect` or
    /// `connect_with_retry` is called again.
    pub async fn connect_with_retry(&self) -> SinkResult<bool> {
        let _guard = self.maintenance.lock().await;

        for attempt in 1..=self.retry.max_attempts {
            if self.connect_locked().await? {
                return Ok(true);
            }

            if attempt < self.retry.max_attempts {
                debug!(
                    attempt,
                    backoff_secs = self.retry.backoff.as_secs(),
                    "primary store connection failed, retrying"
                );
                tokio::time::sleep(self.retry.backoff).await;
            }
        }

        warn!(
            attempts = self.retry.max_attempts,
            "primary store unreachable, automatic retries exhausted"
        );
        Ok(false)
    }

    /// Replay pending backlog entries into the primary store
    ///
    /// No-op (with the pending count reported) unless connected. Normally
    /// triggered by a successful connect; exposed for operator use.
    pub async fn reconcile_backlog(&self) -> SinkResult<ReplayOutcome> {
        let _guard = self.maintenance.lock().await;

        if self.state() != ConnectionState::Connected {
            let remaining = self.backlog.len().await?;
            debug!(remaining, "not connected, skipping backlog replay");
            return Ok(ReplayOutcome {
                replayed: 0,
                remaining,
            });
        }

        self.reconcile_locked().await
    }

    /// Aggregate stats from both stores
    ///
    /// A primary-store query failure degrades to `primary: None` rather
    /// than failing the call.
    pub async fn stats(&self) -> SinkResult<SinkStats> {
        let backlog_pending = self.backlog.len().await?;

        let primary = if self.state() == ConnectionState::Connected {
            match self.store.query_stats().await {
                Ok(stats) => Some(stats),
                Err(e) => {
                    warn!(error = %e, "primary store stats query failed, reporting degraded stats");
                    self.record_failure(&e);
                    None
                }
            }
        } else {
            None
        };

        Ok(SinkStats {
            primary,
            backlog_pending,
        })
    }

    /// Release the primary-store session
    ///
    /// Safe to call repeatedly and in any state.
    pub async fn close(&self) {
        let was_connected = self.state() == ConnectionState::Connected;
        self.set_state(ConnectionState::Disconnected);
        self.store.disconnect().await;

        if was_connected {
            info!("primary store session closed");
        }
    }

    async fn connect_locked(&self) -> SinkResult<bool> {
        self.set_state(ConnectionState::Connecting);
        debug!("connecting to primary store");

        match self.store.connect().await {
            Ok(()) => {
                self.set_state(ConnectionState::Connected);
                if let Ok(mut failure) = self.last_failure.lock() {
                    *failure = None;
                }
                info!("primary store connected");

                self.reconcile_locked().await?;
                Ok(self.state() == ConnectionState::Connected)
            }
            Err(e) => {
                warn!(error = %e, "primary store connection failed");
                self.record_failure(&e);
                self.set_state(ConnectionState::Disconnected);
                Ok(false)
            }
        }
    }

    /// Replay the backlog; caller must hold the maintenance lock
    ///
    /// Stops at the first write failure, leaving the failed entry and
    /// everything after it queued. The delivered prefix is confirmed with
    /// `remove_through`, so entries appended while the replay runs are
    /// never dropped.
    async fn reconcile_locked(&self) -> SinkResult<ReplayOutcome> {
        let pending = self.backlog.read_all().await?;

        if pending.is_empty() {
            return Ok(ReplayOutcome::default());
        }

        info!(pending = pending.len(), "replaying backlog to primary store");

        let total = pending.len() as u64;
        let mut delivered_through = None;
        let mut replayed = 0u64;

        for (id, entry) in &pending {
            match self.remote_write(entry).await {
                Ok(()) => {
                    delivered_through = Some(*id);
                    replayed += 1;
                }
                Err(e) => {
                    warn!(error = %e, replayed, "backlog replay interrupted");
                    self.record_failure(&e);
                    self.set_state(ConnectionState::Disconnected);
                    break;
                }
            }
        }

        if let Some(id) = delivered_through {
            self.backlog.remove_through(id).await?;
        }

        let remaining = total - replayed;
        if remaining == 0 {
            info!(replayed, "backlog fully replayed");
        }

        Ok(ReplayOutcome { replayed, remaining })
    }

    async fn remote_write(&self, entry: &LogEntry) -> Result<(), StoreError> {
        match tokio::time::timeout(self.write_timeout, self.store.write(entry)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::write(format!(
                "write timed out after {:?}",
                self.write_timeout
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backlog::SqliteBacklog;
    use crate::error::StoreResult;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    /// Store double whose connect and write outcomes are toggled by tests
    #[derive(Default)]
    struct ScriptedStore {
        reachable: AtomicBool,
        fail_writes: AtomicBool,
        connect_calls: AtomicU32,
        written: Mutex<Vec<LogEntry>>,
    }

    impl ScriptedStore {
        fn reachable() -> Self {
            let store = Self::default();
            store.reachable.store(true, Ordering::SeqCst);
            store
        }

        fn written_messages(&self) -> Vec<String> {
            self.written
                .lock()
                .unwrap()
                .iter()
                .map(|e| e.message.clone())
                .collect()
        }
    }

    #[async_trait]
    impl PrimaryStore for ScriptedStore {
        async fn connect(&self) -> StoreResult<()> {
            self.connect_calls.fetch_add(1, Ordering::SeqCst);
            if self.reachable.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(StoreError::connection("store down"))
            }
        }

        async fn write(&self, entry: &LogEntry) -> StoreResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StoreError::write("insert rejected"));
            }
            self.written.lock().unwrap().push(entry.clone());
            Ok(())
        }

        async fn query_stats(&self) -> StoreResult<StoreStats> {
            if !self.reachable.load(Ordering::SeqCst) {
                return Err(StoreError::query("store down"));
            }
            let written = self.written.lock().unwrap();
            Ok(StoreStats {
                total: written.len() as i64,
                ..Default::default()
            })
        }

        async fn disconnect(&self) {}
    }

    fn sink_over(store: Arc<ScriptedStore>) -> ResilientSink {
        let backlog = Arc::new(SqliteBacklog::open_in_memory().unwrap());
        ResilientSink::new(store, backlog)
    }

    #[tokio::test]
    async fn test_starts_disconnected() {
        let sink = sink_over(Arc::new(ScriptedStore::reachable()));
        assert_eq!(sink.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_log_while_disconnected_queues() {
        let store = Arc::new(ScriptedStore::reachable());
        let sink = sink_over(store.clone());

        let delivered = sink.log(LogLevel::Info, "queued", json!({})).await.unwrap();

        assert!(!delivered);
        assert!(store.written_messages().is_empty());
        assert_eq!(sink.stats().await.unwrap().backlog_pending, 1);
    }

    #[tokio::test]
    async fn test_connected_writes_go_remote() {
        let store = Arc::new(ScriptedStore::reachable());
        let sink = sink_over(store.clone());

        assert!(sink.connect().await.unwrap());
        let delivered = sink.log(LogLevel::Info, "direct", json!({})).await.unwrap();

        assert!(delivered);
        assert_eq!(store.written_messages(), vec!["direct"]);
        assert_eq!(sink.stats().await.unwrap().backlog_pending, 0);
    }

    #[tokio::test]
    async fn test_write_failure_degrades_to_backlog() {
        let store = Arc::new(ScriptedStore::reachable());
        let sink = sink_over(store.clone());
        sink.connect().await.unwrap();

        store.fail_writes.store(true, Ordering::SeqCst);
        let delivered = sink.log(LogLevel::Error, "spilled", json!({})).await.unwrap();

        assert!(!delivered);
        assert_eq!(sink.state(), ConnectionState::Disconnected);
        assert_eq!(sink.stats().await.unwrap().backlog_pending, 1);
        assert!(sink.last_failure().unwrap().contains("insert rejected"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_are_bounded() {
        let store = Arc::new(ScriptedStore::default()); // unreachable
        let sink = sink_over(store.clone()).with_retry_policy(RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_secs(5),
        });

        let connected = sink.connect_with_retry().await.unwrap();

        assert!(!connected);
        assert_eq!(store.connect_calls.load(Ordering::SeqCst), 3);
        assert_eq!(sink.state(), ConnectionState::Disconnected);

        // An explicit reconnect still works once the store recovers
        store.reachable.store(true, Ordering::SeqCst);
        assert!(sink.connect().await.unwrap());
        assert_eq!(sink.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_connect_replays_backlog() {
        let store = Arc::new(ScriptedStore::reachable());
        let sink = sink_over(store.clone());

        sink.log(LogLevel::Info, "one", json!({})).await.unwrap();
        sink.log(LogLevel::Warn, "two", json!({})).await.unwrap();

        assert!(sink.connect().await.unwrap());

        assert_eq!(store.written_messages(), vec!["one", "two"]);
        assert_eq!(sink.stats().await.unwrap().backlog_pending, 0);
    }

    #[tokio::test]
    async fn test_stats_degrade_without_store() {
        let store = Arc::new(ScriptedStore::reachable());
        let sink = sink_over(store.clone());
        sink.connect().await.unwrap();

        store.reachable.store(false, Ordering::SeqCst);
        let stats = sink.stats().await.unwrap();

        assert!(stats.primary.is_none());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let store = Arc::new(ScriptedStore::reachable());
        let sink = sink_over(store.clone());
        sink.connect().await.unwrap();

        sink.close().await;
        sink.close().await;

        assert_eq!(sink.state(), ConnectionState::Disconnected);
    }
}
