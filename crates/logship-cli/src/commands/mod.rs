//! CLI command implementations

pub mod demo;
pub mod reconcile;
pub mod stats;

use crate::config::Config;
use anyhow::Result;
use logship_sink::backlog::SqliteBacklog;
use logship_sink::postgres::PgStore;
use logship_sink::sink::{ResilientSink, RetryPolicy, SinkStats};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

/// Build a sink from CLI configuration
///
/// The pool is created lazily; the real connectivity check happens in the
/// sink's own connect probe.
pub(crate) fn build_sink(config: &Config) -> Result<ResilientSink> {
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect_lazy(&config.database_url)?;

    let store = Arc::new(
        PgStore::new(pool)
            .with_connect_timeout(Duration::from_secs(config.connect_timeout_secs)),
    );
    let backlog = Arc::new(SqliteBacklog::open(&config.backlog_path)?);

    let sink = ResilientSink::new(store, backlog)
        .with_retry_policy(RetryPolicy {
            max_attempts: config.max_attempts,
            backoff: Duration::from_secs(config.backoff_secs),
        })
        .with_write_timeout(Duration::from_secs(config.write_timeout_secs));

    Ok(sink)
}

/// Print sink stats in a human-readable layout
pub(crate) fn print_stats(stats: &SinkStats, config: &Config) {
    println!("Primary store:");
    match &stats.primary {
        Some(primary) => {
            println!("  Total entries: {}", primary.total);
            println!(
                "  Info: {}, Warn: {}, Error: {}",
                primary.info, primary.warn, primary.error
            );
            match primary.latest {
                Some(latest) => println!("  Latest entry:  {}", latest.to_rfc3339()),
                None => println!("  Latest entry:  none"),
            }
        }
        None => println!("  unavailable (disconnected or query failed)"),
    }

    println!("Backlog:");
    println!(
        "  Pending: {} ({})",
        stats.backlog_pending,
        config.backlog_path.display()
    );
}
