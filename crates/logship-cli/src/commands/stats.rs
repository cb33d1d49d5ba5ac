//! `logship stats` command implementation
//!
//! Shows aggregate counts from the primary store (when reachable) and the
//! number of entries waiting in the backlog.

use super::{build_sink, print_stats};
use crate::config::Config;
use anyhow::Result;

/// Show sink stats
pub async fn run() -> Result<()> {
    let config = Config::load()?;
    let sink = build_sink(&config)?;

    // Single attempt; stats degrade gracefully if the store is down
    sink.connect().await?;

    let stats = sink.stats().await?;
    print_stats(&stats, &config);

    if stats.primary.is_none() {
        if let Some(reason) = sink.last_failure() {
            println!();
            println!("Last store failure: {}", reason);
        }
    }

    sink.close().await;
    Ok(())
}
