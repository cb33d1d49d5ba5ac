//! `logship reconcile` command implementation
//!
//! Connects to the primary store and drains the pending backlog into it.

use super::build_sink;
use crate::config::Config;
use anyhow::Result;

/// Connect and replay the backlog
pub async fn run() -> Result<()> {
    let config = Config::load()?;
    let sink = build_sink(&config)?;

    let pending_before = sink.stats().await?.backlog_pending;
    if pending_before == 0 {
        println!("Backlog is empty; nothing to replay.");
        return Ok(());
    }

    println!("Replaying {} pending entries...", pending_before);

    // A successful connect replays the backlog as part of reconnection
    let connected = sink.connect_with_retry().await?;
    let pending_after = sink.stats().await?.backlog_pending;
    let drained = pending_before.saturating_sub(pending_after);

    if pending_after == 0 {
        println!("Backlog fully replayed ({} entries).", drained);
    } else {
        println!(
            "Replay incomplete: {} delivered, {} still pending.",
            drained, pending_after
        );
        if let Some(reason) = sink.last_failure() {
            println!("Last store failure: {}", reason);
        }
        if !connected {
            anyhow::bail!("primary store unreachable; run reconcile again once it recovers");
        }
    }

    sink.close().await;
    Ok(())
}
