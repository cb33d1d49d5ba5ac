//! `logship demo` command implementation
//!
//! Logs a representative sequence of entries and reports where each one
//! landed, then prints aggregate stats.

use super::{build_sink, print_stats};
use crate::config::Config;
use anyhow::Result;
use logship_common::entry::LogLevel;
use serde_json::json;

/// Run the demo scenario
pub async fn run() -> Result<()> {
    let config = Config::load()?;
    let sink = build_sink(&config)?;

    println!("Connecting to primary store...");
    if sink.connect_with_retry().await? {
        println!("Primary store connected.");
    } else {
        println!(
            "Primary store unreachable; entries will queue in {}",
            config.backlog_path.display()
        );
    }
    println!();

    let entries = [
        (LogLevel::Info, "Application started", json!({"version": "1.0.0"})),
        (LogLevel::Info, "Connection established", json!({})),
        (LogLevel::Warn, "Warning: low disk space", json!({"disk_space": "15%"})),
        (
            LogLevel::Error,
            "Error: API call timed out",
            json!({"endpoint": "/api/users", "timeout_ms": 5000}),
        ),
        (LogLevel::Info, "Test entries sent", json!({})),
    ];

    for (level, message, metadata) in entries {
        let delivered = sink.log(level, message, metadata).await?;
        let destination = if delivered { "primary store" } else { "backlog" };
        println!("  [{}] {} -> {}", level, message, destination);
    }

    println!();
    let stats = sink.stats().await?;
    print_stats(&stats, &config);

    sink.close().await;
    Ok(())
}
