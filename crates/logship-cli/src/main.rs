//! Logship CLI - Main entry point

use clap::Parser;
use logship_cli::{Cli, Commands};
use logship_common::entry::LogLevel;
use logship_common::logging::{init_logging, LogConfig};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize diagnostic logging; entry delivery is separate from this
    let log_config = if cli.verbose {
        LogConfig {
            level: LogLevel::Debug,
            ..LogConfig::default()
        }
    } else {
        LogConfig {
            level: LogLevel::Warn,
            ..LogConfig::default()
        }
    };

    // Environment variables take precedence over the verbose flag
    let log_config = log_config.merged_with_env().unwrap_or_default();

    // The CLI should keep working even if logging setup fails
    let _ = init_logging(&log_config);

    // Execute command
    let result = match cli.command {
        Commands::Demo => logship_cli::commands::demo::run().await,
        Commands::Stats => logship_cli::commands::stats::run().await,
        Commands::Reconcile => logship_cli::commands::reconcile::run().await,
    };

    if let Err(e) = result {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
