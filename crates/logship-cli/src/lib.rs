//! Logship CLI Library
//!
//! Command-line interface for exercising the resilient log sink:
//!
//! - **Demo**: log a sample sequence of entries (`logship demo`)
//! - **Stats**: show primary-store and backlog counts (`logship stats`)
//! - **Reconcile**: connect and drain the backlog (`logship reconcile`)

pub mod commands;
pub mod config;

pub use config::Config;

use clap::{Parser, Subcommand};

/// Logship - resilient log delivery with local fallback
#[derive(Parser, Debug)]
#[command(name = "logship")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log a sample sequence of entries and show where each one landed
    Demo,

    /// Show aggregate stats from the primary store and the backlog
    Stats,

    /// Connect to the primary store and replay any pending backlog
    Reconcile,
}
