//! Configuration management

use std::path::PathBuf;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/logship";

/// Default path of the local backlog database.
pub const DEFAULT_BACKLOG_PATH: &str = "./logship-backlog.db";

/// Default number of automatic connection attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default delay between connection attempts in seconds.
pub const DEFAULT_BACKOFF_SECS: u64 = 5;

/// Default connection probe timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default remote write timeout in seconds.
pub const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 5;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub backlog_path: PathBuf,
    pub max_attempts: u32,
    pub backoff_secs: u64,
    pub connect_timeout_secs: u64,
    pub write_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            backlog_path: std::env::var("LOGSHIP_BACKLOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_BACKLOG_PATH)),
            max_attempts: std::env::var("LOGSHIP_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_ATTEMPTS),
            backoff_secs: std::env::var("LOGSHIP_BACKOFF_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_BACKOFF_SECS),
            connect_timeout_secs: std::env::var("LOGSHIP_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            write_timeout_secs: std::env::var("LOGSHIP_WRITE_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_WRITE_TIMEOUT_SECS),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.max_attempts == 0 {
            anyhow::bail!("LOGSHIP_MAX_ATTEMPTS must be at least 1");
        }

        if self.connect_timeout_secs == 0 || self.write_timeout_secs == 0 {
            anyhow::bail!("Timeouts must be greater than 0 seconds");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            backlog_path: PathBuf::from(DEFAULT_BACKLOG_PATH),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_secs: DEFAULT_BACKOFF_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            write_timeout_secs: DEFAULT_WRITE_TIMEOUT_SECS,
        }
    }
}
