//! Application configuration.
//!
//! Everything is env-driven with sensible defaults so `cargo run` works
//! against a local engine out of the box.

use crate::equity::DEFAULT_INITIAL_BALANCE;

/// Default seconds between engine feed polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Top-level application settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Paper-account starting balance, the equity curve baseline.
    pub initial_balance: f64,
    /// Seconds between portfolio/trade polls against the engine.
    pub poll_interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            initial_balance: DEFAULT_INITIAL_BALANCE,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl AppConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            initial_balance: std::env::var("PAPER_INITIAL_BALANCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_INITIAL_BALANCE),
            poll_interval_secs: std::env::var("FEED_POLL_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
        }
    }
}
