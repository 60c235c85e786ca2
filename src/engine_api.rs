//! HTTP client for the paper-trading engine's REST API.
//!
//! The engine is an external collaborator: it owns order execution, the
//! portfolio, and settings persistence. This module speaks its JSON
//! contract —
//!
//! - `GET  /api/paper-trading/strategy-settings` → `{ success, data }`
//! - `PUT  /api/paper-trading/strategy-settings` with `{ settings }`
//! - `GET  /api/paper-trading/portfolio` → `{ success, data }`
//! - `GET  /api/paper-trading/trades` → `{ success, data }`
//!
//! — and hosts the background feed sync. Every call is a single in-flight
//! request; there is no retry, coalescing, or cancellation. Failures are
//! non-fatal: the caller keeps its prior in-memory state and surfaces an
//! alert.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::dashboard::state::{DashboardState, FeedStatus};
use crate::settings::SettingsTree;
use crate::types::{ClosedTrade, OpenTrade, Portfolio};

/// Default engine API base URL.
const DEFAULT_API_BASE: &str = "http://127.0.0.1:3001";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Engine API connection settings.
#[derive(Debug, Clone)]
pub struct EngineApiConfig {
    /// Base URL of the engine's REST API (no trailing slash).
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for EngineApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl EngineApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("ENGINE_API_BASE")
                .ok()
                .filter(|s| !s.is_empty())
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            timeout_secs: std::env::var("ENGINE_API_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        }
    }
}

// ============================================================================
// ERRORS AND WIRE TYPES
// ============================================================================

pub type EngineResult<T> = Result<T, EngineApiError>;

/// Errors talking to the engine API.
#[derive(Debug, Error)]
pub enum EngineApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("engine returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("engine rejected the request")]
    Rejected,

    #[error("engine response missing data payload")]
    MissingData,
}

/// The engine's `{ success, data }` response envelope.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    data: Option<T>,
}

/// Settings tree as stored by the engine, with the selected preset riding
/// alongside the three branches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSettings {
    #[serde(flatten)]
    pub settings: SettingsTree,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_preset: Option<String>,
}

/// Open and closed trades in one feed payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradesSnapshot {
    #[serde(default)]
    pub open_trades: Vec<OpenTrade>,
    #[serde(default)]
    pub closed_trades: Vec<ClosedTrade>,
}

#[derive(Serialize)]
struct SaveBody<'a> {
    settings: SavePayload<'a>,
}

#[derive(Serialize)]
struct SavePayload<'a> {
    #[serde(flatten)]
    tree: &'a SettingsTree,
    market_preset: &'a str,
}

// ============================================================================
// CLIENT
// ============================================================================

/// Thin reqwest wrapper over the engine REST contract.
pub struct EngineApiClient {
    config: EngineApiConfig,
    client: reqwest::Client,
}

impl EngineApiClient {
    pub fn new(config: EngineApiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        Self::new(EngineApiConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn get_data<T: DeserializeOwned>(&self, path: &str) -> EngineResult<T> {
        let response = self.client.get(self.url(path)).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope<T> = response.json().await?;
        if !envelope.success {
            return Err(EngineApiError::Rejected);
        }
        envelope.data.ok_or(EngineApiError::MissingData)
    }

    /// Fetch the persisted settings tree.
    pub async fn get_strategy_settings(&self) -> EngineResult<StoredSettings> {
        self.get_data("/api/paper-trading/strategy-settings").await
    }

    /// Push the whole settings tree back to the engine.
    pub async fn put_strategy_settings(
        &self,
        settings: &SettingsTree,
        market_preset: &str,
    ) -> EngineResult<()> {
        let body = SaveBody {
            settings: SavePayload {
                tree: settings,
                market_preset,
            },
        };

        let response = self
            .client
            .put(self.url("/api/paper-trading/strategy-settings"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope<serde_json::Value> = response.json().await?;
        if !envelope.success {
            return Err(EngineApiError::Rejected);
        }
        Ok(())
    }

    /// Fetch the live portfolio snapshot.
    pub async fn get_portfolio(&self) -> EngineResult<Portfolio> {
        self.get_data("/api/paper-trading/portfolio").await
    }

    /// Fetch open and closed trades.
    pub async fn get_trades(&self) -> EngineResult<TradesSnapshot> {
        self.get_data("/api/paper-trading/trades").await
    }
}

// ============================================================================
// BACKGROUND SYNC
// ============================================================================

/// One-shot settings load at startup. A failure keeps the hardcoded
/// defaults in place and surfaces a warning alert; it never wipes state.
pub async fn load_remote_settings(client: &EngineApiClient, state: &DashboardState) {
    match client.get_strategy_settings().await {
        Ok(stored) => {
            info!("Loaded strategy settings from engine");
            state
                .replace_settings(stored.settings, stored.market_preset)
                .await;
        }
        Err(e) => {
            warn!("Could not load strategy settings from engine: {}", e);
            state
                .alert(
                    "warning",
                    "Could not load saved settings; using defaults".to_string(),
                )
                .await;
        }
    }
}

/// Poll the engine for portfolio and trades on a fixed interval, replacing
/// the dashboard's market snapshot wholesale on each success. A failed poll
/// marks the feed degraded and leaves the previous snapshot visible.
pub async fn run_feed_sync(
    client: Arc<EngineApiClient>,
    state: Arc<DashboardState>,
    poll_interval_secs: u64,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(poll_interval_secs));

    loop {
        interval.tick().await;

        match refresh_once(&client, &state).await {
            Ok(()) => {
                if state.set_feed_status(FeedStatus::Live).await {
                    info!("Engine feed connected ({})", client.base_url());
                }
            }
            Err(e) => {
                debug!("Feed poll failed: {}", e);
                if state.set_feed_status(FeedStatus::Degraded).await {
                    warn!("Engine feed degraded: {}", e);
                    state
                        .alert("warning", format!("Lost connection to engine: {}", e))
                        .await;
                }
            }
        }
    }
}

async fn refresh_once(client: &EngineApiClient, state: &DashboardState) -> EngineResult<()> {
    let portfolio = client.get_portfolio().await?;
    let trades = client.get_trades().await?;
    state
        .replace_market_data(portfolio, trades.open_trades, trades.closed_trades)
        .await;
    Ok(())
}
