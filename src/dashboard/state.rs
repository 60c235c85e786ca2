//! Shared application state for the dashboard.
//!
//! All trading data lives here: the latest market snapshot from the engine
//! feed, the in-memory settings tree, and the broadcast channel that fans
//! events out to SSE subscribers. Updates always replace values wholesale —
//! handlers never reach into a snapshot and mutate it — which is what keeps
//! the equity-curve memo and the SSE stream coherent.

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

use crate::engine_api::StoredSettings;
use crate::equity::build_equity_curve;
use crate::settings::{self, presets, SettingsError, SettingsTree};
use crate::types::{ClosedTrade, EquityPoint, OpenTrade, Portfolio};

/// Engine feed health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedStatus {
    Starting,
    Live,
    Degraded,
}

impl std::fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedStatus::Starting => write!(f, "starting"),
            FeedStatus::Live => write!(f, "live"),
            FeedStatus::Degraded => write!(f, "degraded"),
        }
    }
}

/// Event types for SSE broadcasts.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum DashboardEvent {
    #[serde(rename = "portfolio")]
    Portfolio(Portfolio),
    #[serde(rename = "positions")]
    Positions(Vec<OpenTrade>),
    #[serde(rename = "settings")]
    Settings(StoredSettings),
    #[serde(rename = "status")]
    Status { status: FeedStatus },
    #[serde(rename = "alert")]
    Alert { level: String, message: String },
}

/// Latest engine snapshot. `revision` increments on every replacement and
/// keys the equity-curve memo.
#[derive(Debug, Clone, Default)]
pub struct MarketData {
    pub revision: u64,
    pub portfolio: Portfolio,
    pub open_trades: Vec<OpenTrade>,
    pub closed_trades: Vec<ClosedTrade>,
}

/// Memoized equity curve, valid for one (data revision, calendar day) pair.
struct CurveCache {
    revision: u64,
    today: NaiveDate,
    points: Vec<EquityPoint>,
}

/// Shared dashboard state.
pub struct DashboardState {
    /// Paper-account starting balance, the equity curve's baseline.
    initial_balance: f64,

    /// Latest market snapshot from the engine feed.
    market: RwLock<MarketData>,

    /// Current settings tree, replaced wholesale on every edit.
    settings: RwLock<SettingsTree>,

    /// Selected preset identifier, if the current tree came from one.
    market_preset: RwLock<Option<String>>,

    /// Engine feed health.
    feed_status: RwLock<FeedStatus>,

    /// Broadcast channel for SSE events.
    event_tx: broadcast::Sender<DashboardEvent>,

    /// Last computed equity curve.
    curve_cache: RwLock<Option<CurveCache>>,
}

impl DashboardState {
    /// Create state seeded with the normal-volatility settings preset.
    pub fn new(initial_balance: f64) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(1024);

        Arc::new(Self {
            initial_balance,
            market: RwLock::new(MarketData::default()),
            settings: RwLock::new(SettingsTree::default()),
            market_preset: RwLock::new(Some(presets::NORMAL_VOLATILITY.to_string())),
            feed_status: RwLock::new(FeedStatus::Starting),
            event_tx,
            curve_cache: RwLock::new(None),
        })
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    /// Subscribe to SSE events.
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.event_tx.subscribe()
    }

    /// Broadcast an event to all SSE subscribers.
    pub fn broadcast(&self, event: DashboardEvent) {
        // Ignore send errors (no subscribers).
        let _ = self.event_tx.send(event);
    }

    /// Broadcast a user-visible alert.
    pub async fn alert(&self, level: &str, message: String) {
        self.broadcast(DashboardEvent::Alert {
            level: level.to_string(),
            message,
        });
    }

    // ------------------------------------------------------------------
    // Market data
    // ------------------------------------------------------------------

    /// Replace the market snapshot wholesale and notify subscribers.
    pub async fn replace_market_data(
        &self,
        portfolio: Portfolio,
        open_trades: Vec<OpenTrade>,
        closed_trades: Vec<ClosedTrade>,
    ) {
        {
            let mut market = self.market.write().await;
            market.revision += 1;
            market.portfolio = portfolio.clone();
            market.open_trades = open_trades.clone();
            market.closed_trades = closed_trades;
        }

        self.broadcast(DashboardEvent::Portfolio(portfolio));
        self.broadcast(DashboardEvent::Positions(open_trades));
    }

    pub async fn market_snapshot(&self) -> MarketData {
        self.market.read().await.clone()
    }

    pub async fn portfolio(&self) -> Portfolio {
        self.market.read().await.portfolio.clone()
    }

    /// The 30-day equity curve for the chart, memoized on the market-data
    /// revision and the calendar day so render-path requests don't redo the
    /// derivation when nothing changed.
    pub async fn equity_curve(&self, today: NaiveDate) -> Vec<EquityPoint> {
        let market = self.market.read().await;

        {
            let cache = self.curve_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.revision == market.revision && cached.today == today {
                    return cached.points.clone();
                }
            }
        }

        let points = build_equity_curve(
            &market.closed_trades,
            &market.portfolio,
            self.initial_balance,
            today,
        );
        let revision = market.revision;
        drop(market);

        *self.curve_cache.write().await = Some(CurveCache {
            revision,
            today,
            points: points.clone(),
        });
        points
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// Current settings tree plus selected preset.
    pub async fn settings_snapshot(&self) -> StoredSettings {
        StoredSettings {
            settings: self.settings.read().await.clone(),
            market_preset: self.market_preset.read().await.clone(),
        }
    }

    /// Overwrite the settings tree wholesale (engine load, full save).
    pub async fn replace_settings(&self, tree: SettingsTree, market_preset: Option<String>) {
        *self.settings.write().await = tree;
        *self.market_preset.write().await = market_preset;

        self.broadcast(DashboardEvent::Settings(self.settings_snapshot().await));
    }

    /// Apply a named preset: total replacement of the tree, plus a
    /// notification naming the preset.
    pub async fn apply_preset(&self, key: &str) -> Result<StoredSettings, SettingsError> {
        let tree = settings::apply_preset(key)?;
        self.replace_settings(tree, Some(key.to_string())).await;

        let name = presets::preset_name(key).unwrap_or(key);
        info!("Applied settings preset: {}", name);
        self.alert("info", format!("Applied preset: {}", name)).await;

        Ok(self.settings_snapshot().await)
    }

    /// Apply one dot-addressed field edit. The tree is replaced wholesale
    /// with the updated copy; a failed edit leaves state untouched.
    pub async fn update_field(
        &self,
        path: &str,
        value: &serde_json::Value,
    ) -> Result<StoredSettings, SettingsError> {
        let updated = {
            let current = self.settings.read().await;
            settings::set_field(&current, path, value)?
        };

        debug!(
            "Strategy settings updated: {} = {}",
            path,
            settings::convert::describe(path, value)
        );

        let preset = self.market_preset.read().await.clone();
        self.replace_settings(updated, preset).await;
        Ok(self.settings_snapshot().await)
    }

    /// Enable/disable a strategy block, hydrating the optional stochastic
    /// block with defaults when it is absent.
    pub async fn toggle_strategy(
        &self,
        strategy: &str,
        enabled: bool,
    ) -> Result<StoredSettings, SettingsError> {
        let updated = {
            let current = self.settings.read().await;
            settings::toggle_strategy_enabled(&current, strategy, enabled)?
        };

        let preset = self.market_preset.read().await.clone();
        self.replace_settings(updated, preset).await;
        Ok(self.settings_snapshot().await)
    }

    // ------------------------------------------------------------------
    // Feed status
    // ------------------------------------------------------------------

    pub async fn feed_status(&self) -> FeedStatus {
        *self.feed_status.read().await
    }

    /// Update feed health. Returns true when the status actually changed;
    /// a change is broadcast to subscribers.
    pub async fn set_feed_status(&self, status: FeedStatus) -> bool {
        let mut current = self.feed_status.write().await;
        if *current == status {
            return false;
        }
        *current = status;
        drop(current);

        self.broadcast(DashboardEvent::Status { status });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::presets;
    use crate::types::TradeSide;
    use chrono::{DateTime, Utc};
    use serde_json::json;

    fn sample_portfolio() -> Portfolio {
        Portfolio {
            equity: 10_250.0,
            total_pnl: 250.0,
            total_pnl_percentage: 2.5,
            total_trades: 3,
            win_rate: 66.7,
            max_drawdown: 1.2,
            sharpe_ratio: 1.1,
        }
    }

    fn dated_trade(id: &str, pnl: f64, close_time: &str) -> ClosedTrade {
        ClosedTrade {
            id: id.to_string(),
            symbol: "BTC/USDT".to_string(),
            side: TradeSide::Buy,
            quantity: 1.0,
            entry_price: 40_000.0,
            exit_price: None,
            pnl: Some(pnl),
            close_time: Some(
                DateTime::parse_from_rfc3339(close_time)
                    .unwrap()
                    .with_timezone(&Utc),
            ),
        }
    }

    #[tokio::test]
    async fn test_new_state_starts_from_normal_preset() {
        let state = DashboardState::new(10_000.0);
        let snapshot = state.settings_snapshot().await;

        assert_eq!(snapshot.settings, presets::normal_volatility());
        assert_eq!(
            snapshot.market_preset.as_deref(),
            Some(presets::NORMAL_VOLATILITY)
        );
        assert_eq!(state.feed_status().await, FeedStatus::Starting);
    }

    #[tokio::test]
    async fn test_apply_preset_replaces_tree_and_notifies() {
        let state = DashboardState::new(10_000.0);
        let mut rx = state.subscribe();

        state.apply_preset(presets::HIGH_VOLATILITY).await.unwrap();

        let snapshot = state.settings_snapshot().await;
        assert_eq!(snapshot.settings, presets::high_volatility());
        assert_eq!(snapshot.settings.risk.max_leverage, 10.0);
        assert_eq!(
            snapshot.market_preset.as_deref(),
            Some(presets::HIGH_VOLATILITY)
        );

        // Settings event first, then an alert naming the preset.
        assert!(matches!(rx.recv().await.unwrap(), DashboardEvent::Settings(_)));
        match rx.recv().await.unwrap() {
            DashboardEvent::Alert { level, message } => {
                assert_eq!(level, "info");
                assert!(message.contains("High Volatility"));
            }
            other => panic!("expected alert, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_preset_leaves_state_untouched() {
        let state = DashboardState::new(10_000.0);
        let before = state.settings_snapshot().await;

        assert!(state.apply_preset("sideways").await.is_err());

        let after = state.settings_snapshot().await;
        assert_eq!(after.settings, before.settings);
        assert_eq!(after.market_preset, before.market_preset);
    }

    #[tokio::test]
    async fn test_update_field_replaces_wholesale() {
        let state = DashboardState::new(10_000.0);

        let snapshot = state
            .update_field("risk.stop_loss_percent", &json!(5.0))
            .await
            .unwrap();
        assert_eq!(snapshot.settings.risk.stop_loss_percent, 5.0);

        // A failed edit changes nothing.
        assert!(state.update_field("risk.bogus", &json!(1.0)).await.is_err());
        let after = state.settings_snapshot().await;
        assert_eq!(after.settings.risk.stop_loss_percent, 5.0);
    }

    #[tokio::test]
    async fn test_toggle_strategy_hydrates_stochastic() {
        let state = DashboardState::new(10_000.0);

        // Simulate an engine payload without the stochastic block.
        let mut tree = SettingsTree::default();
        tree.strategies.stochastic = None;
        state.replace_settings(tree, None).await;

        let snapshot = state.toggle_strategy("stochastic", true).await.unwrap();
        let block = snapshot.settings.strategies.stochastic.unwrap();
        assert!(block.enabled);
        assert_eq!(block.k_period, 14);
    }

    #[tokio::test]
    async fn test_equity_curve_memoized_until_data_changes() {
        let state = DashboardState::new(10_000.0);
        let today = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();

        state
            .replace_market_data(
                sample_portfolio(),
                vec![],
                vec![dated_trade("a", 250.0, "2025-06-20T09:00:00Z")],
            )
            .await;

        let first = state.equity_curve(today).await;
        let second = state.equity_curve(today).await;
        assert_eq!(first, second);
        assert_eq!(first.len(), 30);
        assert_eq!(first[29].equity, 10_250.0);

        // New data invalidates the memo.
        let mut richer = sample_portfolio();
        richer.equity = 10_400.0;
        richer.total_pnl = 400.0;
        state
            .replace_market_data(
                richer,
                vec![],
                vec![
                    dated_trade("a", 250.0, "2025-06-20T09:00:00Z"),
                    dated_trade("b", 150.0, "2025-06-22T09:00:00Z"),
                ],
            )
            .await;

        let third = state.equity_curve(today).await;
        assert_eq!(third[29].equity, 10_400.0);
        assert_ne!(first, third);
    }

    #[tokio::test]
    async fn test_feed_status_broadcasts_on_change_only() {
        let state = DashboardState::new(10_000.0);
        let mut rx = state.subscribe();

        assert!(state.set_feed_status(FeedStatus::Live).await);
        assert!(!state.set_feed_status(FeedStatus::Live).await);
        assert!(state.set_feed_status(FeedStatus::Degraded).await);

        assert!(matches!(
            rx.recv().await.unwrap(),
            DashboardEvent::Status {
                status: FeedStatus::Live
            }
        ));
        assert!(matches!(
            rx.recv().await.unwrap(),
            DashboardEvent::Status {
                status: FeedStatus::Degraded
            }
        ));
    }

    #[tokio::test]
    async fn test_replace_market_data_broadcasts_portfolio_and_positions() {
        let state = DashboardState::new(10_000.0);
        let mut rx = state.subscribe();

        state
            .replace_market_data(sample_portfolio(), vec![], vec![])
            .await;

        assert!(matches!(rx.recv().await.unwrap(), DashboardEvent::Portfolio(_)));
        assert!(matches!(rx.recv().await.unwrap(), DashboardEvent::Positions(_)));
    }
}
