//! Paper Trading Dashboard Service
//!
//! Serves the web dashboard's JSON API and SSE stream, backed by the
//! trading engine's REST API:
//!
//! - **Equity curve** derived from closed-trade history (or interpolated
//!   when no dated history exists), anchored to the live portfolio snapshot
//! - **Strategy settings** with three market-condition presets, path-scoped
//!   field edits, and save-through to the engine
//! - **Live feed** polling portfolio and trades, pushed to clients over SSE
//! - **Non-fatal failure handling**: load/save/feed errors surface as
//!   alerts while the last good in-memory state stays visible

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

use paper_dashboard::config::AppConfig;
use paper_dashboard::dashboard::{self, DashboardConfig, DashboardContext, DashboardState};
use paper_dashboard::engine_api::{self, EngineApiClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("paper_dashboard=info".parse().unwrap()),
        )
        .init();

    dotenvy::dotenv().ok();

    info!("Paper Trading Dashboard Service v{}", env!("CARGO_PKG_VERSION"));

    // =========================================================================
    // 1. LOAD CONFIGURATION
    // =========================================================================
    let app_config = AppConfig::from_env();
    let dashboard_config = DashboardConfig::from_env();

    info!(
        "   Initial balance: ${:.2} | feed poll: {}s",
        app_config.initial_balance, app_config.poll_interval_secs
    );

    // =========================================================================
    // 2. INITIALIZE ENGINE CLIENT
    // =========================================================================
    let engine = Arc::new(EngineApiClient::from_env());
    info!("[ENGINE] API base: {}", engine.base_url());

    // =========================================================================
    // 3. BUILD DASHBOARD STATE
    // =========================================================================
    let state = DashboardState::new(app_config.initial_balance);
    info!("[STATE] Seeded with normal-volatility settings preset");

    // =========================================================================
    // 4. LOAD SAVED SETTINGS FROM ENGINE
    // =========================================================================
    // A failed load keeps the hardcoded defaults and raises an alert.
    engine_api::load_remote_settings(&engine, &state).await;

    // =========================================================================
    // 5. SPAWN FEED SYNC
    // =========================================================================
    let sync_client = engine.clone();
    let sync_state = state.clone();
    let poll_interval = app_config.poll_interval_secs;
    let sync_handle = tokio::spawn(async move {
        engine_api::run_feed_sync(sync_client, sync_state, poll_interval).await;
    });

    // =========================================================================
    // 6. SPAWN DASHBOARD SERVER
    // =========================================================================
    let context = DashboardContext {
        state: state.clone(),
        engine: engine.clone(),
    };
    let dashboard_handle = dashboard::server::spawn_dashboard_server(context, dashboard_config);

    // =========================================================================
    // 7. RUN UNTIL SHUTDOWN
    // =========================================================================
    info!("All systems operational");

    tokio::select! {
        _ = sync_handle => {
            error!("Feed sync task exited unexpectedly");
        }
        _ = dashboard_handle => {
            // The server handles ctrl-c / SIGTERM internally.
            info!("Shutdown complete");
        }
    }

    Ok(())
}
