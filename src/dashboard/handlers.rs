//! HTTP route handlers for the dashboard.
//!
//! Everything here speaks JSON. The settings family mirrors the engine's
//! envelope (`{ success, data }`) so the web client sees one shape whether
//! it talks to the engine directly or through this service. Settings saves
//! follow the keep-your-edits rule: a failed push to the engine reports
//! `success: false` and raises an alert, but the in-memory edits stay
//! visible for retry.

use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::dashboard::sse::create_sse_stream;
use crate::dashboard::state::DashboardState;
use crate::engine_api::{EngineApiClient, StoredSettings};
use crate::settings::{self, PresetInfo};

/// Handler context: shared state plus the engine client used for saves.
#[derive(Clone)]
pub struct DashboardContext {
    pub state: Arc<DashboardState>,
    pub engine: Arc<EngineApiClient>,
}

// ============================================================================
// DATA HANDLERS
// ============================================================================

/// Live portfolio snapshot.
pub async fn api_portfolio(State(ctx): State<DashboardContext>) -> impl IntoResponse {
    Json(ctx.state.portfolio().await)
}

#[derive(Debug, Serialize)]
pub struct TradesResponse {
    pub open_trades: Vec<crate::types::OpenTrade>,
    pub closed_trades: Vec<crate::types::ClosedTrade>,
}

/// Open and closed trades for the terminal and history views.
pub async fn api_trades(State(ctx): State<DashboardContext>) -> impl IntoResponse {
    let market = ctx.state.market_snapshot().await;
    Json(TradesResponse {
        open_trades: market.open_trades,
        closed_trades: market.closed_trades,
    })
}

/// 30-day equity curve for the performance chart. The ambient clock is read
/// here, at the boundary; the builder itself takes `today` as an input.
pub async fn api_equity_curve(State(ctx): State<DashboardContext>) -> impl IntoResponse {
    let today = Utc::now().date_naive();
    Json(ctx.state.equity_curve(today).await)
}

/// SSE events endpoint.
pub async fn api_events(State(ctx): State<DashboardContext>) -> impl IntoResponse {
    create_sse_stream(ctx.state)
}

// ============================================================================
// SETTINGS HANDLERS
// ============================================================================

/// Envelope matching the engine's settings responses.
#[derive(Debug, Serialize)]
pub struct SettingsEnvelope {
    pub success: bool,
    pub data: StoredSettings,
}

/// Current settings tree plus selected preset.
pub async fn api_settings(State(ctx): State<DashboardContext>) -> impl IntoResponse {
    Json(SettingsEnvelope {
        success: true,
        data: ctx.state.settings_snapshot().await,
    })
}

#[derive(Debug, Deserialize)]
pub struct SaveSettingsRequest {
    pub settings: StoredSettings,
}

#[derive(Debug, Serialize)]
pub struct SaveSettingsResponse {
    pub success: bool,
    pub message: String,
}

/// Replace the settings tree wholesale and push it to the engine.
///
/// The in-memory tree is updated before the push, so engine failures leave
/// the user's edits in place for retry.
pub async fn api_settings_save(
    State(ctx): State<DashboardContext>,
    Json(request): Json<SaveSettingsRequest>,
) -> impl IntoResponse {
    let StoredSettings {
        settings,
        market_preset,
    } = request.settings;

    ctx.state
        .replace_settings(settings.clone(), market_preset.clone())
        .await;

    let preset = market_preset.unwrap_or_else(|| "custom".to_string());
    match ctx.engine.put_strategy_settings(&settings, &preset).await {
        Ok(()) => Json(SaveSettingsResponse {
            success: true,
            message: "Settings saved".to_string(),
        }),
        Err(e) => {
            warn!("Failed to save settings to engine: {}", e);
            ctx.state
                .alert(
                    "warning",
                    "Could not save settings; your changes are kept locally".to_string(),
                )
                .await;
            Json(SaveSettingsResponse {
                success: false,
                message: format!("Engine rejected save: {}", e),
            })
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApplyPresetRequest {
    pub preset: String,
}

#[derive(Debug, Deserialize)]
pub struct FieldUpdateRequest {
    pub path: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct StrategyToggleRequest {
    pub strategy: String,
    pub enabled: bool,
}

/// Response for the in-memory settings mutations (preset, field, toggle).
#[derive(Debug, Serialize)]
pub struct SettingsMutationResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<StoredSettings>,
}

impl SettingsMutationResponse {
    fn ok(data: StoredSettings) -> Self {
        Self {
            success: true,
            message: "ok".to_string(),
            data: Some(data),
        }
    }

    fn rejected(err: settings::SettingsError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            data: None,
        }
    }
}

/// Apply a named market-condition preset (total replacement, local only;
/// the Save action pushes to the engine).
pub async fn api_apply_preset(
    State(ctx): State<DashboardContext>,
    Json(request): Json<ApplyPresetRequest>,
) -> impl IntoResponse {
    match ctx.state.apply_preset(&request.preset).await {
        Ok(snapshot) => Json(SettingsMutationResponse::ok(snapshot)),
        Err(e) => Json(SettingsMutationResponse::rejected(e)),
    }
}

/// Update a single dot-addressed settings field. Values arrive in storage
/// representation; fraction-stored, percent-displayed fields are converted
/// on the client side of this boundary.
pub async fn api_update_field(
    State(ctx): State<DashboardContext>,
    Json(request): Json<FieldUpdateRequest>,
) -> impl IntoResponse {
    match ctx.state.update_field(&request.path, &request.value).await {
        Ok(snapshot) => Json(SettingsMutationResponse::ok(snapshot)),
        Err(e) => Json(SettingsMutationResponse::rejected(e)),
    }
}

/// Enable/disable one strategy block.
pub async fn api_toggle_strategy(
    State(ctx): State<DashboardContext>,
    Json(request): Json<StrategyToggleRequest>,
) -> impl IntoResponse {
    match ctx
        .state
        .toggle_strategy(&request.strategy, request.enabled)
        .await
    {
        Ok(snapshot) => Json(SettingsMutationResponse::ok(snapshot)),
        Err(e) => Json(SettingsMutationResponse::rejected(e)),
    }
}

/// Preset metadata for the settings dialog's picker.
pub async fn api_presets() -> Json<Vec<PresetInfo>> {
    Json(settings::all_presets())
}

// ============================================================================
// HEALTH CHECK
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

static START_TIME: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();

pub async fn health_check() -> impl IntoResponse {
    let start = START_TIME.get_or_init(std::time::Instant::now);
    let uptime = start.elapsed().as_secs();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: uptime,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_api::EngineApiConfig;
    use crate::settings::presets;
    use serde_json::json;

    fn context() -> DashboardContext {
        DashboardContext {
            state: DashboardState::new(10_000.0),
            engine: Arc::new(EngineApiClient::new(EngineApiConfig::default())),
        }
    }

    #[tokio::test]
    async fn test_apply_preset_handler_rejects_unknown_key() {
        let ctx = context();
        let response = match ctx.state.apply_preset("sideways").await {
            Ok(snapshot) => SettingsMutationResponse::ok(snapshot),
            Err(e) => SettingsMutationResponse::rejected(e),
        };

        assert!(!response.success);
        assert!(response.message.contains("unknown preset"));
        assert!(response.data.is_none());
    }

    #[tokio::test]
    async fn test_field_update_response_carries_snapshot() {
        let ctx = context();
        let snapshot = ctx
            .state
            .update_field("risk.max_leverage", &json!(8.0))
            .await
            .unwrap();
        let response = SettingsMutationResponse::ok(snapshot);

        assert!(response.success);
        assert_eq!(response.data.unwrap().settings.risk.max_leverage, 8.0);
    }

    #[tokio::test]
    async fn test_settings_envelope_shape() {
        let ctx = context();
        let envelope = SettingsEnvelope {
            success: true,
            data: ctx.state.settings_snapshot().await,
        };

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["market_preset"], presets::NORMAL_VOLATILITY);
        assert!(json["data"]["strategies"]["rsi"]["enabled"].is_boolean());
    }

    #[test]
    fn test_save_request_accepts_engine_wire_shape() {
        let request: SaveSettingsRequest = serde_json::from_value(json!({
            "settings": {
                "strategies": serde_json::to_value(
                    presets::high_volatility().strategies
                ).unwrap(),
                "risk": serde_json::to_value(presets::high_volatility().risk).unwrap(),
                "engine": serde_json::to_value(presets::high_volatility().engine).unwrap(),
                "market_preset": "high_volatility"
            }
        }))
        .unwrap();

        assert_eq!(
            request.settings.market_preset.as_deref(),
            Some("high_volatility")
        );
        assert_eq!(request.settings.settings.risk.max_leverage, 10.0);
    }
}
