//! The strategy/risk/engine settings tree.
//!
//! This is the JSON contract shared with the engine's
//! `strategy-settings` endpoint. The tree is always replaced wholesale,
//! never mutated in place; see [`crate::settings::merge`] for the single
//! audited path-update function.

use serde::{Deserialize, Serialize};

/// Full settings tree: five indicator strategies, nine risk limits, and the
/// engine-level knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsTree {
    pub strategies: StrategySettings,
    pub risk: RiskSettings,
    pub engine: EngineSettings,
}

impl Default for SettingsTree {
    /// New sessions start from the normal-volatility preset.
    fn default() -> Self {
        crate::settings::presets::normal_volatility()
    }
}

/// The five indicator blocks. `stochastic` is optional: older engine
/// payloads omit it entirely, and it is hydrated with defaults on first
/// toggle rather than patched read-site by read-site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySettings {
    pub rsi: RsiSettings,
    pub macd: MacdSettings,
    pub volume: VolumeSettings,
    pub bollinger: BollingerSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stochastic: Option<StochasticSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsiSettings {
    pub enabled: bool,
    pub period: u32,
    pub oversold_threshold: f64,
    pub overbought_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdSettings {
    pub enabled: bool,
    pub fast_period: u32,
    pub slow_period: u32,
    pub signal_period: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeSettings {
    pub enabled: bool,
    pub lookback_period: u32,
    pub spike_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BollingerSettings {
    pub enabled: bool,
    pub period: u32,
    pub std_dev_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StochasticSettings {
    pub enabled: bool,
    pub k_period: u32,
    pub d_period: u32,
    pub oversold_threshold: f64,
    pub overbought_threshold: f64,
    pub extreme_oversold: f64,
    pub extreme_overbought: f64,
}

impl Default for StochasticSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            k_period: 14,
            d_period: 3,
            oversold_threshold: 20.0,
            overbought_threshold: 80.0,
            extreme_oversold: 10.0,
            extreme_overbought: 90.0,
        }
    }
}

/// Nine numeric risk limits. `correlation_limit` is stored as a fraction
/// (0.0–1.0) but displayed as a percentage; see
/// [`crate::settings::convert`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSettings {
    pub max_position_size: f64,
    pub stop_loss_percent: f64,
    pub take_profit_percent: f64,
    pub trailing_stop_percent: f64,
    pub max_daily_loss: f64,
    pub max_open_positions: u32,
    pub max_leverage: f64,
    pub correlation_limit: f64,
    pub risk_per_trade_percent: f64,
}

/// Engine-level knobs. `min_confidence_threshold` is fraction-stored,
/// percent-displayed like `correlation_limit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub min_confidence_threshold: f64,
    pub signal_combination_mode: SignalCombinationMode,
    pub enabled_strategies: Vec<String>,
    pub market_condition: MarketCondition,
    pub risk_level: RiskLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_resolution: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCombinationMode {
    Weighted,
    Majority,
    Unanimous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketCondition {
    LowVolatility,
    NormalVolatility,
    HighVolatility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Conservative,
    Moderate,
    Aggressive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tree_is_normal_volatility() {
        let tree = SettingsTree::default();
        assert_eq!(tree.engine.market_condition, MarketCondition::NormalVolatility);
    }

    #[test]
    fn test_absent_stochastic_deserializes_to_none() {
        let tree = SettingsTree::default();
        let mut json = serde_json::to_value(&tree).unwrap();
        json["strategies"]
            .as_object_mut()
            .unwrap()
            .remove("stochastic");

        let parsed: SettingsTree = serde_json::from_value(json).unwrap();
        assert!(parsed.strategies.stochastic.is_none());

        // And an absent block stays absent on the wire.
        let reserialized = serde_json::to_value(&parsed).unwrap();
        assert!(reserialized["strategies"].get("stochastic").is_none());
    }

    #[test]
    fn test_enum_wire_format_is_snake_case() {
        assert_eq!(
            serde_json::to_value(MarketCondition::HighVolatility).unwrap(),
            "high_volatility"
        );
        assert_eq!(
            serde_json::to_value(SignalCombinationMode::Weighted).unwrap(),
            "weighted"
        );
        assert_eq!(serde_json::to_value(RiskLevel::Moderate).unwrap(), "moderate");
    }

    #[test]
    fn test_stochastic_defaults_match_contract() {
        let s = StochasticSettings::default();
        assert_eq!(s.k_period, 14);
        assert_eq!(s.d_period, 3);
        assert_eq!(s.oversold_threshold, 20.0);
        assert_eq!(s.overbought_threshold, 80.0);
        assert_eq!(s.extreme_oversold, 10.0);
        assert_eq!(s.extreme_overbought, 90.0);
    }
}
