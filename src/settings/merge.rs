//! Path-scoped settings updates.
//!
//! All field edits flow through [`set_field`], one audited function that
//! takes the current tree by reference and returns a fresh tree with a
//! single dot-addressed location replaced. The input is never mutated, and
//! every sibling field survives untouched. Paths take one of three shapes:
//!
//! - `strategies.<name>.<field>`
//! - `risk.<field>`
//! - `engine.<field>`
//!
//! Values arrive as JSON (the shape the dashboard API speaks) in the
//! *storage* representation; percent-displayed fields are converted by the
//! caller at the UI boundary, see [`crate::settings::convert`].

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use super::tree::{
    BollingerSettings, EngineSettings, MacdSettings, RiskSettings, RsiSettings, SettingsTree,
    StochasticSettings, StrategySettings, VolumeSettings,
};

/// Errors from settings operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("unknown preset: {key}")]
    UnknownPreset { key: String },

    #[error("unknown settings path: {path}")]
    UnknownPath { path: String },

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("invalid value for {path}: expected {expected}")]
    InvalidValue { path: String, expected: &'static str },
}

/// Return a new tree equal to `tree` except the value at `path` replaced by
/// `value`. The input tree is left untouched.
pub fn set_field(tree: &SettingsTree, path: &str, value: &Value) -> Result<SettingsTree, SettingsError> {
    let mut next = tree.clone();
    let segments: Vec<&str> = path.split('.').collect();

    match segments.as_slice() {
        ["strategies", name, field] => {
            set_strategy_field(&mut next.strategies, name, field, path, value)?
        }
        ["risk", field] => set_risk_field(&mut next.risk, field, path, value)?,
        ["engine", field] => set_engine_field(&mut next.engine, field, path, value)?,
        _ => {
            return Err(SettingsError::UnknownPath {
                path: path.to_string(),
            })
        }
    }

    Ok(next)
}

/// Enable or disable a strategy block.
///
/// For the optional `stochastic` block, an absent sub-object is hydrated
/// with its full defaults before `enabled` is written, so toggling an
/// absent strategy on never leaves partially-initialized state.
pub fn toggle_strategy_enabled(
    tree: &SettingsTree,
    strategy: &str,
    enabled: bool,
) -> Result<SettingsTree, SettingsError> {
    set_field(
        tree,
        &format!("strategies.{strategy}.enabled"),
        &Value::Bool(enabled),
    )
}

fn set_strategy_field(
    strategies: &mut StrategySettings,
    name: &str,
    field: &str,
    path: &str,
    value: &Value,
) -> Result<(), SettingsError> {
    match name {
        "rsi" => set_rsi_field(&mut strategies.rsi, field, path, value),
        "macd" => set_macd_field(&mut strategies.macd, field, path, value),
        "volume" => set_volume_field(&mut strategies.volume, field, path, value),
        "bollinger" => set_bollinger_field(&mut strategies.bollinger, field, path, value),
        "stochastic" => {
            // Hydrate the optional block on first write.
            let block = strategies
                .stochastic
                .get_or_insert_with(StochasticSettings::default);
            set_stochastic_field(block, field, path, value)
        }
        other => Err(SettingsError::UnknownStrategy {
            name: other.to_string(),
        }),
    }
}

fn set_rsi_field(s: &mut RsiSettings, field: &str, path: &str, value: &Value) -> Result<(), SettingsError> {
    match field {
        "enabled" => s.enabled = as_bool(path, value)?,
        "period" => s.period = as_u32(path, value)?,
        "oversold_threshold" => s.oversold_threshold = as_f64(path, value)?,
        "overbought_threshold" => s.overbought_threshold = as_f64(path, value)?,
        _ => return unknown(path),
    }
    Ok(())
}

fn set_macd_field(s: &mut MacdSettings, field: &str, path: &str, value: &Value) -> Result<(), SettingsError> {
    match field {
        "enabled" => s.enabled = as_bool(path, value)?,
        "fast_period" => s.fast_period = as_u32(path, value)?,
        "slow_period" => s.slow_period = as_u32(path, value)?,
        "signal_period" => s.signal_period = as_u32(path, value)?,
        _ => return unknown(path),
    }
    Ok(())
}

fn set_volume_field(s: &mut VolumeSettings, field: &str, path: &str, value: &Value) -> Result<(), SettingsError> {
    match field {
        "enabled" => s.enabled = as_bool(path, value)?,
        "lookback_period" => s.lookback_period = as_u32(path, value)?,
        "spike_multiplier" => s.spike_multiplier = as_f64(path, value)?,
        _ => return unknown(path),
    }
    Ok(())
}

fn set_bollinger_field(
    s: &mut BollingerSettings,
    field: &str,
    path: &str,
    value: &Value,
) -> Result<(), SettingsError> {
    match field {
        "enabled" => s.enabled = as_bool(path, value)?,
        "period" => s.period = as_u32(path, value)?,
        "std_dev_multiplier" => s.std_dev_multiplier = as_f64(path, value)?,
        _ => return unknown(path),
    }
    Ok(())
}

fn set_stochastic_field(
    s: &mut StochasticSettings,
    field: &str,
    path: &str,
    value: &Value,
) -> Result<(), SettingsError> {
    match field {
        "enabled" => s.enabled = as_bool(path, value)?,
        "k_period" => s.k_period = as_u32(path, value)?,
        "d_period" => s.d_period = as_u32(path, value)?,
        "oversold_threshold" => s.oversold_threshold = as_f64(path, value)?,
        "overbought_threshold" => s.overbought_threshold = as_f64(path, value)?,
        "extreme_oversold" => s.extreme_oversold = as_f64(path, value)?,
        "extreme_overbought" => s.extreme_overbought = as_f64(path, value)?,
        _ => return unknown(path),
    }
    Ok(())
}

fn set_risk_field(r: &mut RiskSettings, field: &str, path: &str, value: &Value) -> Result<(), SettingsError> {
    match field {
        "max_position_size" => r.max_position_size = as_f64(path, value)?,
        "stop_loss_percent" => r.stop_loss_percent = as_f64(path, value)?,
        "take_profit_percent" => r.take_profit_percent = as_f64(path, value)?,
        "trailing_stop_percent" => r.trailing_stop_percent = as_f64(path, value)?,
        "max_daily_loss" => r.max_daily_loss = as_f64(path, value)?,
        "max_open_positions" => r.max_open_positions = as_u32(path, value)?,
        "max_leverage" => r.max_leverage = as_f64(path, value)?,
        "correlation_limit" => r.correlation_limit = as_f64(path, value)?,
        "risk_per_trade_percent" => r.risk_per_trade_percent = as_f64(path, value)?,
        _ => return unknown(path),
    }
    Ok(())
}

fn set_engine_field(e: &mut EngineSettings, field: &str, path: &str, value: &Value) -> Result<(), SettingsError> {
    match field {
        "min_confidence_threshold" => e.min_confidence_threshold = as_f64(path, value)?,
        "signal_combination_mode" => {
            e.signal_combination_mode = as_enum(path, value, "signal combination mode")?
        }
        "enabled_strategies" => e.enabled_strategies = as_enum(path, value, "list of strategy names")?,
        "market_condition" => e.market_condition = as_enum(path, value, "market condition")?,
        "risk_level" => e.risk_level = as_enum(path, value, "risk level")?,
        "data_resolution" => {
            e.data_resolution = match value {
                Value::Null => None,
                other => Some(as_enum(path, other, "resolution string")?),
            }
        }
        _ => return unknown(path),
    }
    Ok(())
}

fn unknown(path: &str) -> Result<(), SettingsError> {
    Err(SettingsError::UnknownPath {
        path: path.to_string(),
    })
}

fn as_bool(path: &str, value: &Value) -> Result<bool, SettingsError> {
    value.as_bool().ok_or(SettingsError::InvalidValue {
        path: path.to_string(),
        expected: "boolean",
    })
}

fn as_f64(path: &str, value: &Value) -> Result<f64, SettingsError> {
    value.as_f64().ok_or(SettingsError::InvalidValue {
        path: path.to_string(),
        expected: "number",
    })
}

fn as_u32(path: &str, value: &Value) -> Result<u32, SettingsError> {
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or(SettingsError::InvalidValue {
            path: path.to_string(),
            expected: "non-negative integer",
        })
}

fn as_enum<T: DeserializeOwned>(path: &str, value: &Value, expected: &'static str) -> Result<T, SettingsError> {
    serde_json::from_value(value.clone()).map_err(|_| SettingsError::InvalidValue {
        path: path.to_string(),
        expected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::tree::{MarketCondition, SignalCombinationMode};
    use serde_json::json;

    #[test]
    fn test_set_field_does_not_mutate_input() {
        let tree = SettingsTree::default();
        let original_stop_loss = tree.risk.stop_loss_percent;

        let updated = set_field(&tree, "risk.stop_loss_percent", &json!(5.0)).unwrap();

        assert_eq!(tree.risk.stop_loss_percent, original_stop_loss);
        assert_eq!(updated.risk.stop_loss_percent, 5.0);
    }

    #[test]
    fn test_set_field_preserves_siblings() {
        let tree = SettingsTree::default();
        let updated = set_field(&tree, "risk.max_leverage", &json!(8.0)).unwrap();

        assert_eq!(updated.risk.max_leverage, 8.0);
        assert_eq!(updated.risk.stop_loss_percent, tree.risk.stop_loss_percent);
        assert_eq!(updated.strategies, tree.strategies);
        assert_eq!(updated.engine, tree.engine);
    }

    #[test]
    fn test_set_strategy_numeric_field() {
        let tree = SettingsTree::default();
        let updated = set_field(&tree, "strategies.rsi.oversold_threshold", &json!(25.0)).unwrap();
        assert_eq!(updated.strategies.rsi.oversold_threshold, 25.0);
        assert_eq!(tree.strategies.rsi.oversold_threshold, 30.0);
    }

    #[test]
    fn test_set_engine_enum_from_string() {
        let tree = SettingsTree::default();
        let updated =
            set_field(&tree, "engine.signal_combination_mode", &json!("unanimous")).unwrap();
        assert_eq!(
            updated.engine.signal_combination_mode,
            SignalCombinationMode::Unanimous
        );

        let updated = set_field(&tree, "engine.market_condition", &json!("high_volatility")).unwrap();
        assert_eq!(updated.engine.market_condition, MarketCondition::HighVolatility);
    }

    #[test]
    fn test_set_enabled_strategies_list() {
        let tree = SettingsTree::default();
        let updated =
            set_field(&tree, "engine.enabled_strategies", &json!(["rsi", "macd"])).unwrap();
        assert_eq!(updated.engine.enabled_strategies, vec!["rsi", "macd"]);
    }

    #[test]
    fn test_clear_data_resolution_with_null() {
        let tree = SettingsTree::default();
        assert!(tree.engine.data_resolution.is_some());
        let updated = set_field(&tree, "engine.data_resolution", &Value::Null).unwrap();
        assert!(updated.engine.data_resolution.is_none());
    }

    #[test]
    fn test_unknown_path_rejected() {
        let tree = SettingsTree::default();
        assert!(matches!(
            set_field(&tree, "risk.unknown_knob", &json!(1.0)),
            Err(SettingsError::UnknownPath { .. })
        ));
        assert!(matches!(
            set_field(&tree, "nonsense", &json!(1.0)),
            Err(SettingsError::UnknownPath { .. })
        ));
        assert!(matches!(
            set_field(&tree, "strategies.ichimoku.enabled", &json!(true)),
            Err(SettingsError::UnknownStrategy { .. })
        ));
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let tree = SettingsTree::default();
        assert!(matches!(
            set_field(&tree, "risk.stop_loss_percent", &json!("five")),
            Err(SettingsError::InvalidValue { .. })
        ));
        assert!(matches!(
            set_field(&tree, "strategies.rsi.enabled", &json!(1.0)),
            Err(SettingsError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_toggle_hydrates_absent_stochastic() {
        let mut tree = SettingsTree::default();
        tree.strategies.stochastic = None;

        let updated = toggle_strategy_enabled(&tree, "stochastic", true).unwrap();

        let block = updated.strategies.stochastic.expect("hydrated on toggle");
        assert!(block.enabled);
        assert_eq!(block.k_period, 14);
        assert_eq!(block.d_period, 3);
        assert_eq!(block.oversold_threshold, 20.0);
        assert_eq!(block.overbought_threshold, 80.0);
        assert_eq!(block.extreme_oversold, 10.0);
        assert_eq!(block.extreme_overbought, 90.0);

        // Input tree still has no stochastic block.
        assert!(tree.strategies.stochastic.is_none());
    }

    #[test]
    fn test_toggle_existing_strategy() {
        let tree = SettingsTree::default();
        assert!(tree.strategies.macd.enabled);

        let updated = toggle_strategy_enabled(&tree, "macd", false).unwrap();
        assert!(!updated.strategies.macd.enabled);
        // Other macd params untouched by the toggle.
        assert_eq!(updated.strategies.macd.fast_period, tree.strategies.macd.fast_period);
    }
}
