//! Built-in market-condition presets.
//!
//! A preset is a complete, named settings tree applied atomically: selecting
//! one replaces the whole tree, it never merges with the prior state. Users
//! pick a preset in the settings dialog and then fine-tune individual fields
//! from there.

use serde::Serialize;

use super::merge::SettingsError;
use super::tree::{
    BollingerSettings, EngineSettings, MacdSettings, MarketCondition, RiskLevel, RiskSettings,
    RsiSettings, SettingsTree, SignalCombinationMode, StochasticSettings, StrategySettings,
    VolumeSettings,
};

/// Display metadata for the settings dialog's preset picker.
#[derive(Debug, Clone, Serialize)]
pub struct PresetInfo {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

pub const LOW_VOLATILITY: &str = "low_volatility";
pub const NORMAL_VOLATILITY: &str = "normal_volatility";
pub const HIGH_VOLATILITY: &str = "high_volatility";

/// Metadata for all built-in presets, in display order.
pub fn all_presets() -> Vec<PresetInfo> {
    vec![
        PresetInfo {
            key: LOW_VOLATILITY,
            name: "Low Volatility",
            description: "Quiet markets: tight stops, wider indicator bands, patient entries",
            icon: "waves",
        },
        PresetInfo {
            key: NORMAL_VOLATILITY,
            name: "Normal Volatility",
            description: "Balanced defaults for everyday market conditions",
            icon: "activity",
        },
        PresetInfo {
            key: HIGH_VOLATILITY,
            name: "High Volatility",
            description: "Turbulent markets: wide stops, strict signal agreement, fewer positions",
            icon: "zap",
        },
    ]
}

/// Resolve a preset key to its full settings tree (total replacement).
pub fn apply_preset(key: &str) -> Result<SettingsTree, SettingsError> {
    match key {
        LOW_VOLATILITY => Ok(low_volatility()),
        NORMAL_VOLATILITY => Ok(normal_volatility()),
        HIGH_VOLATILITY => Ok(high_volatility()),
        other => Err(SettingsError::UnknownPreset {
            key: other.to_string(),
        }),
    }
}

/// Display name for a preset key, for notifications.
pub fn preset_name(key: &str) -> Option<&'static str> {
    all_presets().into_iter().find(|p| p.key == key).map(|p| p.name)
}

pub fn low_volatility() -> SettingsTree {
    SettingsTree {
        strategies: StrategySettings {
            rsi: RsiSettings {
                enabled: true,
                period: 14,
                oversold_threshold: 35.0,
                overbought_threshold: 65.0,
            },
            macd: MacdSettings {
                enabled: true,
                fast_period: 12,
                slow_period: 26,
                signal_period: 9,
            },
            volume: VolumeSettings {
                enabled: false,
                lookback_period: 20,
                spike_multiplier: 2.5,
            },
            bollinger: BollingerSettings {
                enabled: true,
                period: 20,
                std_dev_multiplier: 1.8,
            },
            stochastic: Some(StochasticSettings {
                enabled: true,
                ..StochasticSettings::default()
            }),
        },
        risk: RiskSettings {
            max_position_size: 1_500.0,
            stop_loss_percent: 2.0,
            take_profit_percent: 4.0,
            trailing_stop_percent: 1.0,
            max_daily_loss: 200.0,
            max_open_positions: 8,
            max_leverage: 3.0,
            correlation_limit: 0.7,
            risk_per_trade_percent: 1.0,
        },
        engine: EngineSettings {
            min_confidence_threshold: 0.6,
            signal_combination_mode: SignalCombinationMode::Weighted,
            enabled_strategies: vec![
                "rsi".to_string(),
                "macd".to_string(),
                "bollinger".to_string(),
                "stochastic".to_string(),
            ],
            market_condition: MarketCondition::LowVolatility,
            risk_level: RiskLevel::Conservative,
            data_resolution: Some("15m".to_string()),
        },
    }
}

pub fn normal_volatility() -> SettingsTree {
    SettingsTree {
        strategies: StrategySettings {
            rsi: RsiSettings {
                enabled: true,
                period: 14,
                oversold_threshold: 30.0,
                overbought_threshold: 70.0,
            },
            macd: MacdSettings {
                enabled: true,
                fast_period: 12,
                slow_period: 26,
                signal_period: 9,
            },
            volume: VolumeSettings {
                enabled: true,
                lookback_period: 20,
                spike_multiplier: 2.0,
            },
            bollinger: BollingerSettings {
                enabled: true,
                period: 20,
                std_dev_multiplier: 2.0,
            },
            stochastic: Some(StochasticSettings::default()),
        },
        risk: RiskSettings {
            max_position_size: 1_000.0,
            stop_loss_percent: 3.5,
            take_profit_percent: 7.0,
            trailing_stop_percent: 2.0,
            max_daily_loss: 300.0,
            max_open_positions: 5,
            max_leverage: 5.0,
            correlation_limit: 0.6,
            risk_per_trade_percent: 2.0,
        },
        engine: EngineSettings {
            min_confidence_threshold: 0.65,
            signal_combination_mode: SignalCombinationMode::Weighted,
            enabled_strategies: vec![
                "rsi".to_string(),
                "macd".to_string(),
                "volume".to_string(),
                "bollinger".to_string(),
            ],
            market_condition: MarketCondition::NormalVolatility,
            risk_level: RiskLevel::Moderate,
            data_resolution: Some("5m".to_string()),
        },
    }
}

pub fn high_volatility() -> SettingsTree {
    SettingsTree {
        strategies: StrategySettings {
            rsi: RsiSettings {
                enabled: true,
                period: 10,
                oversold_threshold: 25.0,
                overbought_threshold: 75.0,
            },
            macd: MacdSettings {
                enabled: true,
                fast_period: 8,
                slow_period: 21,
                signal_period: 5,
            },
            volume: VolumeSettings {
                enabled: true,
                lookback_period: 14,
                spike_multiplier: 1.5,
            },
            bollinger: BollingerSettings {
                enabled: true,
                period: 14,
                std_dev_multiplier: 2.5,
            },
            stochastic: Some(StochasticSettings {
                enabled: false,
                ..StochasticSettings::default()
            }),
        },
        risk: RiskSettings {
            max_position_size: 500.0,
            stop_loss_percent: 6.0,
            take_profit_percent: 12.0,
            trailing_stop_percent: 3.5,
            max_daily_loss: 500.0,
            max_open_positions: 3,
            max_leverage: 10.0,
            correlation_limit: 0.5,
            risk_per_trade_percent: 3.0,
        },
        engine: EngineSettings {
            min_confidence_threshold: 0.75,
            signal_combination_mode: SignalCombinationMode::Majority,
            enabled_strategies: vec![
                "rsi".to_string(),
                "macd".to_string(),
                "volume".to_string(),
                "bollinger".to_string(),
            ],
            market_condition: MarketCondition::HighVolatility,
            risk_level: RiskLevel::Aggressive,
            data_resolution: Some("1m".to_string()),
        },
    }
}
