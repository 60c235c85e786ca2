//! Core domain types shared across the dashboard service.
//!
//! These mirror the JSON the paper-trading engine produces: trades are
//! immutable once received, the portfolio snapshot is read-only, and the
//! equity point is what the performance chart consumes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Order side as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "buy"),
            TradeSide::Sell => write!(f, "sell"),
        }
    }
}

/// A trade the engine has closed out.
///
/// `close_time` is deserialized leniently: missing, null, or unparsable
/// timestamps all become `None`, which keeps the trade out of the dated
/// equity-curve path instead of poisoning the sort/grouping steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub id: String,
    pub symbol: String,
    pub side: TradeSide,
    pub quantity: f64,
    pub entry_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnl: Option<f64>,
    #[serde(
        default,
        deserialize_with = "deserialize_close_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub close_time: Option<DateTime<Utc>>,
}

/// A position still open in the paper account, shown in the terminal's
/// positions table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenTrade {
    pub id: String,
    pub symbol: String,
    pub side: TradeSide,
    pub quantity: f64,
    pub entry_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unrealized_pnl: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_time: Option<DateTime<Utc>>,
}

/// Live portfolio snapshot from the engine. Read-only on this side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Portfolio {
    pub equity: f64,
    pub total_pnl: f64,
    pub total_pnl_percentage: f64,
    pub total_trades: u32,
    pub win_rate: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
}

/// One day of the performance chart's equity series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    /// Calendar day (no time component).
    pub date: NaiveDate,
    /// Account value at end of day.
    pub equity: f64,
    /// Cumulative P&L relative to the initial balance.
    pub pnl: f64,
    /// First difference of `equity` against the previous point.
    pub daily_pnl: f64,
    /// The initial balance, constant across the series.
    pub balance: f64,
}

/// Lenient `close_time` parsing: a malformed timestamp string degrades to
/// `None` rather than failing the whole payload.
fn deserialize_close_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}
