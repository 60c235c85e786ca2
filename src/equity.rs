//! Equity-curve derivation for the performance chart.
//!
//! Builds a fixed 30-day series of daily equity/P&L points from closed-trade
//! history, or falls back to a synthetic linear ramp when no dated history
//! exists. The final point is always anchored to the live portfolio
//! snapshot, even when that disagrees with the computed trajectory — the
//! chart's rightmost value must match the numbers shown elsewhere on the
//! dashboard.
//!
//! `build_equity_curve` is a pure function of its inputs; callers inject
//! `today` so the series is deterministic under test.

use chrono::{Days, NaiveDate};
use std::collections::BTreeMap;

use crate::types::{ClosedTrade, EquityPoint, Portfolio};

/// Number of calendar days in the chart, ending today.
pub const EQUITY_CURVE_DAYS: usize = 30;

/// Default paper-account starting balance.
pub const DEFAULT_INITIAL_BALANCE: f64 = 10_000.0;

/// Interpolation mode never dips more than this below the initial balance.
const INTERPOLATION_FLOOR_OFFSET: f64 = 1_000.0;

/// Build the 30-point daily equity series ending at `today`.
///
/// Trades without a resolvable `close_time` are ignored; if none remain the
/// curve is interpolated from `initial_balance` toward the portfolio's
/// current total P&L instead.
pub fn build_equity_curve(
    closed_trades: &[ClosedTrade],
    portfolio: &Portfolio,
    initial_balance: f64,
    today: NaiveDate,
) -> Vec<EquityPoint> {
    let daily_cumulative = cumulative_pnl_by_day(closed_trades);

    let mut points = if daily_cumulative.is_empty() {
        interpolated_curve(portfolio, initial_balance, today)
    } else {
        history_curve(&daily_cumulative, initial_balance, today)
    };

    // Anchor the rightmost point to the live snapshot. This can be
    // discontinuous with point 29 when recorded history disagrees with the
    // live equity figure; only equity and pnl are overwritten.
    if let Some(last) = points.last_mut() {
        last.equity = portfolio.equity;
        last.pnl = portfolio.total_pnl;
    }

    points
}

/// Collapse dated closed trades into cumulative P&L per close-day.
///
/// Trades are sorted ascending by close time before accumulating, so the
/// running total is correct regardless of input order. Multiple trades on
/// one day collapse to that day's final cumulative value.
fn cumulative_pnl_by_day(closed_trades: &[ClosedTrade]) -> BTreeMap<NaiveDate, f64> {
    let mut dated: Vec<_> = closed_trades
        .iter()
        .filter_map(|t| t.close_time.map(|close| (close, t.pnl.unwrap_or(0.0))))
        .collect();
    dated.sort_by_key(|(close, _)| *close);

    let mut by_day = BTreeMap::new();
    let mut cumulative = 0.0;
    for (close, pnl) in dated {
        cumulative += pnl;
        // Last write wins for the day.
        by_day.insert(close.date_naive(), cumulative);
    }
    by_day
}

/// Real-data path: carry the last known cumulative P&L forward across the
/// 30-day window. Days before the first recorded trade sit at zero.
fn history_curve(
    daily_cumulative: &BTreeMap<NaiveDate, f64>,
    initial_balance: f64,
    today: NaiveDate,
) -> Vec<EquityPoint> {
    let mut points = Vec::with_capacity(EQUITY_CURVE_DAYS);
    let mut previous_equity = None;

    for date in curve_days(today) {
        let carried = daily_cumulative
            .range(..=date)
            .next_back()
            .map(|(_, pnl)| *pnl)
            .unwrap_or(0.0);
        let equity = initial_balance + carried;
        points.push(EquityPoint {
            date,
            equity,
            pnl: carried,
            daily_pnl: previous_equity.map(|prev: f64| equity - prev).unwrap_or(0.0),
            balance: initial_balance,
        });
        previous_equity = Some(equity);
    }

    points
}

/// Fallback path: linear ramp from the initial balance to the portfolio's
/// current total P&L, floored to avoid nonsensical negative excursions.
fn interpolated_curve(
    portfolio: &Portfolio,
    initial_balance: f64,
    today: NaiveDate,
) -> Vec<EquityPoint> {
    let floor = initial_balance - INTERPOLATION_FLOOR_OFFSET;
    let mut points = Vec::with_capacity(EQUITY_CURVE_DAYS);
    let mut previous_equity = None;

    for (i, date) in curve_days(today).enumerate() {
        let progress = i as f64 / (EQUITY_CURVE_DAYS - 1) as f64;
        let equity = (initial_balance + portfolio.total_pnl * progress).max(floor);
        points.push(EquityPoint {
            date,
            equity,
            pnl: equity - initial_balance,
            daily_pnl: previous_equity.map(|prev: f64| equity - prev).unwrap_or(0.0),
            balance: initial_balance,
        });
        previous_equity = Some(equity);
    }

    points
}

/// The 30 consecutive calendar days ending at `today`, oldest first.
fn curve_days(today: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    (0..EQUITY_CURVE_DAYS).map(move |i| {
        today - Days::new((EQUITY_CURVE_DAYS - 1 - i) as u64)
    })
}
