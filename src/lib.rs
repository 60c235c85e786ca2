//! Paper Trading Dashboard Service
//!
//! JSON/SSE backend for the paper-trading platform's web dashboard. It
//! derives the performance chart's 30-day equity curve from closed-trade
//! history, manages the strategy/risk/engine settings tree with its
//! market-condition presets, and relays live portfolio and position data
//! from the trading engine's REST API.

pub mod config;
pub mod dashboard;
pub mod engine_api;
pub mod equity;
pub mod settings;
pub mod types;
