//! Web Dashboard Module
//!
//! JSON/SSE backend for the paper-trading dashboard: the web client loads
//! portfolio, trade history, the derived equity curve, and the strategy
//! settings tree from here, and receives live updates over Server-Sent
//! Events.
//!
//! # Features
//!
//! - **Real-time updates**: SSE stream of portfolio, position, settings,
//!   and feed-status events
//! - **Performance chart data**: memoized 30-day equity curve
//! - **Settings dialog backend**: presets, path-scoped field edits,
//!   strategy toggles, save-through to the engine
//! - **Feed health**: degraded-feed alerts without dropping the last good
//!   snapshot

pub mod handlers;
pub mod server;
pub mod sse;
pub mod state;

pub use handlers::DashboardContext;
pub use server::{DashboardConfig, DashboardServer};
pub use state::DashboardState;
