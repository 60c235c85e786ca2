//! Server-Sent Events (SSE) implementation for real-time dashboard updates.
//!
//! Each client connection gets the current snapshot (portfolio, positions,
//! settings, feed status) up front, then a live stream of broadcast events.

use async_stream::stream;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::dashboard::state::{DashboardEvent, DashboardState};

/// Create an SSE stream for a client connection.
pub fn create_sse_stream(
    state: Arc<DashboardState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.subscribe();

    let stream = stream! {
        // Send the current snapshot on connection.
        let initial = [
            DashboardEvent::Portfolio(state.portfolio().await),
            DashboardEvent::Positions(state.market_snapshot().await.open_trades),
            DashboardEvent::Settings(state.settings_snapshot().await),
            DashboardEvent::Status {
                status: state.feed_status().await,
            },
        ];
        for event in initial {
            match serde_json::to_string(&event) {
                Ok(json) => yield Ok(Event::default().event(event_name(&event)).data(json)),
                Err(e) => warn!("Failed to serialize initial SSE event: {}", e),
            }
        }

        // Stream events from the broadcast channel.
        loop {
            match rx.recv().await {
                Ok(event) => {
                    match serde_json::to_string(&event) {
                        Ok(json) => {
                            debug!("SSE sending event: {}", event_name(&event));
                            yield Ok(Event::default().event(event_name(&event)).data(json));
                        }
                        Err(e) => {
                            warn!("Failed to serialize SSE event: {}", e);
                        }
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!("SSE client lagged by {} messages", n);
                    // Continue receiving
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    debug!("SSE broadcast channel closed");
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn event_name(event: &DashboardEvent) -> &'static str {
    match event {
        DashboardEvent::Portfolio(_) => "portfolio",
        DashboardEvent::Positions(_) => "positions",
        DashboardEvent::Settings(_) => "settings",
        DashboardEvent::Status { .. } => "status",
        DashboardEvent::Alert { .. } => "alert",
    }
}

/// Background task that periodically re-broadcasts feed status as a
/// heartbeat so idle clients still see liveness.
pub async fn heartbeat_broadcaster(state: Arc<DashboardState>) {
    let mut interval = tokio::time::interval(Duration::from_secs(30));

    loop {
        interval.tick().await;

        let status = state.feed_status().await;
        state.broadcast(DashboardEvent::Status { status });
    }
}
