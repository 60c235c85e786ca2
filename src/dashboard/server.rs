//! Axum server setup and configuration.
//!
//! Builds the dashboard router with all JSON/SSE routes, CORS and trace
//! middleware, and runs it with graceful shutdown support.

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::dashboard::handlers::{
    api_apply_preset, api_equity_curve, api_events, api_portfolio, api_presets, api_settings,
    api_settings_save, api_toggle_strategy, api_trades, api_update_field, health_check,
    DashboardContext,
};
use crate::dashboard::sse::heartbeat_broadcaster;

/// Dashboard server configuration
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Port to listen on
    pub port: u16,
    /// Host to bind to
    pub host: String,
    /// Enable CORS for development
    pub enable_cors: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            enable_cors: true,
        }
    }
}

impl DashboardConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("DASHBOARD_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            host: std::env::var("DASHBOARD_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            enable_cors: std::env::var("DASHBOARD_CORS")
                .map(|v| v == "1" || v.to_lowercase() == "true")
                .unwrap_or(true),
        }
    }
}

/// Dashboard server
pub struct DashboardServer {
    context: DashboardContext,
    config: DashboardConfig,
}

impl DashboardServer {
    /// Create a new dashboard server with default configuration.
    pub fn new(context: DashboardContext) -> Self {
        Self {
            context,
            config: DashboardConfig::default(),
        }
    }

    /// Create with custom configuration.
    pub fn with_config(context: DashboardContext, config: DashboardConfig) -> Self {
        Self { context, config }
    }

    /// Build the router with all routes.
    fn build_router(&self) -> Router {
        let cors = if self.config.enable_cors {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        } else {
            CorsLayer::new()
        };

        Router::new()
            // Data routes
            .route("/api/paper-trading/portfolio", get(api_portfolio))
            .route("/api/paper-trading/trades", get(api_trades))
            .route("/api/paper-trading/equity-curve", get(api_equity_curve))
            // Settings routes
            .route(
                "/api/paper-trading/strategy-settings",
                get(api_settings).put(api_settings_save),
            )
            .route(
                "/api/paper-trading/strategy-settings/preset",
                post(api_apply_preset),
            )
            .route(
                "/api/paper-trading/strategy-settings/field",
                post(api_update_field),
            )
            .route(
                "/api/paper-trading/strategy-settings/strategy",
                post(api_toggle_strategy),
            )
            .route("/api/paper-trading/presets", get(api_presets))
            // Events and health
            .route("/api/events", get(api_events))
            .route("/health", get(health_check))
            // Add state and middleware
            .with_state(self.context.clone())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server
    pub async fn run(self) -> anyhow::Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;

        info!("Starting dashboard server at http://{}", addr);

        let router = self.build_router();

        // Heartbeat keeps idle SSE clients informed of feed status.
        let state_for_heartbeat = self.context.state.clone();
        tokio::spawn(async move {
            heartbeat_broadcaster(state_for_heartbeat).await;
        });

        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("Dashboard ready at http://{}", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Dashboard server shut down");
        Ok(())
    }
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

/// Start the dashboard server in a background task.
pub fn spawn_dashboard_server(
    context: DashboardContext,
    config: DashboardConfig,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let server = DashboardServer::with_config(context, config);
        if let Err(e) = server.run().await {
            error!("Dashboard server error: {}", e);
        }
    })
}
