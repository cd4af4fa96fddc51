//! HTTP server hosting the queue API
//!
//! Serves the router built by `create_router` with graceful shutdown driven
//! by a broadcast channel, so the service can stop the listener on demand.

use crate::http::handlers::{
    analytics_handler, estimate_handler, get_customer_handler, health_handler, join_handler,
    list_queue_handler, list_waiting_handler, metrics_handler, next_customer_handler,
    remove_customer_handler, root_handler, set_counters_handler, update_status_handler, ApiState,
};
use anyhow::{Context, Result};
use axum::{
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    /// Host to bind to (typically "0.0.0.0" for all interfaces)
    pub host: String,
    /// Port to bind the server to
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Build the API router
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/queue", get(list_queue_handler))
        .route("/queue/join", post(join_handler))
        .route("/queue/waiting", get(list_waiting_handler))
        .route(
            "/queue/{id}",
            get(get_customer_handler).delete(remove_customer_handler),
        )
        .route("/queue/{id}/status", put(update_status_handler))
        .route("/analytics/summary", get(analytics_handler))
        .route("/next-customer", get(next_customer_handler))
        .route("/settings/counters", post(set_counters_handler))
        .route("/estimate", get(estimate_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// HTTP server for the queue API
pub struct HttpServer {
    config: HttpServerConfig,
    state: ApiState,
    shutdown_tx: broadcast::Sender<()>,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(config: HttpServerConfig, state: ApiState) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            state,
            shutdown_tx,
        }
    }

    /// Bind the configured address
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid HTTP server address")?;

        TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind HTTP server to {}", addr))
    }

    /// Serve on an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let app = create_router(self.state.clone());
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        info!("HTTP server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("HTTP server shutdown signal received");
            })
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Stop the HTTP server
    pub fn stop(&self) {
        info!("Stopping HTTP server...");

        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to HTTP server: {}", e);
        }
    }
}
