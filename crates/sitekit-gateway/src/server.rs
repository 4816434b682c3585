// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use sitekit_core::SitekitError;
use sitekit_leads::{LeadPipeline, PopupGate};
use sitekit_worker::CacheWorker;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::{handlers, proxy, sse};

/// Health state for the unauthenticated health/metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub pipeline: Arc<LeadPipeline>,
    pub worker: Arc<CacheWorker>,
    pub popup: Arc<PopupGate>,
    /// Origin the gateway fronts; request paths are resolved against it.
    pub origin: String,
    /// Bearer token for the push relay; `None` keeps it disabled.
    pub push_token: Option<String>,
    pub health: HealthState,
}

impl GatewayState {
    pub fn new(
        pipeline: Arc<LeadPipeline>,
        worker: Arc<CacheWorker>,
        popup: Arc<PopupGate>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            pipeline,
            worker,
            popup,
            origin: origin.into().trim_end_matches('/').to_string(),
            push_token: None,
            health: HealthState {
                start_time: std::time::Instant::now(),
                prometheus_render: None,
            },
        }
    }

    pub fn with_push_token(mut self, token: Option<String>) -> Self {
        self.push_token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn with_metrics(mut self, render: Arc<dyn Fn() -> String + Send + Sync>) -> Self {
        self.health.prometheus_render = Some(render);
        self
    }
}

/// Gateway server configuration (mirrors `GatewayConfig` from sitekit-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Build the gateway router.
///
/// - `GET /health`, `GET /metrics`
/// - `POST /__sitekit/leads`, `POST /__sitekit/leads/sync`
/// - `GET|POST /__sitekit/popup`
/// - `POST /__sitekit/message`, `GET /__sitekit/events`
/// - `POST /__sitekit/push` (bearer token)
/// - anything else goes through the cache worker
pub fn build_router(state: GatewayState) -> Router {
    let control_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .route("/__sitekit/leads", post(handlers::post_lead))
        .route("/__sitekit/leads/sync", post(handlers::post_sync))
        .route(
            "/__sitekit/popup",
            get(handlers::get_popup).post(handlers::post_popup),
        )
        .route("/__sitekit/message", post(handlers::post_message))
        .route("/__sitekit/events", get(sse::worker_events))
        .route("/__sitekit/push", post(handlers::post_push));

    control_routes
        .fallback(proxy::fetch_through_worker)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until `shutdown` resolves.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), SitekitError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SitekitError::Network {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| SitekitError::Network {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_debug() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("127.0.0.1"));
    }
}
