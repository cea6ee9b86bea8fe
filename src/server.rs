//! HTTP surface for the vision agent.
//!
//! Liveness and readiness probes plus a read-only view of the live body
//! metrics for the frontend and for operational checks. The pipeline never
//! depends on this server; it is a pure reader of the whiteboard.

use axum::{extract::State, http::HeaderValue, routing::get, Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::state::{ArmAngles, SharedBodyState};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Frontend origin allowed by CORS
    pub allowed_origin: String,
}

impl ServerConfig {
    pub fn new(port: u16, allowed_origin: impl Into<String>) -> Self {
        Self {
            port,
            allowed_origin: allowed_origin.into(),
        }
    }
}

/// Shared server state.
struct ServerState {
    body: SharedBodyState,
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

/// Body metrics response, shaped for the agent tool layer.
#[derive(Serialize)]
pub struct MetricsResponse {
    pub is_upper_body_only: bool,
    pub neck_angle: f64,
    pub arm_angles: ArmAngles,
    pub pointed_body_part: String,
}

/// GET /health - liveness probe.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "flexflow-vision".to_string(),
    })
}

/// GET /ready - readiness probe.
async fn ready() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "flexflow-vision".to_string(),
    })
}

/// GET /metrics - the latest committed body metrics snapshot.
async fn metrics(State(state): State<Arc<ServerState>>) -> Json<MetricsResponse> {
    let snapshot = state.body.snapshot();
    Json(MetricsResponse {
        is_upper_body_only: snapshot.is_upper_body_only,
        neck_angle: snapshot.neck_angle,
        arm_angles: snapshot.arm_angles,
        pointed_body_part: snapshot.pointed_part_label().to_string(),
    })
}

/// Run the HTTP server. Returns the bound address and a shutdown trigger.
pub async fn run(
    config: ServerConfig,
    body: SharedBodyState,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let state = Arc::new(ServerState { body });

    let origin: HeaderValue = config
        .allowed_origin
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid allowed origin: {}", config.allowed_origin))?;

    let app = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/metrics", get(metrics))
        .layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("vision agent server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("server shutdown signal received");
            })
            .await
        {
            tracing::error!("server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
