use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Root endpoint - basic status
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "IPTV Player Server",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "runtime": "rust"
    }))
}

/// Catalog cache stats
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CacheStats {
    categories_cached: bool,
    channel_entries: usize,
}

/// Health check response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: String,
    uptime: u64,
    environment: String,
    logged_in: bool,
    player_sessions: usize,
    cache: CacheStats,
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed().as_secs();
    let stats = state.catalog.stats().await;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime,
        environment: state.config.app_env.clone(),
        logged_in: state.credentials.current().is_some(),
        player_sessions: state.players.count().await,
        cache: CacheStats {
            categories_cached: stats.categories_cached,
            channel_entries: stats.channel_entries,
        },
    })
}

/// GET /metrics - Prometheus metrics
pub async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                b"Internal Server Error".to_vec(),
            )
        }
    }
}

/// Readiness probe. The panel is not probed here; without a stored login
/// the catalog endpoints answer 401 but the server itself is usable.
pub async fn ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.credentials.current().is_some() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::OK, "ready (no account)")
    }
}

/// Liveness probe
pub async fn live() -> impl IntoResponse {
    (StatusCode::OK, "alive")
}
