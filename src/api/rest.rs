// =============================================================================
// REST API Endpoints (Axum 0.7)
// =============================================================================
//
// All endpoints live under `/api/v1/`:
//
//   GET  /api/v1/health   liveness and uptime
//   GET  /api/v1/status   cycle stage, counters and the last cycle report
//   GET  /api/v1/config   effective runtime configuration
//   POST /api/v1/refresh  run a manual cycle and return its acknowledgment
//   GET  /api/v1/ws       push channel (see `api::ws`)
//
// CORS is permissive; there is no authentication.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::alerts::payload::canonical_time;
use crate::alerts::RefreshAck;
use crate::app_state::AppState;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/status", get(status))
        .route("/api/v1/config", get(config))
        .route("/api/v1/refresh", post(refresh))
        // ── WebSocket (handled in the ws module but mounted here) ─────────
        .route("/api/v1/ws", get(crate::api::ws::ws_handler))
        // ── Middleware & State ─────────────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    server_time: String,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.uptime_secs(),
        server_time: canonical_time(chrono::Utc::now()),
    })
}

// =============================================================================
// Status / config
// =============================================================================

async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.status())
}

async fn config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.config.as_ref().clone())
}

// =============================================================================
// Manual refresh
// =============================================================================

/// The cycle runs on its own task so a client hanging up cannot cancel it.
async fn refresh(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    info!("manual refresh requested over HTTP");
    let monitor = state.monitor.clone();
    let ack = match tokio::spawn(async move { monitor.manual_refresh().await }).await {
        Ok(ack) => ack,
        Err(e) => RefreshAck::failure(format!("refresh task failed: {e}")),
    };
    if ack.is_success() {
        (StatusCode::OK, Json(ack))
    } else {
        warn!(message = ?ack.message, "manual refresh failed");
        (StatusCode::SERVICE_UNAVAILABLE, Json(ack))
    }
}
