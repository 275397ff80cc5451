//! Liveness and health endpoints.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chat_types::Liveness;
use serde_json::{Value, json};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_root, get_health), components(schemas(Liveness)))]
pub struct HealthApi;

/// Register liveness and health routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_root))
        .route("/health", get(get_health))
}

/// Liveness endpoint.
///
/// Returns the configured greeting; the payload never changes while the
/// process runs.
#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses(
        (status = 200, description = "API is running", body = Liveness)
    )
)]
pub async fn get_root(State(state): State<Arc<AppState>>) -> Json<Liveness> {
    Json(Liveness {
        message: state.config.greeting.clone(),
    })
}

/// Heartbeat endpoint.
///
/// Returns `{"status": "ok", "version": "...", "model": "..."}` with HTTP 200.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is healthy", body = Value)
    )
)]
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status":  "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model":   state.inference.model(),
    }))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
