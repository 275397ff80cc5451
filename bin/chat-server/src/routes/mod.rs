//! Axum router construction.
//!
//! [`build`] assembles the complete application router:
//! - Middleware layers (CORS, per-request trace-ID injection)
//! - Liveness `/` and health `/health`
//! - The chat endpoint `/chat`
//! - The OpenAPI document at `/api-docs/openapi.json`

mod chat;
pub mod doc;
mod health;

use axum::{Router, middleware, routing::get};
use std::sync::Arc;
use tower::ServiceBuilder;

use crate::middleware::{cors, trace};
use crate::state::AppState;

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::router())
        .merge(chat::router())
        .route("/api-docs/openapi.json", get(doc::openapi_json))
        // Outermost layers execute first on the way in.
        .layer(ServiceBuilder::new().layer(cors::cors_layer(&state)))
        .layer(middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}
