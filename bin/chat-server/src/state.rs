//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::config::Config;
use crate::entities::AnyStore;
use crate::inference::InferenceClient;

/// State shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Append-only chat log.
    pub store: Arc<AnyStore>,
    /// Model service used by `POST /chat`.
    pub inference: Arc<dyn InferenceClient>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("model", &self.inference.model())
            .finish()
    }
}
