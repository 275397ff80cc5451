//! Unified server error type.
//!
//! Handlers return `Result<T, ServerError>`. [`ServerError`] implements
//! [`axum::response::IntoResponse`] and always renders the `{"error": …}`
//! payload of the chat contract with HTTP 200: a failed turn is an answer,
//! not a server fault.
//!
//! Database errors are logged with full detail but only a generic message is
//! returned to the caller so that SQL and file paths never leak to clients.

use axum::Json;
use axum::response::{IntoResponse, Response};
use chat_types::ChatReply;
use thiserror::Error;
use tracing::{error, warn};

use crate::inference::InferenceError;

/// All errors that can occur while handling a chat turn.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A write to the message store failed.
    #[error("database error: {0}")]
    Store(#[from] sqlx::Error),

    /// The model service could not produce a reply.
    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// The caller sent an empty or oversized message.
    #[error("{0}")]
    BadRequest(String),
}

impl ServerError {
    /// Text placed in the `error` field of the reply.
    pub fn client_message(&self) -> String {
        match self {
            ServerError::Store(_) => "Failed to get response: database error".to_owned(),
            ServerError::Inference(e) => format!("Failed to get response: {e}"),
            ServerError::BadRequest(m) => m.clone(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match &self {
            ServerError::Store(e) => error!(error = %e, "message store write failed"),
            ServerError::Inference(e) => warn!(error = %e, "inference failed"),
            ServerError::BadRequest(m) => warn!(reason = %m, "rejected chat request"),
        }
        Json(ChatReply::error(self.client_message())).into_response()
    }
}
