//! Language-model inference.
//!
//! [`InferenceClient`] is the seam between the chat endpoint and the model
//! service. [`ollama::OllamaClient`] talks to a local Ollama server; tests
//! substitute their own implementations.

pub mod ollama;

use async_trait::async_trait;
use thiserror::Error;

pub use ollama::OllamaClient;

/// Failures of a single generate call.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The service could not be reached or the response body could not be read.
    #[error("inference service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("inference service returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The service answered 2xx with a body we do not understand.
    #[error("unexpected inference response: {0}")]
    Decode(String),
}

/// A synchronous, single-shot text generator.
#[async_trait]
pub trait InferenceClient: Send + Sync + 'static {
    /// Model identifier every call is made with.
    fn model(&self) -> &str;

    /// Generate a reply to `prompt`. No streaming, no retries.
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError>;
}
