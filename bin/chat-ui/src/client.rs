//! HTTP client for the chat API.
//!
//! The UI never shows a structured error: every failure becomes an inline
//! `Error: …` string that takes the place of the bot turn.

use async_trait::async_trait;
use chat_types::{ChatReply, ChatRequest, Liveness};
use thiserror::Error;
use tracing::{debug, warn};

/// Ways a chat call can fail, as seen from the UI.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-200 status.
    #[error("{status} {body}")]
    Status { status: u16, body: String },

    /// The API answered 200 with an `error` payload.
    #[error("{0}")]
    Api(String),
}

/// Where the UI sends user messages.
#[async_trait]
pub trait ChatBackend: Send + Sync + 'static {
    /// Send one message and return the text to show as the bot turn.
    /// Never fails: errors come back as inline text. No retries.
    async fn send(&self, message: &str) -> String;
}

/// [`ChatBackend`] speaking the `POST /chat` contract over HTTP.
#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpChatBackend {
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.as_ref().trim_end_matches('/').to_owned(),
        }
    }

    /// `GET /` on the API.
    pub async fn check_liveness(&self) -> Result<Liveness, reqwest::Error> {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    async fn chat(&self, message: &str) -> Result<String, ClientError> {
        let response = self
            .client
            .post(format!("{}/chat", self.base_url))
            .json(&ChatRequest::new(message))
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        match response.json::<ChatReply>().await? {
            ChatReply::Response { response } => Ok(response),
            ChatReply::Error { error } => Err(ClientError::Api(error)),
        }
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn send(&self, message: &str) -> String {
        match self.chat(message).await {
            Ok(reply) => {
                debug!(reply_len = reply.len(), "chat reply received");
                reply
            }
            Err(e) => {
                warn!(error = %e, "chat request failed");
                format!("Error: {e}")
            }
        }
    }
}


// ── Tests ──────────────────────────────────────────────────────────────────────
