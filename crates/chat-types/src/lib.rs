//! Wire types shared by `chat-server` and `chat-ui`.
//!
//! The JSON shapes here are the whole contract between the two processes:
//!
//! - `POST /chat` takes a [`ChatRequest`] and answers with a [`ChatReply`].
//! - `GET /` answers with [`Liveness`].

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Upper bound on the length of an inbound user message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Author of a chat turn, both in the `messages` table and in UI sessions.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

/// Request body for `POST /chat`.
///
/// A missing `message` field deserializes to an empty string so the server
/// can reject it with the same payload as an empty message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Response body for `POST /chat`. Exactly one of the two keys is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ChatReply {
    /// Text generated by the model.
    Response { response: String },
    /// Human-readable failure description.
    Error { error: String },
}

impl ChatReply {
    pub fn response(text: impl Into<String>) -> Self {
        Self::Response { response: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::Error { error: text.into() }
    }
}

/// Body of the liveness endpoint `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Liveness {
    pub message: String,
}

// ── Tests ──────────────────────────────────────────────────────────────────────
