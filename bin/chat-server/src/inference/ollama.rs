//! Ollama chat client (`POST /api/chat`, non-streaming).

use std::net::IpAddr;

use async_trait::async_trait;
use chat_types::Role;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::{InferenceClient, InferenceError};

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaErrorBody {
    error: String,
}

/// Strip trailing slashes and an OpenAI-style `/v1` suffix.
fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim_end_matches('/').to_owned();
    if url.ends_with("/v1") {
        url.truncate(url.len() - 3);
    }
    url
}

/// `true` for localhost and loopback addresses, and for URLs we cannot parse.
fn is_local_url(url: &str) -> bool {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        return true;
    };
    match parsed.host_str() {
        Some("localhost") | None => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false),
    }
}

/// Client for a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: impl AsRef<str>, model: impl Into<String>) -> Self {
        let base_url = normalize_base_url(base_url.as_ref());
        if !is_local_url(&base_url) {
            warn!(
                url = %base_url,
                "Ollama URL points to a non-local address; the chat service expects a local model"
            );
        }
        Self {
            client: reqwest::Client::new(),
            base_url,
            model: model.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl InferenceClient for OllamaClient {
    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        let request = OllamaChatRequest {
            model: &self.model,
            messages: vec![OllamaMessage {
                role: Role::User.to_string(),
                content: prompt.to_owned(),
            }],
            stream: false,
        };

        let url = format!("{}/api/chat", self.base_url);
        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Ollama reports failures as `{"error": "..."}`.
            let message = serde_json::from_str::<OllamaErrorBody>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(InferenceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: OllamaChatResponse =
            serde_json::from_str(&body).map_err(|e| InferenceError::Decode(e.to_string()))?;
        debug!(reply_len = parsed.message.content.len(), "ollama replied");
        Ok(parsed.message.content)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    /// Serve `router` on an ephemeral local port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn url_normalization() {
        assert_eq!(normalize_base_url("http://localhost:11434/v1/"), "http://localhost:11434");
        assert_eq!(normalize_base_url("http://localhost:11434/"), "http://localhost:11434");
        assert_eq!(normalize_base_url("http://localhost:11434"), "http://localhost:11434");
    }

    #[test]
    fn local_url_detection() {
        assert!(is_local_url("http://localhost:11434"));
        assert!(is_local_url("http://127.0.0.1:11434"));
        assert!(is_local_url("http://[::1]:11434"));
        assert!(!is_local_url("http://192.168.1.100:11434"));
        assert!(!is_local_url("https://ollama.example.com"));
    }

    #[tokio::test]
    async fn generate_returns_message_content() {
        let router = Router::new().route(
            "/api/chat",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["model"], "gemma3:1b");
                assert_eq!(body["stream"], false);
                assert_eq!(body["messages"][0]["role"], "user");
                let prompt = body["messages"][0]["content"].as_str().unwrap_or_default();
                Json(json!({
                    "model": "gemma3:1b",
                    "message": { "role": "assistant", "content": format!("echo: {prompt}") },
                    "done": true
                }))
            }),
        );
        let client = OllamaClient::new(serve(router).await, "gemma3:1b");

        let reply = client.generate("hello").await.unwrap();
        assert_eq!(reply, "echo: hello");
    }

    #[tokio::test]
    async fn api_error_carries_ollama_message() {
        let router = Router::new().route(
            "/api/chat",
            post(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": "model 'gemma3:1b' not found" })),
                )
            }),
        );
        let client = OllamaClient::new(serve(router).await, "gemma3:1b");

        match client.generate("hello").await {
            Err(InferenceError::Api { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "model 'gemma3:1b' not found");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let router = Router::new().route("/api/chat", post(|| async { "not json" }));
        let client = OllamaClient::new(serve(router).await, "gemma3:1b");

        assert!(matches!(
            client.generate("hello").await,
            Err(InferenceError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        // Grab a free port, then release it so nothing is listening there.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = OllamaClient::new(format!("http://{addr}"), "gemma3:1b");
        assert!(matches!(
            client.generate("hello").await,
            Err(InferenceError::Transport(_))
        ));
    }
}
