//! UI configuration, loaded from environment variables at startup.

use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration for chat-ui.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address the page is served on (default: `"127.0.0.1:8501"`).
    pub bind_address: String,

    /// Base URL of the chat API (default: `"http://127.0.0.1:8000"`).
    pub api_url: String,

    /// Heading shown at the top of the page.
    pub title: String,

    /// A session untouched for this long is forgotten (`CHAT_UI_SESSION_IDLE_SECS`, default 1 h).
    pub session_idle: Duration,

    /// Upper bound on live sessions; the least recently seen is dropped first.
    pub max_sessions: usize,

    /// `tracing` filter string.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8501".to_owned(),
            api_url: "http://127.0.0.1:8000".to_owned(),
            title: "💬 Chatbot".to_owned(),
            session_idle: Duration::from_secs(60 * 60),
            max_sessions: 1024,
            log_level: "info".to_owned(),
            log_json: false,
        }
    }
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_address: env_or("CHAT_UI_BIND", &defaults.bind_address),
            api_url: env_or("CHAT_API_URL", &defaults.api_url),
            title: env_or("CHAT_UI_TITLE", &defaults.title),
            session_idle: Duration::from_secs(parse_env(
                "CHAT_UI_SESSION_IDLE_SECS",
                defaults.session_idle.as_secs(),
            )),
            max_sessions: parse_env("CHAT_UI_MAX_SESSIONS", defaults.max_sessions).max(1),
            log_level: env_or("CHAT_LOG", &defaults.log_level),
            log_json: std::env::var("CHAT_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        // Runs before tracing is initialised, hence eprintln.
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            eprintln!("WARN: {key}='{raw}' is not recognised; using the default");
            default
        }),
        Err(_) => default,
    }
}
