//! Server configuration, loaded from environment variables at startup.

use std::str::FromStr;

/// How the user record of a turn relates to the inference call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TurnCommit {
    /// Stage the user record and write it together with the reply once
    /// inference succeeded. A failed turn leaves nothing behind.
    #[default]
    Atomic,
    /// Commit the user record before calling the model. A failed turn keeps
    /// the user record without a reply.
    Eager,
}

/// Runtime configuration for chat-server.
///
/// Every field has a default so the server works out-of-the-box against a
/// local Ollama without any environment variables set.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"127.0.0.1:8000"`).
    pub bind_address: String,

    /// Database URL (default: `"sqlite://chatbot.db?mode=rwc"`).
    /// The scheme selects the backend: `sqlite:` or `postgres:`.
    pub database_url: String,

    /// Base URL of the Ollama server.
    pub ollama_url: String,

    /// Model identifier passed to Ollama on every call.
    pub model: String,

    pub turn_commit: TurnCommit,

    /// Text returned by the liveness endpoint `GET /`.
    pub greeting: String,

    /// Comma-separated list of allowed CORS origins. `None` allows any origin.
    pub cors_allowed_origins: Option<String>,

    /// `tracing` filter string, e.g. `"info"` or `"debug,sqlx=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_owned(),
            database_url: "sqlite://chatbot.db?mode=rwc".to_owned(),
            ollama_url: "http://127.0.0.1:11434".to_owned(),
            model: "gemma3:1b".to_owned(),
            turn_commit: TurnCommit::Atomic,
            greeting: "Chatbot API is live!".to_owned(),
            cors_allowed_origins: None,
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
            bind_address: env_or("CHAT_BIND", &defaults.bind_address),
            database_url: env_or("CHAT_DATABASE_URL", &defaults.database_url),
            ollama_url: env_or("CHAT_OLLAMA_URL", &defaults.ollama_url),
            model: env_or("CHAT_MODEL", &defaults.model),
            turn_commit: parse_env("CHAT_TURN_COMMIT", defaults.turn_commit),
            greeting: env_or("CHAT_GREETING", &defaults.greeting),
            cors_allowed_origins: std::env::var("CHAT_CORS_ORIGINS")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            log_level: env_or("CHAT_LOG", &defaults.log_level),
            log_json: std::env::var("CHAT_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

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

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_match_local_setup() {
        let cfg = Config::default();
        assert_eq!(cfg.bind_address, "127.0.0.1:8000");
        assert_eq!(cfg.model, "gemma3:1b");
        assert_eq!(cfg.turn_commit, TurnCommit::Atomic);
        assert!(cfg.database_url.starts_with("sqlite:"));
    }

    #[test]
    fn turn_commit_parses_case_insensitively() {
        assert_eq!("eager".parse::<TurnCommit>().ok(), Some(TurnCommit::Eager));
        assert_eq!("ATOMIC".parse::<TurnCommit>().ok(), Some(TurnCommit::Atomic));
        assert!("sometimes".parse::<TurnCommit>().is_err());
    }
}
