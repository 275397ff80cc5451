//! chat-ui – entry point.
//!
//! Serves the browser page and forwards submitted messages to chat-server.
//! The two processes only share the HTTP contract; the UI starts even when
//! the API is down and shows the failure inline on the first send.

mod client;
mod config;
mod render;
mod routes;
mod session;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use crate::client::HttpChatBackend;
use crate::config::Config;
use crate::render::Renderer;
use crate::session::SessionRegistry;
use crate::state::UiState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::from_env();
    init_tracing(&cfg);
    info!(version = env!("CARGO_PKG_VERSION"), "chat-ui starting");

    let backend = HttpChatBackend::new(&cfg.api_url);
    match backend.check_liveness().await {
        Ok(live) => info!(api_url = %cfg.api_url, message = %live.message, "chat API reachable"),
        Err(e) => warn!(api_url = %cfg.api_url, error = %e, "chat API not reachable yet"),
    }

    let state = Arc::new(UiState {
        config: Arc::new(cfg.clone()),
        backend: Arc::new(backend),
        sessions: SessionRegistry::new(cfg.session_idle, cfg.max_sessions),
        renderer: Renderer::new()?,
    });

    let app = routes::build(state);
    let addr: SocketAddr = cfg.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "chat page available at http://{addr}/");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("chat-ui stopped");
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` wins over `CHAT_LOG`.
fn init_tracing(cfg: &Config) {
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: CHAT_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
