//! Axum router for the chat page.
//!
//! - `GET /` renders the caller's session.
//! - `POST /send` runs one submit cycle, then redirects back to `/`.
//! - `POST /clear` empties the caller's visible history, then redirects.
//!
//! Sessions are tracked with a `chat_session` cookie holding a UUID. A session
//! starts on the first non-blank send; page views alone never create one.

use std::sync::{Arc, Mutex};

use axum::extract::{Form, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::session::{ChatSession, lock, submit};
use crate::state::UiState;

pub const SESSION_COOKIE: &str = "chat_session";

/// Build the complete Axum [`Router`] for the UI.
pub fn build(state: Arc<UiState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/send", post(send))
        .route("/clear", post(clear))
        .with_state(state)
}

#[derive(Debug, Error)]
pub enum UiError {
    #[error("failed to render page: {0}")]
    Render(#[from] minijinja::Error),
}

impl IntoResponse for UiError {
    fn into_response(self) -> Response {
        error!(error = %self, "page rendering failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "failed to render page").into_response()
    }
}

#[derive(Debug, Deserialize)]
struct SendForm {
    #[serde(default)]
    message: String,
}

/// The caller's session plus the cookie to set when it was just created.
struct Visit {
    session: Arc<Mutex<ChatSession>>,
    cookie: Option<HeaderValue>,
}

fn session_id_from(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
}

/// Resolve the caller's session. A caller without a known session only gets
/// one when `create` is set; page views alone never start a session.
fn visit(state: &UiState, headers: &HeaderMap, create: bool) -> Option<Visit> {
    let id = session_id_from(headers);
    if !create {
        return state
            .sessions
            .get(id)
            .map(|session| Visit { session, cookie: None });
    }

    let (id, session, created) = state.sessions.get_or_create(id);
    let cookie = if created {
        info!(session = %id, sessions = state.sessions.len(), "session started");
        HeaderValue::from_str(&format!(
            "{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax"
        ))
        .ok()
    } else {
        None
    };
    Some(Visit { session, cookie })
}

fn with_cookie(cookie: Option<HeaderValue>, inner: impl IntoResponse) -> Response {
    let mut response = inner.into_response();
    if let Some(cookie) = cookie {
        response.headers_mut().insert(SET_COOKIE, cookie);
    }
    response
}

async fn index(
    State(state): State<Arc<UiState>>,
    headers: HeaderMap,
) -> Result<Response, UiError> {
    let page = match visit(&state, &headers, false) {
        Some(visit) => {
            let session = lock(&visit.session);
            state.renderer.page(&state.config.title, &session)?
        }
        None => state
            .renderer
            .page(&state.config.title, &ChatSession::default())?,
    };
    Ok(Html(page).into_response())
}

async fn send(
    State(state): State<Arc<UiState>>,
    headers: HeaderMap,
    Form(form): Form<SendForm>,
) -> Response {
    let create = !form.message.trim().is_empty();
    let Some(visit) = visit(&state, &headers, create) else {
        debug!("blank submission without a session");
        return Redirect::to("/").into_response();
    };
    if !submit(visit.session.clone(), state.backend.clone(), &form.message).await {
        debug!("submit ignored: blank input or reply pending");
    }
    with_cookie(visit.cookie, Redirect::to("/"))
}

async fn clear(State(state): State<Arc<UiState>>, headers: HeaderMap) -> Response {
    if let Some(visit) = visit(&state, &headers, false) {
        lock(&visit.session).clear();
        info!("session history cleared");
    }
    Redirect::to("/").into_response()
}

// ── Tests ──────────────────────────────────────────────────────────────────────
