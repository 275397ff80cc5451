//! The chat endpoint.
//!
//! One `POST /chat` is one turn: the user message is recorded, the model is
//! asked for a reply, the reply is recorded and returned. How the user record
//! relates to the model call is set by [`TurnCommit`].

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chat_types::{ChatReply, ChatRequest, MAX_MESSAGE_CHARS, Role};
use tracing::{debug, info, warn};
use utoipa::OpenApi;

use crate::config::TurnCommit;
use crate::entities::{MessageStore, NewMessage};
use crate::error::ServerError;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(chat), components(schemas(ChatRequest, ChatReply)))]
pub struct ChatApi;

/// Register the chat route.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/chat", post(chat))
}

/// Chat turn (`POST /chat`).
///
/// Failures are reported as `{"error": …}` with HTTP 200. Only a body that is
/// not a JSON object gets a 4xx status, still with an `error` payload.
#[utoipa::path(
    post,
    path = "/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Reply generated, or the turn failed", body = ChatReply),
        (status = 422, description = "Body is not a chat request", body = ChatReply),
    )
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            warn!(error = %rejection, "malformed chat request");
            return (rejection.status(), Json(ChatReply::error(rejection.body_text())))
                .into_response();
        }
    };

    match run_turn(&state, req.message).await {
        Ok(reply) => Json(ChatReply::response(reply)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Reject messages the store or the model should never see.
fn validate(message: &str) -> Result<(), ServerError> {
    if message.trim().is_empty() {
        return Err(ServerError::BadRequest("message must not be empty".into()));
    }
    let chars = message.chars().count();
    if chars > MAX_MESSAGE_CHARS {
        return Err(ServerError::BadRequest(format!(
            "message too long ({chars} characters); maximum is {MAX_MESSAGE_CHARS}"
        )));
    }
    Ok(())
}

/// Run one turn and return the generated reply.
pub async fn run_turn(state: &AppState, message: String) -> Result<String, ServerError> {
    validate(&message)?;
    debug!(
        message_len = message.len(),
        policy = %state.config.turn_commit,
        "chat turn started"
    );

    let (user, bot) = match state.config.turn_commit {
        TurnCommit::Eager => {
            let user = state.store.append(NewMessage::now(Role::User, message)).await?;
            let reply = state.inference.generate(&user.content).await?;
            let bot = state.store.append(NewMessage::now(Role::Bot, reply)).await?;
            (user, bot)
        }
        TurnCommit::Atomic => {
            // Stamped now, written only once the reply exists.
            let user = NewMessage::now(Role::User, message);
            let reply = state.inference.generate(&user.content).await?;
            state
                .store
                .append_turn(user, NewMessage::now(Role::Bot, reply))
                .await?
        }
    };

    info!(
        user_id = user.id,
        bot_id = bot.id,
        received_at = %user.timestamp,
        reply_len = bot.content.len(),
        "chat turn persisted"
    );
    Ok(bot.content)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use crate::routes::build;
    use crate::routes::testing::{StubInference, call, post_json, state_with};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tracing_test::traced_test;

    #[tokio::test]
    async fn successful_turn_stores_user_then_bot() {
        for policy in [TurnCommit::Atomic, TurnCommit::Eager] {
            let state = state_with(StubInference::replying("hi there"), policy).await;
            let app = build(state.clone());

            let (status, body) = call(&app, post_json("/chat", json!({ "message": "hello" }))).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({ "response": "hi there" }));

            let rows = state.store.all_messages().await.unwrap();
            assert_eq!(rows.len(), 2, "policy {policy}");
            assert_eq!((rows[0].role, rows[0].content.as_str()), (Role::User, "hello"));
            assert_eq!((rows[1].role, rows[1].content.as_str()), (Role::Bot, "hi there"));
            assert!(rows[0].id < rows[1].id);
        }
    }

    #[tokio::test]
    async fn every_turn_adds_exactly_two_rows() {
        let state = state_with(StubInference::replying("ok"), TurnCommit::Atomic).await;
        let app = build(state.clone());

        for (i, text) in ["one", "two", "three"].into_iter().enumerate() {
            call(&app, post_json("/chat", json!({ "message": text }))).await;
            let rows = state.store.all_messages().await.unwrap();
            assert_eq!(rows.len(), 2 * (i + 1));
        }
        let rows = state.store.all_messages().await.unwrap();
        assert!(rows.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[tokio::test]
    #[traced_test]
    async fn inference_failure_is_an_error_payload_with_200() {
        let stub = StubInference::failing("model crashed");
        let state = state_with(stub, TurnCommit::Atomic).await;

        let (status, body) =
            call(&build(state.clone()), post_json("/chat", json!({ "message": "hello" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "error": "Failed to get response: inference service returned 500: model crashed" })
        );
        assert!(logs_contain("inference failed"));
    }

    #[tokio::test]
    async fn atomic_policy_leaves_nothing_after_failure() {
        let state = state_with(StubInference::failing("down"), TurnCommit::Atomic).await;
        call(&build(state.clone()), post_json("/chat", json!({ "message": "hello" }))).await;
        assert!(state.store.all_messages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn eager_policy_keeps_the_orphaned_user_record() {
        let state = state_with(StubInference::failing("down"), TurnCommit::Eager).await;
        call(&build(state.clone()), post_json("/chat", json!({ "message": "hello" }))).await;

        let rows = state.store.all_messages().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].role, Role::User);
    }

    #[tokio::test]
    #[traced_test]
    async fn store_failure_hides_database_detail() {
        for (policy, expected_calls) in [(TurnCommit::Atomic, 1), (TurnCommit::Eager, 0)] {
            let stub = StubInference::replying("hi there");
            let state = state_with(stub.clone(), policy).await;
            state.store.drop_messages().await.unwrap();

            let (status, body) =
                call(&build(state), post_json("/chat", json!({ "message": "hello" }))).await;
            assert_eq!(status, StatusCode::OK, "policy {policy}");
            assert_eq!(body, json!({ "error": "Failed to get response: database error" }));
            // Eager writes the user record first, so the model is never asked.
            assert_eq!(stub.calls(), expected_calls, "policy {policy}");
        }
        assert!(logs_contain("message store write failed"));
    }

    #[tokio::test]
    async fn blank_or_missing_message_is_rejected_before_any_work() {
        let stub = StubInference::replying("unused");
        let state = state_with(stub.clone(), TurnCommit::Eager).await;
        let app = build(state.clone());

        for body in [json!({ "message": "" }), json!({ "message": "  \n\t" }), json!({})] {
            let (status, reply) = call(&app, post_json("/chat", body)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(reply, json!({ "error": "message must not be empty" }));
        }
        assert_eq!(stub.calls(), 0);
        assert!(state.store.all_messages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn oversized_message_is_rejected() {
        let stub = StubInference::replying("unused");
        let state = state_with(stub.clone(), TurnCommit::Atomic).await;

        let long = "x".repeat(MAX_MESSAGE_CHARS + 1);
        let (_, reply) = call(&build(state), post_json("/chat", json!({ "message": long }))).await;
        let error = reply["error"].as_str().unwrap_or_default();
        assert!(error.starts_with("message too long"), "{error}");
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn raw_message_is_stored_untrimmed() {
        let state = state_with(StubInference::replying("ok"), TurnCommit::Atomic).await;
        call(&build(state.clone()), post_json("/chat", json!({ "message": "  hello  " }))).await;
        let rows = state.store.all_messages().await.unwrap();
        assert_eq!(rows[0].content, "  hello  ");
    }

    #[tokio::test]
    async fn non_json_body_gets_error_payload() {
        let state = state_with(StubInference::replying("unused"), TurnCommit::Atomic).await;
        let req = Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from("not json"))
            .unwrap();

        let (status, body) = call(&build(state), req).await;
        assert!(status.is_client_error());
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn trace_id_is_echoed() {
        use tower::ServiceExt;

        let state = state_with(StubInference::replying("ok"), TurnCommit::Atomic).await;
        let id = "1b4e28ba-2fa1-11d2-883f-0016d3cca427";
        let req = Request::builder()
            .uri("/")
            .header("x-trace-id", id)
            .body(Body::empty())
            .unwrap();

        let resp = build(state).oneshot(req).await.unwrap();
        assert_eq!(
            resp.headers().get("x-trace-id").and_then(|v| v.to_str().ok()),
            Some(id)
        );
    }
}
