use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::agent::ChatService;
use crate::web::page::render_chat_page;

/// Messages shown on the chat page
const PAGE_MESSAGES: usize = 200;

/// Application state shared across routes
#[derive(Clone)]
pub struct AppState {
    /// Turn runner and history
    pub chat: Arc<ChatService>,
    /// Owner of every session created through the UI
    pub user_id: String,
    /// Sessions listed in the sidebar
    pub recent_sessions: usize,
}

/// Create router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // HTML chat
        .route("/", get(index))
        .route("/sessions", post(create_session_page))
        .route("/sessions/:id", get(chat_page))
        .route("/sessions/:id/messages", post(post_message))
        .route("/sessions/:id/delete", post(delete_session_page))
        // JSON API
        .route("/api/sessions", get(list_sessions).post(create_session))
        .route("/api/sessions/:id", axum::routing::delete(delete_session))
        .route("/api/sessions/:id/messages", get(session_messages))
        .route("/api/sessions/:id/chat", post(chat))
        .route("/health", get(health))
        .with_state(state)
}

fn session_url(id: &str) -> String {
    format!("/sessions/{}", id)
}

/// GET / - Most recent session, or a new one
async fn index(State(state): State<AppState>) -> Redirect {
    let history = state.chat.history();
    let id = match history.list_sessions(&state.user_id, 1).into_iter().next() {
        Some(session) => session.session_id,
        None => history.new_session(&state.user_id, None),
    };
    Redirect::to(&session_url(&id))
}

/// GET /sessions/:id - Chat page
async fn chat_page(State(state): State<AppState>, Path(id): Path<String>) -> Html<String> {
    let history = state.chat.history();
    let sessions = history.list_sessions(&state.user_id, state.recent_sessions);
    let messages = history.load(&state.user_id, &id, PAGE_MESSAGES);
    Html(render_chat_page(&id, &sessions, &messages))
}

/// POST /sessions - New chat
async fn create_session_page(State(state): State<AppState>) -> Redirect {
    let id = state.chat.history().new_session(&state.user_id, None);
    Redirect::to(&session_url(&id))
}

#[derive(Debug, Deserialize)]
struct MessageForm {
    message: String,
}

/// POST /sessions/:id/messages - Run a turn from the form
async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<MessageForm>,
) -> Redirect {
    let text = form.message.trim();
    if !text.is_empty() {
        state.chat.send(&state.user_id, &id, text).await;
    }
    Redirect::to(&session_url(&id))
}

/// POST /sessions/:id/delete - Purge a session
async fn delete_session_page(State(state): State<AppState>, Path(id): Path<String>) -> Redirect {
    if let Err(e) = state.chat.history().delete_session(&state.user_id, &id) {
        tracing::warn!(session_id = %id, "Failed to delete session: {:#}", e);
    }
    Redirect::to("/")
}

/// GET /api/sessions - Recent sessions
async fn list_sessions(State(state): State<AppState>) -> Json<serde_json::Value> {
    let sessions = state
        .chat
        .history()
        .list_sessions(&state.user_id, state.recent_sessions);
    Json(serde_json::json!({ "sessions": sessions }))
}

/// POST /api/sessions - Create a session
async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let id = state.chat.history().new_session(&state.user_id, None);
    (
        StatusCode::CREATED,
        Json(serde_json::json!({ "session_id": id })),
    )
}

/// GET /api/sessions/:id/messages - Stored conversation
async fn session_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    let messages = state.chat.history().load(&state.user_id, &id, PAGE_MESSAGES);
    Json(serde_json::json!({ "session_id": id, "messages": messages }))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
}

/// POST /api/sessions/:id/chat - Run a turn
async fn chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let text = request.message.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("message cannot be empty".into()));
    }

    let outcome = state.chat.send(&state.user_id, &id, text).await;
    Ok(Json(serde_json::json!({
        "answer": outcome.answer,
        "degraded": outcome.degraded,
        "persisted": outcome.persisted,
    })))
}

/// DELETE /api/sessions/:id - Purge a session
async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let removed = state.chat.history().delete_session(&state.user_id, &id)?;
    Ok(Json(serde_json::json!({
        "success": true,
        "messages_removed": removed,
    })))
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Error type for API handlers
#[derive(Debug)]
pub enum AppError {
    /// Unexpected failure
    Anyhow(anyhow::Error),
    /// Invalid request
    BadRequest(String),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Anyhow(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Anyhow(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
