//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{ChatRequest, ChatResponse, ErrorResponse, SessionResponse, SuccessResponse};
use super::AppState;
use crate::error::TurnError;
use crate::runtime::SessionHandle;
use crate::widget::BUSY_MESSAGE;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session lifecycle
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", delete(delete_session))
        // SSE streaming
        .route("/api/sessions/:id/stream", get(stream_session))
        // Visitor actions
        .route("/api/sessions/:id/chat", post(send_chat))
        .route("/api/sessions/:id/open", post(open_widget))
        .route("/api/sessions/:id/close", post(close_widget))
        .route("/api/sessions/:id/toggle", post(toggle_widget))
        .route("/api/sessions/:id/refresh", post(refresh_session))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session Lifecycle
// ============================================================

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionResponse>) {
    let session_id = state.sessions.create().await;
    (StatusCode::CREATED, Json(SessionResponse { session_id }))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    if state.sessions.remove(&id).await {
        Ok(Json(SuccessResponse { success: true }))
    } else {
        Err(AppError::session_not_found(&id))
    }
}

async fn lookup(state: &AppState, id: &str) -> Result<SessionHandle, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::session_not_found(id))
}

// ============================================================
// SSE Streaming
// ============================================================

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (init_event, broadcast_rx) = state
        .sessions
        .subscribe(&id)
        .await
        .ok_or_else(|| AppError::session_not_found(&id))?;

    Ok(sse_stream(init_event, broadcast_rx))
}

// ============================================================
// Visitor Actions
// ============================================================

async fn send_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<(StatusCode, Json<ChatResponse>), AppError> {
    let handle = lookup(&state, &id).await?;

    // Claimed before spawning so a second request sees the turn in flight
    let guard = handle.widget.begin_send(&req.text).map_err(|e| match e {
        TurnError::Busy => AppError::Conflict(BUSY_MESSAGE.to_string()),
        other => AppError::BadRequest(other.to_string()),
    })?;

    // The reply arrives over SSE
    let widget = handle.widget;
    tokio::spawn(async move {
        if let Err(e) = widget.finish_send(guard, &req.text).await {
            tracing::debug!(session_id = %id, error = %e, "Turn ended without a reply");
        }
    });

    Ok((StatusCode::ACCEPTED, Json(ChatResponse { queued: true })))
}

async fn open_widget(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    lookup(&state, &id).await?.widget.open();
    Ok(Json(SuccessResponse { success: true }))
}

async fn close_widget(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    lookup(&state, &id).await?.widget.close();
    Ok(Json(SuccessResponse { success: true }))
}

async fn toggle_widget(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    lookup(&state, &id).await?.widget.toggle();
    Ok(Json(SuccessResponse { success: true }))
}

async fn refresh_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    lookup(&state, &id).await?.widget.refresh();
    Ok(Json(SuccessResponse { success: true }))
}

async fn get_version() -> &'static str {
    concat!("concierge ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
}

impl AppError {
    fn session_not_found(id: &str) -> Self {
        AppError::NotFound(format!("Session not found: {id}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
