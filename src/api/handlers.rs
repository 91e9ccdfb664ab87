//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ClearResponse, ErrorResponse, HealthResponse, QueuedResponse, SessionResponse, SubmitRequest,
    ToolsResponse,
};
use super::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session view and intents
        .route("/api/session", get(get_session))
        .route("/api/session/messages", post(submit_message))
        .route("/api/session/clear", post(clear_session))
        // SSE streaming
        .route("/api/session/stream", get(stream_session))
        // Remote service side channel
        .route("/api/health", get(backend_health))
        .route("/api/tools", get(list_tools))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session
// ============================================================

async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let snapshot = state.session.snapshot();
    let pending = snapshot.pending();
    Json(SessionResponse {
        messages: snapshot.messages,
        state: snapshot.state,
        pending,
    })
}

async fn submit_message(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<QueuedResponse>), AppError> {
    // Blank or busy submits are dropped by the session itself
    state
        .session
        .submit(req.text)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((StatusCode::ACCEPTED, Json(QueuedResponse { queued: true })))
}

async fn clear_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ClearResponse>), AppError> {
    state
        .session
        .clear()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((StatusCode::ACCEPTED, Json(ClearResponse { ok: true })))
}

async fn stream_session(State(state): State<AppState>) -> impl IntoResponse {
    // Subscribe before taking the snapshot so nothing falls in between
    let session_rx = state.session.subscribe();
    let notification_rx = state.notifications.subscribe();
    let init = state.session.snapshot();

    sse_stream(init, session_rx, notification_rx)
}

// ============================================================
// Remote Service
// ============================================================

async fn backend_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        backend_online: state.probe.is_healthy().await,
    })
}

async fn list_tools(State(state): State<AppState>) -> Result<Json<ToolsResponse>, AppError> {
    let tools = state
        .probe
        .list_tools()
        .await
        .map_err(|e| AppError::BadGateway(e.message))?;

    Ok(Json(ToolsResponse {
        count: tools.len(),
        tools,
    }))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("agent-chat ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    Internal(String),
    BadGateway(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
