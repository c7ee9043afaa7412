//! Route handler functions for the relay endpoints.
//!
//! Handlers stay thin: extract, delegate to `RelayService`, map errors.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;

use mentor_core::types::{
    HealthResponse, MessageListResponse, MessageReply, SendMessageRequest, ThreadCreated,
};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/health - liveness only, never touches the provider.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
    })
}

/// POST /api/threads - allocate a new conversation thread.
pub async fn create_thread(State(state): State<AppState>) -> Result<Json<ThreadCreated>, ApiError> {
    let created = state.relay.create_conversation().await.map_err(|e| {
        tracing::error!(error = %e, "Error creating thread");
        ApiError::from(e)
    })?;
    Ok(Json(created))
}

/// POST /api/messages - send a user message and return the assistant reply.
pub async fn send_message(
    State(state): State<AppState>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<Json<MessageReply>, ApiError> {
    let Json(req) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected message body");
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    let reply = state.relay.send_message(req).await.map_err(|e| {
        tracing::error!(error = %e, "Error processing message");
        ApiError::from(e)
    })?;
    Ok(Json(reply))
}

/// GET /api/threads/{thread_id}/messages - raw listing, for debugging.
pub async fn list_thread_messages(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Json<MessageListResponse>, ApiError> {
    let listing = state.relay.list_messages(&thread_id).await.map_err(|e| {
        tracing::error!(thread_id = %thread_id, error = %e, "Error getting messages");
        ApiError::from(e)
    })?;
    Ok(Json(listing))
}
