//! HTTP route handlers for the support inbox API.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::inbox::core::errors::InboxError;
use crate::inbox::core::ids::ConversationId;
use crate::inbox::engine::outbound::OutboundMessage;
use crate::inbox::index::merger::MergeOutcome;
use crate::inbox::ingest::wire::RawMessage;
use crate::inbox::presentation::views::{ConversationRow, MessageView};

use super::state::AppState;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/conversations", get(list_conversations))
        .route("/api/conversations/{id}/messages", get(conversation_messages))
        .route("/api/conversations/{id}/select", post(select_conversation))
        .route("/api/notifications", post(incoming_notification))
        .route("/api/messages", post(send_message))
        .with_state(state)
}

/// Map an inbox error to a status code and message.
fn error_response(err: InboxError) -> (StatusCode, String) {
    let status = match &err {
        InboxError::UnknownConversation(_) => StatusCode::NOT_FOUND,
        InboxError::DuplicateConversation(_) => StatusCode::CONFLICT,
        InboxError::InvalidRecord(_)
        | InboxError::EmptyMessage
        | InboxError::NoSelection
        | InboxError::EmptySnapshot => StatusCode::BAD_REQUEST,
        InboxError::Http(_) | InboxError::Feed(_) => StatusCode::BAD_GATEWAY,
        InboxError::InvalidConfig(_)
        | InboxError::Serialization(_)
        | InboxError::Url(_)
        | InboxError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "support-inbox",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Conversation list response.
#[derive(Debug, Serialize)]
pub struct ConversationsResponse {
    /// Rows in rank order.
    pub conversations: Vec<ConversationRow>,
    /// Selected conversation.
    pub selected: Option<ConversationId>,
}

/// List conversations, most recently active first.
async fn list_conversations(State(state): State<Arc<AppState>>) -> Json<ConversationsResponse> {
    let inbox = state.inbox.lock().await;
    Json(ConversationsResponse {
        conversations: inbox.conversation_rows(Utc::now()),
        selected: inbox.selected(),
    })
}

/// Thread of one conversation.
async fn conversation_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ConversationId>,
) -> Result<Json<Vec<MessageView>>, (StatusCode, String)> {
    let inbox = state.inbox.lock().await;
    inbox.thread(id).map(Json).map_err(error_response)
}

/// Change the selected conversation.
async fn select_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ConversationId>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut inbox = state.inbox.lock().await;
    inbox.select_conversation(id).map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Merge one pushed notification.
async fn incoming_notification(
    State(state): State<Arc<AppState>>,
    Json(raw): Json<RawMessage>,
) -> Result<Json<MergeOutcome>, (StatusCode, String)> {
    let mut inbox = state.inbox.lock().await;
    inbox.merge_raw(raw).map(Json).map_err(error_response)
}

/// Send request from the composer.
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    /// Message text.
    pub body: String,
}

/// Compose a message for the selected conversation and hand it to the sender.
async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SendRequest>,
) -> Result<(StatusCode, Json<OutboundMessage>), (StatusCode, String)> {
    let outbound = state
        .inbox
        .lock()
        .await
        .compose_outbound(&request.body)
        .map_err(error_response)?;

    state
        .sender
        .send(outbound.clone())
        .await
        .map_err(error_response)?;

    Ok((StatusCode::ACCEPTED, Json(outbound)))
}
