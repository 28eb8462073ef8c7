//! Chat history handlers: conversation list and single conversation.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{ChatSummaryDto, ConversationQuery, ConversationsQuery, MessageDto};
use crate::api::extract::AuthUser;
use crate::app_state::AppState;
use crate::domain::UserId;
use crate::error::{ChatError, ErrorResponse};

/// `GET /conversations`: List the caller's conversations.
///
/// # Errors
///
/// Returns [`ChatError::Unauthenticated`] without a valid session and
/// [`ChatError::StorageError`] if the store query fails.
#[utoipa::path(
    get,
    path = "/api/v1/conversations",
    tag = "Chat",
    summary = "List conversations",
    description = "Returns one entry per peer with the latest message exchanged, most recent first. Page backward by passing the last entry's `lastMessageTime` as `before` and its `lastMessageId` as `beforeId`.",
    params(ConversationsQuery),
    responses(
        (status = 200, description = "Conversation list", body = Vec<ChatSummaryDto>),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
    )
)]
pub async fn list_conversations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<ConversationsQuery>,
) -> Result<impl IntoResponse, ChatError> {
    let summaries = state
        .chat_service
        .get_conversations(&user_id, query.before, query.before_id, query.limit)
        .await?;

    let data: Vec<ChatSummaryDto> = summaries.into_iter().map(ChatSummaryDto::from).collect();
    Ok(Json(data))
}

/// `GET /conversations/{peer_id}`: One page of a conversation.
///
/// # Errors
///
/// Returns [`ChatError::Unauthenticated`] without a valid session,
/// [`ChatError::InvalidRequest`] for an invalid peer, and
/// [`ChatError::StorageError`] if the store query fails.
#[utoipa::path(
    get,
    path = "/api/v1/conversations/{peer_id}",
    tag = "Chat",
    summary = "Get a conversation",
    description = "Returns the latest messages exchanged with `peer_id` that are older than the cursor, oldest first.",
    params(
        ("peer_id" = String, Path, description = "User id of the other participant"),
        ConversationQuery,
    ),
    responses(
        (status = 200, description = "Conversation page", body = Vec<MessageDto>),
        (status = 400, description = "Invalid peer", body = ErrorResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
    )
)]
pub async fn get_conversation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(peer_id): Path<String>,
    Query(query): Query<ConversationQuery>,
) -> Result<impl IntoResponse, ChatError> {
    let messages = state
        .chat_service
        .get_conversation(
            &user_id,
            &UserId::from(peer_id),
            query.before,
            query.before_id,
            query.limit,
        )
        .await?;

    let data: Vec<MessageDto> = messages.into_iter().map(MessageDto::from).collect();
    Ok(Json(data))
}

/// Chat history routes, mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/conversations", get(list_conversations))
        .route("/conversations/{peer_id}", get(get_conversation))
}
