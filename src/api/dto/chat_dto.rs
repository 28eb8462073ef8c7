//! Conversation and message DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{ChatSummary, Message};

/// One entry of the conversation list.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummaryDto {
    /// The other participant.
    pub peer_user_id: String,
    /// Peer display name.
    pub peer_display_name: String,
    /// Peer avatar reference.
    pub peer_avatar: Option<String>,
    /// Body of the latest message.
    pub last_message_content: String,
    /// Time of the latest message.
    pub last_message_time: DateTime<Utc>,
    /// Id of the latest message; pass as `beforeId` with `before` to fetch
    /// the next page.
    pub last_message_id: i64,
}

impl From<ChatSummary> for ChatSummaryDto {
    fn from(summary: ChatSummary) -> Self {
        Self {
            peer_user_id: summary.peer_user_id.into_inner(),
            peer_display_name: summary.peer_display_name,
            peer_avatar: summary.peer_avatar,
            last_message_content: summary.last_message_content,
            last_message_time: summary.last_message_time,
            last_message_id: summary.last_message_id,
        }
    }
}

/// A stored message in a conversation page.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    /// Store id; pass as `beforeId` to page past identical timestamps.
    pub id: i64,
    /// Author.
    pub sender_id: String,
    /// Addressee.
    pub receiver_id: String,
    /// Message body.
    pub content: String,
    /// Server-assigned creation time.
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageDto {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id.into_inner(),
            receiver_id: message.receiver_id.into_inner(),
            content: message.content,
            created_at: message.created_at,
        }
    }
}
