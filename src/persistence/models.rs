//! Database row models for messages and conversation summaries.

use chrono::{DateTime, Utc};

use crate::domain::{ChatSummary, Message, UserId};

/// A row from the `messages` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MessageRow {
    /// Auto-increment row ID.
    pub id: i64,
    /// Author's user id.
    pub sender_id: String,
    /// Addressee's user id.
    pub receiver_id: String,
    /// Message body.
    pub content: String,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            sender_id: UserId::from(row.sender_id),
            receiver_id: UserId::from(row.receiver_id),
            content: row.content,
            created_at: row.created_at,
        }
    }
}

/// Latest message per peer joined with the peer's profile.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SummaryRow {
    /// The other participant.
    pub peer_id: String,
    /// Peer display name, already defaulted to the peer id.
    pub peer_display_name: String,
    /// Peer avatar reference.
    pub peer_avatar: Option<String>,
    /// Id of the latest message.
    pub message_id: i64,
    /// Body of the latest message.
    pub content: String,
    /// Creation time of the latest message.
    pub created_at: DateTime<Utc>,
}

impl From<SummaryRow> for ChatSummary {
    fn from(row: SummaryRow) -> Self {
        Self {
            peer_user_id: UserId::from(row.peer_id),
            peer_display_name: row.peer_display_name,
            peer_avatar: row.peer_avatar,
            last_message_content: row.content,
            last_message_time: row.created_at,
            last_message_id: row.message_id,
        }
    }
}
