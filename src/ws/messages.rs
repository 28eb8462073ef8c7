//! WebSocket wire frames.
//!
//! Both directions use the same camelCase JSON shape:
//! `{senderId, receiverId, content, createdAt}`. On the way in only
//! `receiverId` and `content` are trusted; on the way out every field comes
//! from the stored message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Message, NewMessage, UserId};

/// Frame sent by a client to deliver a message.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundFrame {
    /// Claimed author. Ignored: the connection's identity is used instead.
    #[serde(default)]
    pub sender_id: Option<String>,
    /// Addressee.
    pub receiver_id: String,
    /// Message body.
    pub content: String,
}

impl InboundFrame {
    /// Builds an unstamped message authored by `sender`, whatever the
    /// frame claims.
    #[must_use]
    pub fn into_message(self, sender: UserId) -> NewMessage {
        NewMessage::new(sender, UserId::from(self.receiver_id), self.content)
    }
}

/// Frame pushed to a recipient for a stored message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundFrame {
    /// Store id, usable as a history cursor tiebreak.
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

impl From<&Message> for OutboundFrame {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id.to_string(),
            receiver_id: message.receiver_id.to_string(),
            content: message.content.clone(),
            created_at: message.created_at,
        }
    }
}
