//! Chat message, history cursor and conversation summary types.

use chrono::{DateTime, Utc};

use super::UserId;

/// A message that has not been persisted yet.
///
/// Built by the connection reader from an inbound frame; `sender_id` is
/// always the authenticated identity of the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    /// Authenticated author.
    pub sender_id: UserId,
    /// Addressee.
    pub receiver_id: UserId,
    /// Message body.
    pub content: String,
    /// Server timestamp. `None` lets the store stamp it on append.
    pub created_at: Option<DateTime<Utc>>,
}

impl NewMessage {
    /// Creates an unstamped message.
    #[must_use]
    pub fn new(sender_id: UserId, receiver_id: UserId, content: impl Into<String>) -> Self {
        Self {
            sender_id,
            receiver_id,
            content: content.into(),
            created_at: None,
        }
    }

    /// Sets an explicit creation timestamp.
    #[must_use]
    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// A durably stored message. Immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Store-assigned, monotonically increasing identifier.
    pub id: i64,
    /// Author.
    pub sender_id: UserId,
    /// Addressee.
    pub receiver_id: UserId,
    /// Message body.
    pub content: String,
    /// Server-assigned creation time.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Returns `true` if this message was exchanged between `a` and `b`,
    /// in either direction.
    #[must_use]
    pub fn is_between(&self, a: &UserId, b: &UserId) -> bool {
        (&self.sender_id == a && &self.receiver_id == b)
            || (&self.sender_id == b && &self.receiver_id == a)
    }

    /// Returns the other participant from `user`'s point of view, or `None`
    /// if `user` took no part in this message.
    #[must_use]
    pub fn peer_of(&self, user: &UserId) -> Option<&UserId> {
        if &self.sender_id == user {
            Some(&self.receiver_id)
        } else if &self.receiver_id == user {
            Some(&self.sender_id)
        } else {
            None
        }
    }

    /// Store order key: creation time, then id.
    #[must_use]
    pub fn order_key(&self) -> (DateTime<Utc>, i64) {
        (self.created_at, self.id)
    }
}

/// Backward pagination cursor over a conversation.
///
/// Selects messages strictly older than `(before, before_id)`. Without a
/// `before_id` only the timestamp is compared, so messages sharing the
/// exact cursor timestamp are excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryCursor {
    /// Upper bound on creation time (exclusive).
    pub before: DateTime<Utc>,
    /// Id of the oldest message already seen at `before`.
    pub before_id: Option<i64>,
}

impl HistoryCursor {
    /// Cursor selecting everything older than `before`.
    #[must_use]
    pub const fn before(before: DateTime<Utc>) -> Self {
        Self {
            before,
            before_id: None,
        }
    }

    /// Cursor positioned just before an already-seen message.
    #[must_use]
    pub fn after_seen(message: &Message) -> Self {
        Self {
            before: message.created_at,
            before_id: Some(message.id),
        }
    }

    /// Cursor selecting the whole history up to now.
    #[must_use]
    pub fn now() -> Self {
        Self::before(Utc::now())
    }

    /// Cursor positioned just before an already-seen conversation list
    /// entry.
    #[must_use]
    pub fn after_summary(summary: &ChatSummary) -> Self {
        Self {
            before: summary.last_message_time,
            before_id: Some(summary.last_message_id),
        }
    }

    /// Returns `true` if `message` lies strictly before this cursor.
    #[must_use]
    pub fn admits(&self, message: &Message) -> bool {
        self.admits_key(message.order_key())
    }

    /// Returns `true` if the store order key `(created_at, id)` lies
    /// strictly before this cursor.
    #[must_use]
    pub fn admits_key(&self, (created_at, id): (DateTime<Utc>, i64)) -> bool {
        match self.before_id {
            Some(before_id) => (created_at, id) < (self.before, before_id),
            None => created_at < self.before,
        }
    }
}

/// Display metadata of a conversation peer, owned by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserProfile {
    /// Name shown in the conversation list.
    pub display_name: String,
    /// Avatar image reference.
    pub avatar: Option<String>,
}

/// Conversation list entry: the latest message exchanged with one peer.
///
/// Derived on every query; has no lifecycle of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSummary {
    /// The other participant.
    pub peer_user_id: UserId,
    /// Peer's display name, or the peer id when no profile exists.
    pub peer_display_name: String,
    /// Peer's avatar, if any.
    pub peer_avatar: Option<String>,
    /// Body of the latest message.
    pub last_message_content: String,
    /// Creation time of the latest message.
    pub last_message_time: DateTime<Utc>,
    /// Id of the latest message; ordering tiebreak and page cursor.
    pub last_message_id: i64,
}
