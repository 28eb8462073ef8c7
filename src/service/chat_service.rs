//! Chat service: read-side facade over message history.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::ChatConfig;
use crate::domain::{ChatSummary, HistoryCursor, Message, UserId};
use crate::error::ChatError;
use crate::persistence::MessageStore;

/// Default and maximum page sizes for history queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    /// Default number of messages in one conversation page.
    pub conversation: u32,
    /// Default number of entries in the conversation list.
    pub summaries: u32,
    /// Upper bound for any requested page size.
    pub max: u32,
}

impl PageLimits {
    /// Resolves a requested page size against `default` and the maximum.
    #[must_use]
    pub fn resolve(&self, requested: Option<u32>, default: u32) -> u32 {
        requested.unwrap_or(default).clamp(1, self.max.max(1))
    }
}

impl Default for PageLimits {
    fn default() -> Self {
        Self::from(&ChatConfig::default())
    }
}

impl From<&ChatConfig> for PageLimits {
    fn from(config: &ChatConfig) -> Self {
        Self {
            conversation: config.conversation_page_size,
            summaries: config.summary_page_size,
            max: config.max_page_size,
        }
    }
}

/// History browsing for request/response endpoints.
///
/// Stateless: delegates to the [`MessageStore`] and never touches live
/// routing, so any number of callers may use it concurrently.
#[derive(Debug, Clone)]
pub struct ChatService {
    store: Arc<dyn MessageStore>,
    limits: PageLimits,
}

impl ChatService {
    /// Creates a new `ChatService`.
    #[must_use]
    pub fn new(store: Arc<dyn MessageStore>, limits: PageLimits) -> Self {
        Self { store, limits }
    }

    /// Lists `user_id`'s conversations, most recently active first.
    ///
    /// `before` defaults to now. To fetch the next page pass the last
    /// entry's time as `before` and its message id as `before_id`, so peers
    /// sharing that timestamp are not skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::StorageError`] if the store query fails.
    pub async fn get_conversations(
        &self,
        user_id: &UserId,
        before: Option<DateTime<Utc>>,
        before_id: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<ChatSummary>, ChatError> {
        let cursor = HistoryCursor {
            before: before.unwrap_or_else(Utc::now),
            before_id,
        };
        let limit = self.limits.resolve(limit, self.limits.summaries);
        self.store
            .list_conversation_summaries(user_id, cursor, limit)
            .await
    }

    /// Returns one page of the conversation between `user_id` and
    /// `peer_id`, oldest first.
    ///
    /// `before` defaults to now. `before_id` breaks ties between messages
    /// sharing the cursor timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::InvalidRequest`] for a blank peer or a peer equal
    /// to the caller, and [`ChatError::StorageError`] if the query fails.
    pub async fn get_conversation(
        &self,
        user_id: &UserId,
        peer_id: &UserId,
        before: Option<DateTime<Utc>>,
        before_id: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Message>, ChatError> {
        if peer_id.is_blank() {
            return Err(ChatError::InvalidRequest("peer id is empty".to_string()));
        }
        if peer_id == user_id {
            return Err(ChatError::InvalidRequest(
                "cannot open a conversation with yourself".to_string(),
            ));
        }

        let cursor = HistoryCursor {
            before: before.unwrap_or_else(Utc::now),
            before_id,
        };
        let limit = self.limits.resolve(limit, self.limits.conversation);
        self.store
            .list_conversation(user_id, peer_id, cursor, limit)
            .await
    }
}
