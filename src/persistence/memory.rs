//! In-memory message store for tests and persistence-disabled runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::MessageStore;
use crate::domain::{ChatSummary, HistoryCursor, Message, NewMessage, UserId, UserProfile};
use crate::error::ChatError;

#[derive(Debug, Default)]
struct State {
    messages: Vec<Message>,
    last_id: i64,
    profiles: HashMap<UserId, UserProfile>,
}

/// Message store held entirely in process memory.
///
/// Ids are assigned from a counter under the write lock, so they are
/// strictly increasing in append order. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    state: RwLock<State>,
}

impl InMemoryMessageStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the display metadata reported for `user_id` in summaries.
    pub async fn upsert_profile(&self, user_id: UserId, profile: UserProfile) {
        self.state.write().await.profiles.insert(user_id, profile);
    }

    /// Number of stored messages.
    pub async fn len(&self) -> usize {
        self.state.read().await.messages.len()
    }

    /// Returns `true` if nothing has been stored.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.messages.is_empty()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(&self, message: NewMessage) -> Result<Message, ChatError> {
        let mut state = self.state.write().await;
        state.last_id = state
            .last_id
            .checked_add(1)
            .ok_or_else(|| ChatError::StorageError("message id space exhausted".to_string()))?;

        let stored = Message {
            id: state.last_id,
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            content: message.content,
            created_at: message.created_at.unwrap_or_else(Utc::now),
        };
        state.messages.push(stored.clone());
        Ok(stored)
    }

    async fn list_conversation(
        &self,
        user_a: &UserId,
        user_b: &UserId,
        cursor: HistoryCursor,
        limit: u32,
    ) -> Result<Vec<Message>, ChatError> {
        let state = self.state.read().await;
        let mut page: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| m.is_between(user_a, user_b) && cursor.admits(m))
            .cloned()
            .collect();
        drop(state);

        page.sort_by_key(Message::order_key);
        let excess = page.len().saturating_sub(limit as usize);
        page.drain(..excess);
        Ok(page)
    }

    async fn list_conversation_summaries(
        &self,
        user_id: &UserId,
        cursor: HistoryCursor,
        limit: u32,
    ) -> Result<Vec<ChatSummary>, ChatError> {
        let state = self.state.read().await;

        let mut latest: HashMap<&UserId, &Message> = HashMap::new();
        for message in &state.messages {
            let Some(peer) = message.peer_of(user_id) else {
                continue;
            };
            let newer = latest
                .get(peer)
                .is_none_or(|current| message.order_key() > current.order_key());
            if newer {
                latest.insert(peer, message);
            }
        }

        let mut summaries: Vec<ChatSummary> = latest
            .into_iter()
            .filter(|(_, m)| cursor.admits(m))
            .map(|(peer, m)| {
                let profile = state.profiles.get(peer);
                ChatSummary {
                    peer_user_id: peer.clone(),
                    peer_display_name: profile
                        .map_or_else(|| peer.to_string(), |p| p.display_name.clone()),
                    peer_avatar: profile.and_then(|p| p.avatar.clone()),
                    last_message_content: m.content.clone(),
                    last_message_time: m.created_at,
                    last_message_id: m.id,
                }
            })
            .collect();

        summaries.sort_by(|a, b| {
            (b.last_message_time, b.last_message_id).cmp(&(a.last_message_time, a.last_message_id))
        });
        summaries.truncate(limit as usize);
        Ok(summaries)
    }
}
