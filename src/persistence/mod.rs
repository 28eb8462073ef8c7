//! Persistence layer: durable message log and history queries.
//!
//! [`MessageStore`] is the narrow interface the messaging core needs from
//! storage. [`postgres::PostgresMessageStore`] backs production deployments
//! with `sqlx::PgPool`; [`memory::InMemoryMessageStore`] backs tests and
//! runs with persistence disabled.

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;

use crate::domain::{ChatSummary, HistoryCursor, Message, NewMessage, UserId};
use crate::error::ChatError;

pub use memory::InMemoryMessageStore;
pub use postgres::PostgresMessageStore;

/// Durable append and ordered retrieval of chat messages.
///
/// Implementations provide their own concurrency safety. Store order is
/// `created_at` ascending with `id` as tiebreak.
#[async_trait]
pub trait MessageStore: Send + Sync + std::fmt::Debug {
    /// Persists a message, assigning its id and, when unset, its creation
    /// time.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::StorageError`] if the write fails.
    async fn append(&self, message: NewMessage) -> Result<Message, ChatError>;

    /// Returns the latest `limit` messages exchanged between `user_a` and
    /// `user_b` that lie before `cursor`, in ascending store order.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::StorageError`] if the query fails.
    async fn list_conversation(
        &self,
        user_a: &UserId,
        user_b: &UserId,
        cursor: HistoryCursor,
        limit: u32,
    ) -> Result<Vec<Message>, ChatError>;

    /// Returns one summary per distinct peer of `user_id`, built from the
    /// latest message exchanged with that peer, keeping only peers whose
    /// latest message lies before `cursor`. Ordered by last message time
    /// descending (id tiebreak) and capped at `limit`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::StorageError`] if the query fails.
    async fn list_conversation_summaries(
        &self,
        user_id: &UserId,
        cursor: HistoryCursor,
        limit: u32,
    ) -> Result<Vec<ChatSummary>, ChatError>;
}
