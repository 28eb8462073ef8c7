//! PostgreSQL implementation of the message store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::MessageStore;
use super::models::{MessageRow, SummaryRow};
use crate::config::ChatConfig;
use crate::domain::{ChatSummary, HistoryCursor, Message, NewMessage, UserId};
use crate::error::ChatError;

/// Opens a connection pool sized from `config` and applies pending
/// migrations.
///
/// # Errors
///
/// Returns [`ChatError::StorageError`] if the database is unreachable or a
/// migration fails.
pub async fn connect(config: &ChatConfig) -> Result<PgPool, ChatError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| ChatError::StorageError(format!("migration failed: {e}")))?;

    tracing::info!(
        max_connections = config.database_max_connections,
        "database pool ready"
    );
    Ok(pool)
}

/// PostgreSQL-backed message store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresMessageStore {
    pool: PgPool,
}

impl PostgresMessageStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PostgresMessageStore {
    async fn append(&self, message: NewMessage) -> Result<Message, ChatError> {
        let created_at = message.created_at.unwrap_or_else(Utc::now);

        let row = sqlx::query_as::<_, MessageRow>(
            "INSERT INTO messages (sender_id, receiver_id, content, created_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, sender_id, receiver_id, content, created_at",
        )
        .bind(message.sender_id.as_str())
        .bind(message.receiver_id.as_str())
        .bind(&message.content)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_conversation(
        &self,
        user_a: &UserId,
        user_b: &UserId,
        cursor: HistoryCursor,
        limit: u32,
    ) -> Result<Vec<Message>, ChatError> {
        // Newest page first, then flipped back to ascending order. A missing
        // `before_id` binds 0, which makes the tie clause unsatisfiable.
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT id, sender_id, receiver_id, content, created_at FROM ( \
                 SELECT id, sender_id, receiver_id, content, created_at FROM messages \
                 WHERE ((sender_id = $1 AND receiver_id = $2) \
                     OR (sender_id = $2 AND receiver_id = $1)) \
                   AND (created_at < $3 OR (created_at = $3 AND id < $4)) \
                 ORDER BY created_at DESC, id DESC \
                 LIMIT $5 \
             ) page ORDER BY created_at ASC, id ASC",
        )
        .bind(user_a.as_str())
        .bind(user_b.as_str())
        .bind(cursor.before)
        .bind(cursor.before_id.unwrap_or(0))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Message::from).collect())
    }

    async fn list_conversation_summaries(
        &self,
        user_id: &UserId,
        cursor: HistoryCursor,
        limit: u32,
    ) -> Result<Vec<ChatSummary>, ChatError> {
        // Same tie rule as conversation pages: a missing `before_id` binds 0.
        let rows = sqlx::query_as::<_, SummaryRow>(
            "SELECT latest.peer_id, \
                    COALESCE(u.display_name, latest.peer_id) AS peer_display_name, \
                    u.avatar AS peer_avatar, \
                    latest.id AS message_id, latest.content, latest.created_at \
             FROM ( \
                 SELECT DISTINCT ON (peer_id) peer_id, id, content, created_at FROM ( \
                     SELECT CASE WHEN sender_id = $1 THEN receiver_id ELSE sender_id END AS peer_id, \
                            id, content, created_at \
                     FROM messages WHERE sender_id = $1 OR receiver_id = $1 \
                 ) mine \
                 ORDER BY peer_id, created_at DESC, id DESC \
             ) latest \
             LEFT JOIN users u ON u.id = latest.peer_id \
             WHERE (latest.created_at < $2 OR (latest.created_at = $2 AND latest.id < $3)) \
             ORDER BY latest.created_at DESC, latest.id DESC \
             LIMIT $4",
        )
        .bind(user_id.as_str())
        .bind(cursor.before)
        .bind(cursor.before_id.unwrap_or(0))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ChatSummary::from).collect())
    }
}
