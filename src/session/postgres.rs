//! Session lookup against the platform's `sessions` table.

use async_trait::async_trait;
use sqlx::PgPool;

use super::SessionGateway;
use crate::domain::UserId;
use crate::error::ChatError;

/// Resolves sessions written by the platform's authentication service.
#[derive(Debug, Clone)]
pub struct PostgresSessionGateway {
    pool: PgPool,
}

impl PostgresSessionGateway {
    /// Creates a gateway reading from the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionGateway for PostgresSessionGateway {
    async fn resolve_user(&self, session_token: &str) -> Result<UserId, ChatError> {
        let user_id = sqlx::query_scalar::<_, String>(
            "SELECT user_id FROM sessions WHERE token = $1 AND expires_at > now()",
        )
        .bind(session_token)
        .fetch_optional(&self.pool)
        .await?;

        user_id
            .map(UserId::from)
            .ok_or_else(|| ChatError::Unauthenticated("unknown or expired session".to_string()))
    }
}
