//! In-memory session gateway for tests and local development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::SessionGateway;
use crate::domain::UserId;
use crate::error::ChatError;

#[derive(Debug, Clone)]
struct SessionEntry {
    user_id: UserId,
    expires_at: Option<DateTime<Utc>>,
}

/// Session table held in process memory.
#[derive(Debug, Default)]
pub struct InMemorySessionGateway {
    sessions: DashMap<String, SessionEntry>,
}

impl InMemorySessionGateway {
    /// Creates an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a non-expiring session `token` for `user_id`.
    pub fn insert(&self, token: impl Into<String>, user_id: UserId) {
        self.sessions.insert(
            token.into(),
            SessionEntry {
                user_id,
                expires_at: None,
            },
        );
    }

    /// Issues a session `token` for `user_id` valid until `expires_at`.
    pub fn insert_expiring(
        &self,
        token: impl Into<String>,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) {
        self.sessions.insert(
            token.into(),
            SessionEntry {
                user_id,
                expires_at: Some(expires_at),
            },
        );
    }

    /// Revokes `token`. Returns `true` if it existed.
    pub fn revoke(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }
}

#[async_trait]
impl SessionGateway for InMemorySessionGateway {
    async fn resolve_user(&self, session_token: &str) -> Result<UserId, ChatError> {
        let entry = self
            .sessions
            .get(session_token)
            .map(|e| e.value().clone())
            .ok_or_else(|| ChatError::Unauthenticated("unknown session".to_string()))?;

        if entry.expires_at.is_some_and(|at| at <= Utc::now()) {
            return Err(ChatError::Unauthenticated("session expired".to_string()));
        }
        Ok(entry.user_id)
    }
}
