//! Session resolution: maps a session token to an authenticated user.
//!
//! Authentication itself belongs to the surrounding platform. This module
//! only defines the narrow [`SessionGateway`] interface the messaging core
//! consumes, two implementations of it, and the helpers that pull a token
//! out of an HTTP request.

pub mod memory;
pub mod postgres;
pub mod token;

use async_trait::async_trait;

use crate::domain::UserId;
use crate::error::ChatError;

pub use memory::InMemorySessionGateway;
pub use postgres::PostgresSessionGateway;

/// Resolves session tokens issued by the platform.
#[async_trait]
pub trait SessionGateway: Send + Sync + std::fmt::Debug {
    /// Returns the user owning `session_token`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Unauthenticated`] if the token is unknown or
    /// expired, and [`ChatError::StorageError`] if the lookup itself fails.
    async fn resolve_user(&self, session_token: &str) -> Result<UserId, ChatError>;
}
