//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::app_state::AppState;
use crate::domain::UserId;
use crate::error::ChatError;
use crate::session::token;

/// The caller's identity, resolved from the request's session token.
///
/// Rejects with [`ChatError::Unauthenticated`] when no token is present or
/// the session gateway does not recognise it.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserId);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ChatError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = token::from_headers(&parts.headers)
            .ok_or_else(|| ChatError::Unauthenticated("missing session token".to_string()))?;
        let user_id = state.sessions.resolve_user(&session).await?;
        Ok(Self(user_id))
    }
}
