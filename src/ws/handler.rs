//! Axum WebSocket upgrade handler.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use serde::Deserialize;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::error::ChatError;
use crate::session::token;

/// Query parameters accepted on the upgrade request.
///
/// Browsers cannot attach custom headers to a WebSocket handshake, so the
/// session token may also travel in the query string.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    /// Session token, used when no cookie or bearer header is present.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// `GET /messages/connect`: Authenticate, then upgrade to WebSocket.
///
/// The session is resolved before the upgrade, so a rejected handshake
/// never touches the connection registry.
///
/// # Errors
///
/// Returns [`ChatError::Unauthenticated`] (401) when no session token is
/// supplied or the gateway rejects it.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ConnectParams>,
) -> Result<impl IntoResponse, ChatError> {
    let session = token::from_headers(&headers)
        .or(params.session_id.filter(|s| !s.is_empty()))
        .ok_or_else(|| ChatError::Unauthenticated("missing session token".to_string()))?;

    let user_id = match state.sessions.resolve_user(&session).await {
        Ok(user_id) => user_id,
        Err(e) => {
            tracing::info!(error = %e, "rejected connection handshake");
            return Err(e);
        }
    };

    // Held from handshake until the connection has unregistered.
    let tracked = state.connections.token();
    Ok(ws.on_upgrade(move |socket| async move {
        run_connection(socket, user_id, state).await;
        drop(tracked);
    }))
}
