//! Live connection lifecycle: reader and writer loops.
//!
//! Each authenticated socket runs in one task with two concurrent loops.
//! The reader decodes frames and hands them to the [`Dispatcher`]; the
//! writer drains the connection's outbound queue. Whichever loop stops
//! first closes the handle, which stops the other one. Once both have
//! returned, the registry entry is removed exactly once.

use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use super::messages::{InboundFrame, OutboundFrame};
use crate::app_state::AppState;
use crate::config::ChatConfig;
use crate::domain::{ConnectionHandle, ConnectionState, Message, UserId};
use crate::error::ChatError;
use crate::service::Dispatcher;

/// Per-connection transport settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WsSettings {
    /// Capacity of each outbound queue.
    pub outbound_queue_capacity: usize,
    /// Upper bound on a single frame write.
    pub write_timeout: Duration,
    /// Interval between server pings.
    pub ping_interval: Duration,
}

impl From<&ChatConfig> for WsSettings {
    fn from(config: &ChatConfig) -> Self {
        Self {
            outbound_queue_capacity: config.outbound_queue_capacity,
            write_timeout: config.ws_write_timeout(),
            ping_interval: config.ws_ping_interval(),
        }
    }
}

/// Runs an authenticated connection for `user_id` until either side
/// closes it or the process shuts down.
pub async fn run_connection(socket: WebSocket, user_id: UserId, state: AppState) {
    let (handle, outbound) = ConnectionHandle::new(
        user_id.clone(),
        state.ws.outbound_queue_capacity,
        &state.shutdown,
    );

    if let Some(previous) = state.registry.register(user_id.clone(), handle.clone()) {
        previous.close();
        tracing::info!(
            %user_id,
            superseded = %previous.id(),
            "new connection superseded previous one"
        );
    }
    handle.advance(ConnectionState::Active);
    tracing::info!(%user_id, connection_id = %handle.id(), "connection active");

    let (ws_tx, ws_rx) = socket.split();
    tokio::join!(
        read_loop(ws_rx, &handle, &state.dispatcher),
        write_loop(ws_tx, outbound, &handle, state.ws),
    );

    if handle.mark_closed() {
        state.registry.unregister(&user_id, &handle);
        tracing::info!(%user_id, connection_id = %handle.id(), "connection closed");
    }
}

async fn read_loop(
    mut ws_rx: SplitStream<WebSocket>,
    handle: &ConnectionHandle,
    dispatcher: &Dispatcher,
) {
    loop {
        let frame = tokio::select! {
            biased;
            () = handle.closed() => break,
            frame = ws_rx.next() => frame,
        };

        match frame {
            Some(Ok(WsMessage::Text(text))) => handle_text(&text, handle.owner(), dispatcher).await,
            Some(Ok(WsMessage::Close(_))) | None => {
                tracing::debug!(connection_id = %handle.id(), "peer closed connection");
                break;
            }
            Some(Ok(WsMessage::Binary(_))) => {
                tracing::debug!(connection_id = %handle.id(), "ignoring binary frame");
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                let err = ChatError::from(e);
                tracing::warn!(connection_id = %handle.id(), error = %err, "read failed");
                break;
            }
        }
    }

    handle.close();
}

/// Decodes one text frame and routes it as `owner`. Failures are logged
/// and the frame is dropped; the connection stays open.
async fn handle_text(text: &str, owner: &UserId, dispatcher: &Dispatcher) {
    let frame = match serde_json::from_str::<InboundFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(user_id = %owner, error = %e, "dropping malformed frame");
            return;
        }
    };

    // Dispatcher logs its own rejections.
    if let Err(e) = dispatcher.route(frame.into_message(owner.clone())).await {
        tracing::debug!(user_id = %owner, error = %e, "message not routed");
    }
}

async fn write_loop(
    mut ws_tx: SplitSink<WebSocket, WsMessage>,
    mut outbound: mpsc::Receiver<Message>,
    handle: &ConnectionHandle,
    settings: WsSettings,
) {
    let period = settings.ping_interval.max(Duration::from_secs(1));
    let mut ping = tokio::time::interval_at(Instant::now() + period, period);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let result = loop {
        let frame = tokio::select! {
            biased;
            () = handle.closed() => break Ok(()),
            next = outbound.recv() => match next {
                Some(message) => match encode(&message) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::error!(message_id = message.id, error = %e, "failed to encode frame");
                        continue;
                    }
                },
                None => break Ok(()),
            },
            _ = ping.tick() => WsMessage::Ping(Bytes::new()),
        };

        if let Err(e) = send(&mut ws_tx, frame, settings.write_timeout).await {
            break Err(e);
        }
    };

    outbound.close();
    handle.close();

    match result {
        Ok(()) => {
            let _ = tokio::time::timeout(settings.write_timeout, ws_tx.close()).await;
        }
        Err(e) => {
            tracing::warn!(connection_id = %handle.id(), error = %e, "write failed");
        }
    }
}

fn encode(message: &Message) -> Result<WsMessage, ChatError> {
    let json = serde_json::to_string(&OutboundFrame::from(message))
        .map_err(|e| ChatError::Internal(e.to_string()))?;
    Ok(WsMessage::text(json))
}

async fn send(
    ws_tx: &mut SplitSink<WebSocket, WsMessage>,
    frame: WsMessage,
    timeout: Duration,
) -> Result<(), ChatError> {
    match tokio::time::timeout(timeout, ws_tx.send(frame)).await {
        Ok(result) => result.map_err(ChatError::from),
        Err(_) => Err(ChatError::TransportError(format!(
            "write timed out after {timeout:?}"
        ))),
    }
}
