//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::ChatConfig;
use crate::domain::ConnectionRegistry;
use crate::persistence::MessageStore;
use crate::service::{ChatService, Dispatcher, PageLimits};
use crate::session::SessionGateway;
use crate::ws::WsSettings;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Read-side history facade.
    pub chat_service: Arc<ChatService>,
    /// Write path for live messages.
    pub dispatcher: Arc<Dispatcher>,
    /// Live connection directory.
    pub registry: Arc<ConnectionRegistry>,
    /// Session token resolution.
    pub sessions: Arc<dyn SessionGateway>,
    /// Per-connection transport settings.
    pub ws: WsSettings,
    /// Cancelled on process shutdown; parent of every connection's close
    /// signal.
    pub shutdown: CancellationToken,
    /// Tracks every upgraded connection so shutdown can wait for in-flight
    /// routing to finish.
    pub connections: TaskTracker,
}

impl AppState {
    /// Wires the service graph around a message store and a session
    /// gateway.
    #[must_use]
    pub fn new(
        config: &ChatConfig,
        store: Arc<dyn MessageStore>,
        sessions: Arc<dyn SessionGateway>,
    ) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&store),
            Arc::clone(&registry),
            config.max_content_chars,
        ));
        let chat_service = Arc::new(ChatService::new(store, PageLimits::from(config)));

        Self {
            chat_service,
            dispatcher,
            registry,
            sessions,
            ws: WsSettings::from(config),
            shutdown: CancellationToken::new(),
            connections: TaskTracker::new(),
        }
    }
}
