//! rental-chat server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use rental_chat::app_state::AppState;
use rental_chat::config::ChatConfig;
use rental_chat::persistence::{self, InMemoryMessageStore, MessageStore, PostgresMessageStore};
use rental_chat::server;
use rental_chat::session::{InMemorySessionGateway, PostgresSessionGateway, SessionGateway};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ChatConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(addr = %config.listen_addr, "starting rental-chat");

    // Build storage backends
    let (store, sessions): (Arc<dyn MessageStore>, Arc<dyn SessionGateway>) =
        if config.persistence_enabled {
            let pool = persistence::postgres::connect(&config)
                .await
                .context("connecting to PostgreSQL")?;
            tracing::info!("PostgreSQL connected, migrations applied");
            (
                Arc::new(PostgresMessageStore::new(pool.clone())),
                Arc::new(PostgresSessionGateway::new(pool)),
            )
        } else {
            tracing::warn!("persistence disabled, messages and sessions are kept in memory");
            (
                Arc::new(InMemoryMessageStore::new()),
                Arc::new(InMemorySessionGateway::new()),
            )
        };

    // Build application state
    let app_state = AppState::new(&config, store, sessions);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    server::serve(
        listener,
        app_state,
        config.shutdown_grace(),
        server::shutdown_signal(),
    )
    .await?;

    tracing::info!("server stopped");
    Ok(())
}
