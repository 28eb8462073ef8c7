//! HTTP server assembly and graceful shutdown.

use std::future::{Future, IntoFuture};
use std::io;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// Path of the live messaging WebSocket endpoint.
pub const CONNECT_PATH: &str = "/messages/connect";

/// Builds the full application router: REST API, WebSocket endpoint and
/// the shared middleware stack.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(api::build_router())
        .route(CONNECT_PATH, get(ws_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Serves `state` on `listener` until `signal` resolves.
///
/// On signal the state's shutdown token is cancelled, which stops
/// accepting new requests and closes every live connection. Each
/// connection finishes the message it is routing, then unregisters. The
/// server and all tracked connections get up to `grace` in total to wind
/// down; whatever is still running afterwards is abandoned.
///
/// # Errors
///
/// Returns the listener's I/O error if the server fails, or an error if
/// the server task panicked.
pub async fn serve<F>(
    listener: TcpListener,
    state: AppState,
    grace: Duration,
    signal: F,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send,
{
    let shutdown = state.shutdown.clone();
    let connections = state.connections.clone();
    let app = build_app(state);

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .into_future();
    let mut server_task = tokio::spawn(server);

    tokio::select! {
        result = &mut server_task => return result.map_err(io::Error::other)?,
        () = signal => {}
    }

    tracing::info!(grace_secs = grace.as_secs(), "shutdown requested, closing connections");
    shutdown.cancel();
    connections.close();

    let drained = tokio::time::timeout(grace, async {
        let served = (&mut server_task).await;
        connections.wait().await;
        served
    })
    .await;

    match drained {
        Ok(result) => {
            tracing::info!("all connections drained");
            result.map_err(io::Error::other)?
        }
        Err(_) => {
            tracing::warn!(
                open_connections = connections.len(),
                "grace period elapsed, abandoning in-flight work"
            );
            server_task.abort();
            Ok(())
        }
    }
}

/// Resolves on Ctrl-C, or on SIGTERM where available.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
