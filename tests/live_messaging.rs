//! End-to-end tests: a real listener, WebSocket clients and REST calls
//! against in-memory storage.

#![allow(clippy::panic)]

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use rental_chat::app_state::AppState;
use rental_chat::config::ChatConfig;
use rental_chat::domain::{ChatSummary, HistoryCursor, Message, NewMessage, UserId};
use rental_chat::error::ChatError;
use rental_chat::persistence::{InMemoryMessageStore, MessageStore};
use rental_chat::server;
use rental_chat::session::InMemorySessionGateway;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

/// In-memory store whose writes take `delay` to complete.
#[derive(Debug)]
struct SlowStore {
    inner: Arc<InMemoryMessageStore>,
    delay: Duration,
}

#[async_trait]
impl MessageStore for SlowStore {
    async fn append(&self, message: NewMessage) -> Result<Message, ChatError> {
        tokio::time::sleep(self.delay).await;
        self.inner.append(message).await
    }

    async fn list_conversation(
        &self,
        user_a: &UserId,
        user_b: &UserId,
        cursor: HistoryCursor,
        limit: u32,
    ) -> Result<Vec<Message>, ChatError> {
        self.inner.list_conversation(user_a, user_b, cursor, limit).await
    }

    async fn list_conversation_summaries(
        &self,
        user_id: &UserId,
        cursor: HistoryCursor,
        limit: u32,
    ) -> Result<Vec<ChatSummary>, ChatError> {
        self.inner
            .list_conversation_summaries(user_id, cursor, limit)
            .await
    }
}

struct TestServer {
    addr: SocketAddr,
    state: AppState,
    store: Arc<InMemoryMessageStore>,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<io::Result<()>>,
}

impl TestServer {
    async fn start() -> Self {
        let store = Arc::new(InMemoryMessageStore::new());
        let shared: Arc<InMemoryMessageStore> = Arc::clone(&store);
        Self::start_with(store, shared).await
    }

    /// Starts a server backed by `backend`; `store` is the in-memory store
    /// it ultimately writes to.
    async fn start_with(store: Arc<InMemoryMessageStore>, backend: Arc<dyn MessageStore>) -> Self {
        let sessions = Arc::new(InMemorySessionGateway::new());
        for user in ["u1", "u2", "u3"] {
            sessions.insert(format!("tok-{user}"), UserId::from(user));
        }

        let state = AppState::new(&ChatConfig::default(), backend, sessions);

        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };

        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(server::serve(
            listener,
            state.clone(),
            Duration::from_secs(2),
            async move {
                let _ = stopped.await;
            },
        ));

        Self {
            addr,
            state,
            store,
            stop: Some(stop),
            task,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    async fn connect(&self, token: &str) -> Client {
        let url = format!("ws://{}{}?session_id={token}", self.addr, server::CONNECT_PATH);
        let Ok((client, _)) = connect_async(url).await else {
            panic!("handshake for {token} failed");
        };
        client
    }

    /// Waits until the registry holds exactly `n` live connections.
    async fn wait_for_connections(&self, n: usize) {
        let registry = Arc::clone(&self.state.registry);
        let reached = tokio::time::timeout(WAIT, async move {
            while registry.len() != n {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(reached.is_ok(), "registry never reached {n} connections");
    }

    /// Waits until the store holds exactly `n` messages.
    async fn wait_for_messages(&self, n: usize) {
        let store = Arc::clone(&self.store);
        let reached = tokio::time::timeout(WAIT, async move {
            while store.len().await != n {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(reached.is_ok(), "store never reached {n} messages");
    }

    async fn get_json(&self, path: &str, token: &str) -> (reqwest::StatusCode, Value) {
        let Ok(response) = reqwest::Client::new()
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
        else {
            panic!("GET {path} failed");
        };
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or_default();
        (status, body)
    }
}

async fn send_to(client: &mut Client, receiver: &str, content: &str) {
    let frame = serde_json::json!({ "receiverId": receiver, "content": content });
    let sent = client.send(WsMessage::text(frame.to_string())).await;
    assert!(sent.is_ok(), "send failed: {sent:?}");
}

/// Next non-control frame, decoded as JSON.
async fn next_json(client: &mut Client) -> Value {
    loop {
        let Ok(next) = tokio::time::timeout(WAIT, client.next()).await else {
            panic!("no frame within {WAIT:?}");
        };
        match next {
            Some(Ok(WsMessage::Text(text))) => {
                let Ok(value) = serde_json::from_str::<Value>(text.as_str()) else {
                    panic!("frame is not JSON: {text}");
                };
                return value;
            }
            Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_))) => {}
            other => panic!("expected a text frame, got {other:?}"),
        }
    }
}

/// Reads until the server ends the connection.
async fn expect_closed(client: &mut Client) {
    loop {
        let Ok(next) = tokio::time::timeout(WAIT, client.next()).await else {
            panic!("connection still open after {WAIT:?}");
        };
        match next {
            Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_))) => {}
            Some(Ok(WsMessage::Text(text))) => panic!("unexpected frame {text}"),
            Some(Ok(WsMessage::Close(_)) | Err(_)) | None => return,
            Some(Ok(_)) => {}
        }
    }
}

#[tokio::test]
async fn message_reaches_online_recipient() {
    let server = TestServer::start().await;
    let mut alice = server.connect("tok-u1").await;
    let mut bob = server.connect("tok-u2").await;
    server.wait_for_connections(2).await;

    send_to(&mut alice, "u2", "is the flat still available?").await;

    let frame = next_json(&mut bob).await;
    assert_eq!(frame.get("senderId").and_then(Value::as_str), Some("u1"));
    assert_eq!(frame.get("receiverId").and_then(Value::as_str), Some("u2"));
    assert_eq!(
        frame.get("content").and_then(Value::as_str),
        Some("is the flat still available?")
    );
    assert!(frame.get("id").and_then(Value::as_i64).is_some());
    assert!(frame.get("createdAt").and_then(Value::as_str).is_some());
}

#[tokio::test]
async fn claimed_sender_is_replaced_by_connection_identity() {
    let server = TestServer::start().await;
    let mut alice = server.connect("tok-u1").await;
    let mut bob = server.connect("tok-u2").await;
    server.wait_for_connections(2).await;

    let frame = serde_json::json!({ "senderId": "u3", "receiverId": "u2", "content": "hi" });
    let sent = alice.send(WsMessage::text(frame.to_string())).await;
    assert!(sent.is_ok());

    let received = next_json(&mut bob).await;
    assert_eq!(received.get("senderId").and_then(Value::as_str), Some("u1"));
}

#[tokio::test]
async fn offline_recipient_finds_message_in_history() {
    let server = TestServer::start().await;
    let mut alice = server.connect("tok-u1").await;
    server.wait_for_connections(1).await;

    send_to(&mut alice, "u3", "viewing on Saturday?").await;
    server.wait_for_messages(1).await;

    let (status, page) = server.get_json("/api/v1/conversations/u1", "tok-u3").await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(page.as_array().map(Vec::len), Some(1));
    assert_eq!(page.pointer("/0/senderId").and_then(Value::as_str), Some("u1"));
    assert_eq!(
        page.pointer("/0/content").and_then(Value::as_str),
        Some("viewing on Saturday?")
    );

    let (status, summaries) = server.get_json("/api/v1/conversations", "tok-u3").await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(summaries.pointer("/0/peerUserId").and_then(Value::as_str), Some("u1"));
    assert_eq!(
        summaries.pointer("/0/peerDisplayName").and_then(Value::as_str),
        Some("u1")
    );
}

#[tokio::test]
async fn invalid_messages_are_dropped_and_connection_survives() {
    let server = TestServer::start().await;
    let mut alice = server.connect("tok-u1").await;
    let mut bob = server.connect("tok-u2").await;
    server.wait_for_connections(2).await;

    send_to(&mut alice, "u2", "   ").await;
    send_to(&mut alice, "u1", "note to self").await;
    send_to(&mut alice, "", "nobody").await;
    let sent = alice.send(WsMessage::text("not json")).await;
    assert!(sent.is_ok());
    send_to(&mut alice, "u2", "still here").await;

    let frame = next_json(&mut bob).await;
    assert_eq!(frame.get("content").and_then(Value::as_str), Some("still here"));
    server.wait_for_messages(1).await;
}

#[tokio::test]
async fn new_connection_supersedes_previous_one() {
    let server = TestServer::start().await;
    let mut first = server.connect("tok-u1").await;
    server.wait_for_connections(1).await;

    let mut second = server.connect("tok-u1").await;
    expect_closed(&mut first).await;

    // The superseded connection's teardown must not evict its successor.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.state.registry.len(), 1);

    let mut bob = server.connect("tok-u2").await;
    server.wait_for_connections(2).await;
    send_to(&mut bob, "u1", "hello again").await;

    let frame = next_json(&mut second).await;
    assert_eq!(frame.get("content").and_then(Value::as_str), Some("hello again"));
}

#[tokio::test]
async fn disconnect_removes_registry_entry() {
    let server = TestServer::start().await;
    let mut alice = server.connect("tok-u1").await;
    server.wait_for_connections(1).await;

    let closed = alice.close(None).await;
    assert!(closed.is_ok());
    server.wait_for_connections(0).await;
}

#[tokio::test]
async fn handshake_without_valid_session_is_rejected() {
    let server = TestServer::start().await;

    for url in [
        format!("ws://{}{}", server.addr, server::CONNECT_PATH),
        format!("ws://{}{}?session_id=bogus", server.addr, server::CONNECT_PATH),
    ] {
        match connect_async(url).await {
            Err(tokio_tungstenite::tungstenite::Error::Http(response)) => {
                assert_eq!(response.status().as_u16(), 401);
            }
            Err(other) => panic!("expected an HTTP rejection, got {other:?}"),
            Ok(_) => panic!("handshake should have been rejected"),
        }
    }
    assert!(server.state.registry.is_empty());
}

#[tokio::test]
async fn history_accepts_session_cookie() {
    let server = TestServer::start().await;

    let Ok(response) = reqwest::Client::new()
        .get(server.url("/api/v1/conversations"))
        .header("cookie", "session_id=tok-u2")
        .send()
        .await
    else {
        panic!("GET failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let (status, _) = server.get_json("/api/v1/conversations", "bogus").await;
    assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_reports_live_connections() {
    let server = TestServer::start().await;
    let _alice = server.connect("tok-u1").await;
    server.wait_for_connections(1).await;

    let Ok(response) = reqwest::get(server.url("/health")).await else {
        panic!("GET /health failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body = response.json::<Value>().await.unwrap_or_default();
    assert_eq!(body.get("status").and_then(Value::as_str), Some("healthy"));
    assert_eq!(body.get("connections").and_then(Value::as_u64), Some(1));
}

#[tokio::test]
async fn shutdown_closes_live_connections() {
    let mut server = TestServer::start().await;
    let mut alice = server.connect("tok-u1").await;
    server.wait_for_connections(1).await;

    if let Some(stop) = server.stop.take() {
        let _ = stop.send(());
    }
    expect_closed(&mut alice).await;

    let Ok(joined) = tokio::time::timeout(WAIT, &mut server.task).await else {
        panic!("server did not stop within {WAIT:?}");
    };
    assert!(matches!(joined, Ok(Ok(()))), "server exited with {joined:?}");
    server.wait_for_connections(0).await;
}

#[tokio::test]
async fn shutdown_waits_for_in_flight_message() {
    let store = Arc::new(InMemoryMessageStore::new());
    let slow = Arc::new(SlowStore {
        inner: Arc::clone(&store),
        delay: Duration::from_millis(500),
    });
    let mut server = TestServer::start_with(store, slow).await;
    let mut alice = server.connect("tok-u1").await;
    server.wait_for_connections(1).await;

    send_to(&mut alice, "u2", "sent just before shutdown").await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    if let Some(stop) = server.stop.take() {
        let _ = stop.send(());
    }

    let Ok(joined) = tokio::time::timeout(WAIT, &mut server.task).await else {
        panic!("server did not stop within {WAIT:?}");
    };
    assert!(matches!(joined, Ok(Ok(()))), "server exited with {joined:?}");
    assert_eq!(server.store.len().await, 1);
    assert!(server.state.registry.is_empty());
}
