//! # rental-chat
//!
//! Real-time direct messaging between users of a housing-rental platform.
//!
//! Users hold one live WebSocket connection each. A message sent over it
//! is validated, persisted, and then pushed to the recipient's connection
//! if they are online. Offline recipients read it later through the
//! history endpoints. Delivery is at-most-once: a full or closed
//! recipient queue drops the live push, never the stored message.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)        history, health
//!     ├── WS Handler (ws/)            /messages/connect
//!     │
//!     ├── SessionGateway (session/)   token → user id
//!     ├── ChatService (service/)      paginated reads
//!     ├── Dispatcher (service/)       validate → persist → push
//!     │
//!     ├── ConnectionRegistry (domain/)
//!     │
//!     └── MessageStore (persistence/) PostgreSQL or in-memory
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod server;
pub mod service;
pub mod session;
pub mod ws;
