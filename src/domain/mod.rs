//! Domain layer: identities, messages, and the live connection directory.
//!
//! This module contains the server-side domain model: user identity,
//! persisted and pending messages, history cursors, per-connection handles
//! and the registry that routes users to their live connection.

pub mod connection_handle;
pub mod connection_registry;
pub mod message;
pub mod user_id;

pub use connection_handle::{ConnectionHandle, ConnectionState, EnqueueError};
pub use connection_registry::ConnectionRegistry;
pub use message::{ChatSummary, HistoryCursor, Message, NewMessage, UserProfile};
pub use user_id::UserId;
