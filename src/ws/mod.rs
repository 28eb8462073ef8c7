//! WebSocket layer: live connection handshake, frames, and lifecycle.
//!
//! The endpoint at `/messages/connect` authenticates the caller, registers
//! the connection, and then exchanges [`messages::InboundFrame`]s and
//! [`messages::OutboundFrame`]s until either side closes.

pub mod connection;
pub mod handler;
pub mod messages;

pub use connection::WsSettings;
