//! Service layer: message routing and history orchestration.
//!
//! [`Dispatcher`] is the write path used by live connections;
//! [`ChatService`] is the read path used by the history endpoints.

pub mod chat_service;
pub mod dispatcher;

pub use chat_service::{ChatService, PageLimits};
pub use dispatcher::{Delivery, Dispatcher, Routed};
