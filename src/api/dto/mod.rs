//! Data Transfer Objects for REST request/response serialization.
//!
//! Response bodies use camelCase keys, matching the live wire frames.

pub mod chat_dto;
pub mod common_dto;

pub use chat_dto::*;
pub use common_dto::*;
