//! Shared DTO types used across multiple endpoints.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

/// Query parameters for `GET /conversations`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct ConversationsQuery {
    /// Only conversations whose last message is older than this
    /// (ISO-8601). Defaults to now.
    #[serde(default)]
    pub before: Option<DateTime<Utc>>,
    /// `lastMessageId` of the last entry already seen at `before`; includes
    /// older conversations sharing that exact timestamp.
    #[serde(default, alias = "before_id")]
    pub before_id: Option<i64>,
    /// Page size. Defaults to 15, clamped to the server maximum.
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Query parameters for `GET /conversations/{peer_id}`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct ConversationQuery {
    /// Only messages older than this (ISO-8601). Defaults to now.
    #[serde(default)]
    pub before: Option<DateTime<Utc>>,
    /// Id of the oldest message already seen at `before`; includes older
    /// messages sharing that exact timestamp.
    #[serde(default, alias = "before_id")]
    pub before_id: Option<i64>,
    /// Page size. Defaults to 30, clamped to the server maximum.
    #[serde(default)]
    pub limit: Option<u32>,
}
