//! Session token extraction from HTTP request headers.

use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};

/// Name of the cookie carrying the platform session token.
pub const SESSION_COOKIE: &str = "session_id";

/// Returns the session token carried by `headers`.
///
/// The `session_id` cookie takes precedence over an
/// `Authorization: Bearer` header.
#[must_use]
pub fn from_headers(headers: &HeaderMap) -> Option<String> {
    from_cookies(headers).or_else(|| from_bearer(headers))
}

fn from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn from_bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
