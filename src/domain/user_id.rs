//! Type-safe user identifier.
//!
//! [`UserId`] is a newtype wrapper around the platform's opaque user handle.
//! Users are owned by the surrounding platform: this service never creates
//! or mutates them, it only compares and stores their identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, stable identifier of a platform user.
///
/// Used as the key in [`super::ConnectionRegistry`] and as the sender and
/// receiver of every [`super::Message`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wraps a raw identifier without validation.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the identifier is empty or whitespace only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Consumes the wrapper, returning the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UserId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for UserId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn blank_detection() {
        assert!(UserId::new("").is_blank());
        assert!(UserId::new("  \t").is_blank());
        assert!(!UserId::new("u1").is_blank());
    }

    #[test]
    fn serializes_as_plain_string() {
        let Ok(json) = serde_json::to_string(&UserId::new("u42")) else {
            panic!("serialization failed");
        };
        assert_eq!(json, "\"u42\"");
    }

    #[test]
    fn hash_works_in_hashmap() {
        use std::collections::HashMap;
        let id = UserId::from("u1");
        let mut map = HashMap::new();
        map.insert(id.clone(), "conn");
        assert_eq!(map.get(&id), Some(&"conn"));
    }
}
