//! Concurrent directory of live connections keyed by user.
//!
//! [`ConnectionRegistry`] maps each [`UserId`] to at most one
//! [`ConnectionHandle`]. Every operation is a single synchronized map
//! access that performs no I/O, so it is safe to call from any connection
//! task and from the dispatcher concurrently.

use dashmap::DashMap;

use super::{ConnectionHandle, UserId};

/// Process-wide routing table from users to their live connection.
///
/// # Concurrency
///
/// Backed by a sharded [`DashMap`]. Guards never escape a method: lookups
/// return a cloned handle, so no caller can hold a shard lock across an
/// `.await`.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<UserId, ConnectionHandle>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `handle` as the live connection of `user_id`.
    ///
    /// Returns the superseded handle, if any. The caller is responsible for
    /// closing it; the registry never performs I/O.
    pub fn register(&self, user_id: UserId, handle: ConnectionHandle) -> Option<ConnectionHandle> {
        self.connections.insert(user_id, handle)
    }

    /// Returns the live connection of `user_id`, if one is registered.
    #[must_use]
    pub fn lookup(&self, user_id: &UserId) -> Option<ConnectionHandle> {
        self.connections.get(user_id).map(|entry| entry.value().clone())
    }

    /// Removes the mapping for `user_id` only if it still points at
    /// `handle`. A stale handle never evicts a newer connection.
    ///
    /// Returns `true` if an entry was removed. Calling it again is a no-op.
    pub fn unregister(&self, user_id: &UserId, handle: &ConnectionHandle) -> bool {
        self.connections
            .remove_if(user_id, |_, current| current.same_connection(handle))
            .is_some()
    }

    /// Number of users with a live connection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns `true` if no connection is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use tokio_util::sync::CancellationToken;

    use super::*;

    fn handle(user: &str, shutdown: &CancellationToken) -> ConnectionHandle {
        let (handle, _rx) = ConnectionHandle::new(UserId::from(user), 4, shutdown);
        handle
    }

    #[test]
    fn register_and_lookup() {
        let shutdown = CancellationToken::new();
        let registry = ConnectionRegistry::new();
        let h = handle("u1", &shutdown);

        assert!(registry.register(UserId::from("u1"), h.clone()).is_none());
        let Some(found) = registry.lookup(&UserId::from("u1")) else {
            panic!("expected registered handle");
        };
        assert!(found.same_connection(&h));
        assert!(registry.lookup(&UserId::from("u2")).is_none());
    }

    #[test]
    fn second_register_supersedes_first() {
        let shutdown = CancellationToken::new();
        let registry = ConnectionRegistry::new();
        let old = handle("u1", &shutdown);
        let new = handle("u1", &shutdown);

        registry.register(UserId::from("u1"), old.clone());
        let Some(previous) = registry.register(UserId::from("u1"), new.clone()) else {
            panic!("expected superseded handle");
        };
        assert!(previous.same_connection(&old));
        assert_eq!(registry.len(), 1);

        let Some(found) = registry.lookup(&UserId::from("u1")) else {
            panic!("expected registered handle");
        };
        assert!(found.same_connection(&new));
    }

    #[test]
    fn stale_unregister_keeps_newer_connection() {
        let shutdown = CancellationToken::new();
        let registry = ConnectionRegistry::new();
        let old = handle("u1", &shutdown);
        let new = handle("u1", &shutdown);

        registry.register(UserId::from("u1"), old.clone());
        registry.register(UserId::from("u1"), new.clone());

        assert!(!registry.unregister(&UserId::from("u1"), &old));
        let Some(found) = registry.lookup(&UserId::from("u1")) else {
            panic!("newer connection was evicted");
        };
        assert!(found.same_connection(&new));
    }

    #[test]
    fn unregister_is_idempotent() {
        let shutdown = CancellationToken::new();
        let registry = ConnectionRegistry::new();
        let h = handle("u1", &shutdown);

        registry.register(UserId::from("u1"), h.clone());
        assert!(registry.unregister(&UserId::from("u1"), &h));
        assert!(!registry.unregister(&UserId::from("u1"), &h));
        assert!(registry.is_empty());
    }

    #[test]
    fn repeated_unregister_after_reconnect_is_harmless() {
        let shutdown = CancellationToken::new();
        let registry = ConnectionRegistry::new();
        let first = handle("u1", &shutdown);
        registry.register(UserId::from("u1"), first.clone());
        assert!(registry.unregister(&UserId::from("u1"), &first));

        let second = handle("u1", &shutdown);
        registry.register(UserId::from("u1"), second.clone());
        assert!(!registry.unregister(&UserId::from("u1"), &first));
        assert!(!registry.unregister(&UserId::from("u1"), &first));
        assert!(registry.lookup(&UserId::from("u1")).is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_register_leaves_one_entry_per_user() {
        let shutdown = CancellationToken::new();
        let registry = Arc::new(ConnectionRegistry::new());

        let mut tasks = Vec::new();
        for i in 0..64 {
            let registry = Arc::clone(&registry);
            let h = handle(&format!("u{}", i % 8), &shutdown);
            tasks.push(tokio::spawn(async move {
                let user = h.owner().clone();
                if let Some(previous) = registry.register(user.clone(), h.clone()) {
                    previous.close();
                    registry.unregister(&user, &previous);
                }
            }));
        }
        for task in tasks {
            let Ok(()) = task.await else {
                panic!("task panicked");
            };
        }

        assert_eq!(registry.len(), 8);
        for i in 0..8 {
            let Some(found) = registry.lookup(&UserId::from(format!("u{i}"))) else {
                panic!("missing user u{i}");
            };
            assert!(!found.is_closed());
        }
    }
}
