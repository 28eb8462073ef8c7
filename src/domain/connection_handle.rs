//! Handle to one live connection and its bounded outbound queue.
//!
//! A [`ConnectionHandle`] is cheap to clone: every clone refers to the same
//! connection. Identity is compared with [`ConnectionHandle::same_connection`],
//! never by owner, so a stale handle can be told apart from a newer
//! connection of the same user.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use uuid::Uuid;

use super::{Message, UserId};

/// Lifecycle of a live connection. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ConnectionState {
    /// Handshake in progress.
    Connecting = 0,
    /// Registered; reader and writer loops running.
    Active = 1,
    /// A loop failed or the peer left; transport and queue are closing.
    Closing = 2,
    /// Unregistered. Terminal.
    Closed = 3,
}

impl ConnectionState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Connecting,
            1 => Self::Active,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connecting => "connecting",
            Self::Active => "active",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Why a message could not be placed on an outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EnqueueError {
    /// The queue is at capacity; the consumer is too slow.
    #[error("outbound queue full")]
    Full,
    /// The connection is closing or closed.
    #[error("connection closed")]
    Closed,
}

#[derive(Debug)]
struct HandleInner {
    id: Uuid,
    owner: UserId,
    outbound: mpsc::Sender<Message>,
    closed: CancellationToken,
    state: AtomicU8,
}

/// In-memory record of one live connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    inner: Arc<HandleInner>,
}

impl ConnectionHandle {
    /// Creates a handle in the [`ConnectionState::Connecting`] state along
    /// with the receiving end of its outbound queue.
    ///
    /// The handle's close signal is a child of `shutdown`, so cancelling
    /// the process shutdown token closes every connection.
    #[must_use]
    pub fn new(
        owner: UserId,
        capacity: usize,
        shutdown: &CancellationToken,
    ) -> (Self, mpsc::Receiver<Message>) {
        let (outbound, rx) = mpsc::channel(capacity.max(1));
        let handle = Self {
            inner: Arc::new(HandleInner {
                id: Uuid::new_v4(),
                owner,
                outbound,
                closed: shutdown.child_token(),
                state: AtomicU8::new(ConnectionState::Connecting as u8),
            }),
        };
        (handle, rx)
    }

    /// Unique id of this connection.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Authenticated user that owns the connection.
    #[must_use]
    pub fn owner(&self) -> &UserId {
        &self.inner.owner
    }

    /// Returns `true` if both handles refer to the same connection.
    #[must_use]
    pub fn same_connection(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Places a message on the outbound queue without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`EnqueueError::Full`] when the queue is at capacity and
    /// [`EnqueueError::Closed`] once the connection is closing.
    pub fn try_enqueue(&self, message: Message) -> Result<(), EnqueueError> {
        if self.is_closed() {
            return Err(EnqueueError::Closed);
        }
        self.inner.outbound.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EnqueueError::Full,
            mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }

    /// Closes the connection: moves it to at least
    /// [`ConnectionState::Closing`] and fires the close signal, which stops
    /// both connection loops. Idempotent.
    ///
    /// Returns `true` only for the call that initiated closing.
    pub fn close(&self) -> bool {
        let previous = self.advance(ConnectionState::Closing);
        self.inner.closed.cancel();
        previous < ConnectionState::Closing
    }

    /// Returns `true` once the close signal has fired, either through
    /// [`Self::close`] or process shutdown.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.is_cancelled()
    }

    /// Completes when the close signal fires.
    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.inner.closed.cancelled()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.inner.state.load(Ordering::Acquire))
    }

    /// Moves the state forward to `next` (never backward) and returns the
    /// state observed before the transition.
    pub fn advance(&self, next: ConnectionState) -> ConnectionState {
        ConnectionState::from_u8(self.inner.state.fetch_max(next as u8, Ordering::AcqRel))
    }

    /// Marks the connection [`ConnectionState::Closed`].
    ///
    /// Returns `true` exactly once per connection, for the caller that
    /// must perform final cleanup.
    pub fn mark_closed(&self) -> bool {
        self.advance(ConnectionState::Closed) != ConnectionState::Closed
    }
}
