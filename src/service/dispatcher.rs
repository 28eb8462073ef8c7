//! Dispatcher: the single funnel for inbound chat messages.
//!
//! Every message is validated, persisted, and only then pushed to the
//! recipient's live connection. Live delivery is best effort; the store is
//! the source of truth.

use std::fmt;
use std::sync::Arc;

use crate::domain::{ConnectionRegistry, EnqueueError, Message, NewMessage};
use crate::error::ChatError;
use crate::persistence::MessageStore;

/// Outcome of the live-delivery step for a persisted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Placed on the recipient's outbound queue.
    Pushed,
    /// Recipient has no live connection.
    RecipientOffline,
    /// Recipient's outbound queue was full; live copy dropped.
    QueueFull,
    /// Recipient's connection was closing; live copy dropped.
    RecipientClosed,
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pushed => "pushed",
            Self::RecipientOffline => "recipient_offline",
            Self::QueueFull => "queue_full",
            Self::RecipientClosed => "recipient_closed",
        };
        f.write_str(s)
    }
}

/// A message that was persisted, with what happened to its live copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed {
    /// The stored message.
    pub message: Message,
    /// Live delivery outcome.
    pub delivery: Delivery,
}

/// Persists inbound messages and forwards them to live recipients.
///
/// Holds no lock while awaiting the store: the registry is consulted only
/// after `append` returns, through a lookup that clones the handle out.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    store: Arc<dyn MessageStore>,
    registry: Arc<ConnectionRegistry>,
    max_content_chars: usize,
}

impl Dispatcher {
    /// Creates a dispatcher over the given store and registry.
    #[must_use]
    pub fn new(
        store: Arc<dyn MessageStore>,
        registry: Arc<ConnectionRegistry>,
        max_content_chars: usize,
    ) -> Self {
        Self {
            store,
            registry,
            max_content_chars,
        }
    }

    /// Checks participants and content bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::InvalidMessage`] if either participant is blank,
    /// the sender addresses themself, or the content is blank or longer
    /// than the configured limit.
    pub fn validate(&self, message: &NewMessage) -> Result<(), ChatError> {
        if message.sender_id.is_blank() {
            return Err(ChatError::InvalidMessage("sender is empty".to_string()));
        }
        if message.receiver_id.is_blank() {
            return Err(ChatError::InvalidMessage("receiver is empty".to_string()));
        }
        if message.sender_id == message.receiver_id {
            return Err(ChatError::InvalidMessage(
                "sender and receiver are the same user".to_string(),
            ));
        }
        if message.content.trim().is_empty() {
            return Err(ChatError::InvalidMessage("content is empty".to_string()));
        }
        let chars = message.content.chars().count();
        if chars > self.max_content_chars {
            return Err(ChatError::InvalidMessage(format!(
                "content is {chars} characters, limit is {}",
                self.max_content_chars
            )));
        }
        Ok(())
    }

    /// Validates, persists, then attempts live delivery of `message`.
    ///
    /// Never blocks on a slow recipient: a full outbound queue drops only
    /// the live copy.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::InvalidMessage`] if validation fails and
    /// [`ChatError::StorageError`] if the message could not be persisted.
    /// In both cases nothing is delivered.
    pub async fn route(&self, message: NewMessage) -> Result<Routed, ChatError> {
        if let Err(e) = self.validate(&message) {
            tracing::warn!(sender = %message.sender_id, error = %e, "dropping invalid message");
            return Err(e);
        }

        let sender = message.sender_id.clone();
        let stored = match self.store.append(message).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!(%sender, error = %e, "failed to persist message, dropping");
                return Err(e);
            }
        };

        let delivery = self.deliver(&stored);
        tracing::debug!(
            message_id = stored.id,
            sender = %stored.sender_id,
            receiver = %stored.receiver_id,
            %delivery,
            "message routed"
        );
        Ok(Routed {
            message: stored,
            delivery,
        })
    }

    fn deliver(&self, message: &Message) -> Delivery {
        let Some(handle) = self.registry.lookup(&message.receiver_id) else {
            return Delivery::RecipientOffline;
        };

        match handle.try_enqueue(message.clone()) {
            Ok(()) => Delivery::Pushed,
            Err(EnqueueError::Full) => {
                tracing::warn!(
                    message_id = message.id,
                    receiver = %message.receiver_id,
                    connection_id = %handle.id(),
                    "outbound queue full, live copy dropped"
                );
                Delivery::QueueFull
            }
            Err(EnqueueError::Closed) => Delivery::RecipientClosed,
        }
    }
}
