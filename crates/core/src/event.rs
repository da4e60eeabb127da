//! Domain event system: decoupled observation of a session.
//!
//! Events are published when something interesting happens in a session.
//! Front-ends and tests can subscribe without the session knowing about them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::message::Role;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A document was extracted and installed as the session's context
    DocumentLoaded {
        session_id: String,
        name: String,
        page_count: usize,
        chars: usize,
        timestamp: DateTime<Utc>,
    },

    /// An upload failed; the previous document (if any) is still in place
    DocumentRejected {
        session_id: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// A turn was appended to the transcript
    TurnAppended {
        session_id: String,
        role: Role,
        index: usize,
        timestamp: DateTime<Utc>,
    },

    /// The provider produced a reply
    ResponseGenerated {
        session_id: String,
        model: String,
        tokens_used: Option<u32>,
        timestamp: DateTime<Utc>,
    },

    /// The provider failed; the user turn stays unanswered
    GenerationFailed {
        session_id: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// An action was refused because no document is loaded
    GuardRejected {
        session_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Session state machine moved
    StateChanged {
        session_id: String,
        from: String,
        to: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
/// Subscribers receive all events and filter for what they care about.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::TurnAppended {
            session_id: "s1".into(),
            role: Role::User,
            index: 1,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::TurnAppended { role, index, .. } => {
                assert_eq!(*role, Role::User);
                assert_eq!(*index, 1);
            }
            _ => panic!("Expected TurnAppended event"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::GuardRejected {
            session_id: "s1".into(),
            timestamp: Utc::now(),
        });
    }
}
