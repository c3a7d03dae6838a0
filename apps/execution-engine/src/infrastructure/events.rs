//! Event Publisher Adapters
//!
//! Fan-out of engine events over a tokio broadcast channel. Slow receivers
//! lag and drop old events; the engine never blocks on a subscriber.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::application::ports::{EngineEvent, EventPublishError, EventPublisherPort};

/// Default channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 1_024;

/// Broadcast-backed event publisher.
#[derive(Debug, Clone)]
pub struct BroadcastEventPublisher {
    tx: broadcast::Sender<EngineEvent>,
}

impl Default for BroadcastEventPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl BroadcastEventPublisher {
    /// Create a publisher with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[async_trait]
impl EventPublisherPort for BroadcastEventPublisher {
    async fn publish(&self, event: EngineEvent) -> Result<(), EventPublishError> {
        self.tx
            .send(event)
            .map(|_| ())
            .map_err(|_| EventPublishError::NoSubscribers {
                message: "no event receivers".to_string(),
            })
    }
}
