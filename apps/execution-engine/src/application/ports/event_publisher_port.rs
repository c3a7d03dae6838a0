//! Event Publisher Port (Driven Port)
//!
//! Interface for publishing order results and position updates to the
//! caller layer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::order_execution::OrderResult;
use crate::domain::position::PositionUpdate;

/// Notification emitted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A parent order reached its final state.
    OrderCompleted(Box<OrderResult>),
    /// A position changed.
    PositionUpdated(PositionUpdate),
}

/// Event publishing error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EventPublishError {
    /// No subscriber is listening.
    #[error("no subscribers: {message}")]
    NoSubscribers {
        /// Detail.
        message: String,
    },

    /// Publishing failed.
    #[error("Event publish failed: {message}")]
    PublishFailed {
        /// Detail.
        message: String,
    },
}

/// Port for publishing engine events.
#[async_trait]
pub trait EventPublisherPort: Send + Sync {
    /// Publish a single event.
    async fn publish(&self, event: EngineEvent) -> Result<(), EventPublishError>;

    /// Publish several events in order.
    async fn publish_all(&self, events: Vec<EngineEvent>) -> Result<(), EventPublishError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}

/// No-op event publisher.
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisherPort for NoOpEventPublisher {
    async fn publish(&self, _event: EngineEvent) -> Result<(), EventPublishError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::domain::position::{PositionStatus, PositionUpdateReason};
    use crate::domain::shared::PositionId;

    fn update() -> PositionUpdate {
        PositionUpdate {
            position_id: PositionId::new("pos-1"),
            mint: "MINT".to_string(),
            status: PositionStatus::Open,
            size: dec!(10),
            entry_price: dec!(100),
            realized_pnl: dec!(0),
            order_id: None,
            reason: PositionUpdateReason::Opened,
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn no_op_publisher_succeeds() {
        let publisher = NoOpEventPublisher;
        let result = publisher
            .publish(EngineEvent::PositionUpdated(update()))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn no_op_publisher_multiple_events() {
        let publisher = NoOpEventPublisher;
        let events = vec![
            EngineEvent::PositionUpdated(update()),
            EngineEvent::PositionUpdated(update()),
        ];
        assert!(publisher.publish_all(events).await.is_ok());
    }

    #[test]
    fn event_serializes_with_tag() {
        let json = serde_json::to_value(EngineEvent::PositionUpdated(update())).unwrap();
        assert_eq!(json["event"], "position_updated");
        assert_eq!(json["position_id"], "pos-1");
    }
}
