//! Event publisher trait and implementations.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{DomainEvent, Event};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{NotificationError, ServiceError};

/// Envelope of an event sent to an external channel.
#[derive(Debug, Clone, Serialize)]
pub struct PublishedMessage {
    /// Unique message ID.
    pub id: Uuid,
    /// Channel the message went to.
    pub channel: String,
    /// Event type name.
    pub event_type: String,
    /// Serialized event data.
    pub payload: serde_json::Value,
    /// When the message was published.
    pub published_at: DateTime<Utc>,
}

impl PublishedMessage {
    /// Wraps an event for the given channel.
    pub fn new(channel: &str, event: &Event) -> Result<Self, ServiceError> {
        Ok(Self {
            id: Uuid::new_v4(),
            channel: channel.to_string(),
            event_type: event.event_type().to_string(),
            payload: serde_json::to_value(event)?,
            published_at: Utc::now(),
        })
    }
}

/// Trait for publishing events to external consumers.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes an event on a named channel.
    async fn publish(&self, channel: &str, event: &Event) -> Result<(), ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryPublisherState {
    messages: Vec<PublishedMessage>,
    fail_on_publish: bool,
    failures_left: usize,
    attempts: usize,
}

/// In-memory event publisher for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventPublisher {
    state: Arc<RwLock<InMemoryPublisherState>>,
}

impl InMemoryEventPublisher {
    /// Creates a new in-memory publisher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the publisher to fail every publish call.
    pub fn set_fail_on_publish(&self, fail: bool) {
        if let Ok(mut state) = self.state.write() {
            state.fail_on_publish = fail;
        }
    }

    /// Configures the publisher to fail the next `count` publish calls.
    pub fn fail_next_publishes(&self, count: usize) {
        if let Ok(mut state) = self.state.write() {
            state.failures_left = count;
        }
    }

    /// Returns the number of publish calls, failed ones included.
    pub fn publish_attempts(&self) -> usize {
        self.state.read().map(|state| state.attempts).unwrap_or(0)
    }

    /// Returns the messages published so far.
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.state
            .read()
            .map(|state| state.messages.clone())
            .unwrap_or_default()
    }

    /// Returns the messages published on a channel.
    pub fn published_on(&self, channel: &str) -> Vec<PublishedMessage> {
        self.published()
            .into_iter()
            .filter(|m| m.channel == channel)
            .collect()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, channel: &str, event: &Event) -> Result<(), ServiceError> {
        let message = PublishedMessage::new(channel, event)?;
        let mut state = self.state.write().map_err(|_| NotificationError::Publish {
            channel: channel.to_string(),
            reason: "publisher state poisoned".to_string(),
        })?;

        state.attempts += 1;
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(NotificationError::Publish {
                channel: channel.to_string(),
                reason: "Channel busy".to_string(),
            }
            .into());
        }
        if state.fail_on_publish {
            return Err(NotificationError::Publish {
                channel: channel.to_string(),
                reason: "Channel unavailable".to_string(),
            }
            .into());
        }

        state.messages.push(message);
        Ok(())
    }
}

/// Publisher that writes each message to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventPublisher;

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish(&self, channel: &str, event: &Event) -> Result<(), ServiceError> {
        let message = PublishedMessage::new(channel, event)?;
        tracing::info!(
            message_id = %message.id,
            channel = %message.channel,
            event_type = %message.event_type,
            payload = %message.payload,
            "event published"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::BatchReference;
    use domain::OrderLine;

    fn allocated() -> Event {
        Event::allocated(&OrderLine::new("o1", "LAMP", 3), BatchReference::new("b1"))
    }

    #[tokio::test]
    async fn test_publish_records_envelope() {
        let publisher = InMemoryEventPublisher::new();

        publisher.publish("line_allocated", &allocated()).await.unwrap();

        let messages = publisher.published_on("line_allocated");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].event_type, "Allocated");
        assert_eq!(messages[0].payload["data"]["batch_reference"], "b1");
        assert!(publisher.published_on("other").is_empty());
    }

    #[tokio::test]
    async fn test_fail_on_publish() {
        let publisher = InMemoryEventPublisher::new();
        publisher.set_fail_on_publish(true);

        let result = publisher.publish("line_allocated", &allocated()).await;
        assert!(matches!(
            result,
            Err(ServiceError::Notification(NotificationError::Publish { .. }))
        ));
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn test_fail_next_publishes_then_recovers() {
        let publisher = InMemoryEventPublisher::new();
        publisher.fail_next_publishes(2);

        assert!(publisher.publish("line_allocated", &allocated()).await.is_err());
        assert!(publisher.publish("line_allocated", &allocated()).await.is_err());
        publisher.publish("line_allocated", &allocated()).await.unwrap();

        assert_eq!(publisher.publish_attempts(), 3);
        assert_eq!(publisher.published().len(), 1);
    }

    #[tokio::test]
    async fn test_tracing_publisher_accepts_events() {
        assert!(
            TracingEventPublisher
                .publish("line_allocated", &allocated())
                .await
                .is_ok()
        );
    }
}
