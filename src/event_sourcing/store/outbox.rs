use anyhow::{Result, bail};
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::event_sourcing::core::{DomainEvent, EventEnvelope, serialize_event};

// ============================================================================
// Outbox - Ordered buffer of events awaiting publication
// ============================================================================
//
// Responsibilities:
// 1. Accept enveloped events from command handlers
// 2. Reject sequence numbers that go backwards for an aggregate
// 3. Hand the buffered events to a relay (drain) in append order
//
// ============================================================================

#[async_trait]
pub trait EventPublisher<E: DomainEvent>: Send + Sync {
    async fn publish(&self, envelope: EventEnvelope<E>) -> Result<()>;
}

pub struct InMemoryOutbox<E: DomainEvent> {
    topic_name: String,
    envelopes: RwLock<Vec<EventEnvelope<E>>>,
}

impl<E: DomainEvent> InMemoryOutbox<E> {
    pub fn new(topic_name: &str) -> Self {
        Self {
            topic_name: topic_name.to_string(),
            envelopes: RwLock::new(Vec::new()),
        }
    }

    pub fn topic_name(&self) -> &str {
        &self.topic_name
    }

    /// Snapshot of every buffered envelope, oldest first
    pub async fn envelopes(&self) -> Vec<EventEnvelope<E>> {
        self.envelopes.read().await.clone()
    }

    /// Buffered envelopes for one aggregate, oldest first
    pub async fn envelopes_for(&self, aggregate_id: Uuid) -> Vec<EventEnvelope<E>> {
        self.envelopes
            .read()
            .await
            .iter()
            .filter(|envelope| envelope.aggregate_id == aggregate_id)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.envelopes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.envelopes.read().await.is_empty()
    }

    /// Remove and return everything buffered so far
    pub async fn drain(&self) -> Vec<EventEnvelope<E>> {
        let drained: Vec<_> = self.envelopes.write().await.drain(..).collect();
        tracing::debug!(
            topic = %self.topic_name,
            count = drained.len(),
            "Drained outbox"
        );
        drained
    }

    /// Payloads as JSON, one line per envelope
    pub async fn to_json_lines(&self) -> Result<Vec<String>> {
        self.envelopes
            .read()
            .await
            .iter()
            .map(serialize_event)
            .collect()
    }
}

#[async_trait]
impl<E: DomainEvent + 'static> EventPublisher<E> for InMemoryOutbox<E> {
    async fn publish(&self, envelope: EventEnvelope<E>) -> Result<()> {
        let mut envelopes = self.envelopes.write().await;

        let last_sequence = envelopes
            .iter()
            .rev()
            .find(|existing| existing.aggregate_id == envelope.aggregate_id)
            .map(|existing| existing.sequence_number);

        if let Some(last) = last_sequence {
            if envelope.sequence_number <= last {
                bail!(
                    "Out-of-order event for aggregate {}: sequence {} after {}",
                    envelope.aggregate_id,
                    envelope.sequence_number,
                    last
                );
            }
        }

        tracing::debug!(
            topic = %self.topic_name,
            aggregate_id = %envelope.aggregate_id,
            sequence_number = envelope.sequence_number,
            event_type = %envelope.event_type,
            "Appended event to outbox"
        );

        envelopes.push(envelope);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    struct Pinged {
        n: u32,
    }

    impl DomainEvent for Pinged {
        fn event_type() -> &'static str { "Pinged" }
    }

    fn envelope(aggregate_id: Uuid, sequence: i64, n: u32) -> EventEnvelope<Pinged> {
        EventEnvelope::new(aggregate_id, sequence, "Pinged", Pinged { n }, Uuid::new_v4(), Utc::now())
    }

    #[tokio::test]
    async fn test_publish_keeps_append_order() {
        let outbox = InMemoryOutbox::new("pings");
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        outbox.publish(envelope(first, 1, 1)).await.unwrap();
        outbox.publish(envelope(second, 1, 2)).await.unwrap();
        outbox.publish(envelope(first, 2, 3)).await.unwrap();

        let all: Vec<u32> = outbox.envelopes().await.iter().map(|e| e.event_data.n).collect();
        assert_eq!(all, vec![1, 2, 3]);

        let only_first: Vec<i64> = outbox.envelopes_for(first).await.iter().map(|e| e.sequence_number).collect();
        assert_eq!(only_first, vec![1, 2]);
        assert_eq!(outbox.topic_name(), "pings");
    }

    #[tokio::test]
    async fn test_publish_rejects_stale_sequence() {
        let outbox = InMemoryOutbox::new("pings");
        let aggregate_id = Uuid::new_v4();

        outbox.publish(envelope(aggregate_id, 2, 1)).await.unwrap();
        assert!(outbox.publish(envelope(aggregate_id, 2, 2)).await.is_err());
        assert!(outbox.publish(envelope(aggregate_id, 1, 3)).await.is_err());
        assert_eq!(outbox.len().await, 1);
    }

    #[tokio::test]
    async fn test_drain_empties_outbox() {
        let outbox = InMemoryOutbox::new("pings");
        outbox.publish(envelope(Uuid::new_v4(), 1, 7)).await.unwrap();

        let lines = outbox.to_json_lines().await.unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("\"n\":7"));

        let drained = outbox.drain().await;
        assert_eq!(drained.len(), 1);
        assert!(outbox.is_empty().await);
    }
}
