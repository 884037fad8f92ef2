//! Event publication to the message bus.
//!
//! Finalized catalog entries are published to the `gmma_events` topic,
//! keyed by the event's time string. Publication is fire-and-forget from
//! the pipeline's perspective: the producer is created once per process,
//! delivery failures are logged by the publisher and never fail or roll
//! back the computed response.
//!
//! ## EventPublisher trait
//!
//! The bus is abstracted behind `EventPublisher` so the pipeline can run
//! without a broker (tests, `--no-publish`) via `NoOpPublisher`.

use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::defaults::{BROKER_PROBE_TIMEOUT_SECS, EVENT_TOPIC};
use crate::types::CatalogEntry;

/// Message-bus errors. Surfaced in logs only, per the module docs.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("broker unreachable at {brokers}: {source}")]
    Connect {
        brokers: String,
        source: rdkafka::error::KafkaError,
    },

    #[error("failed to serialize event {event_idx}: {source}")]
    Serialize {
        event_idx: i64,
        source: serde_json::Error,
    },

    #[error("failed to enqueue event {event_idx}: {source}")]
    Enqueue {
        event_idx: i64,
        source: rdkafka::error::KafkaError,
    },
}

/// Sink for finalized catalog entries.
///
/// Implementations log their own failures; callers publish in catalog
/// order and move on.
pub trait EventPublisher: Send + Sync {
    /// Publish one finalized event, keyed by its time string.
    fn publish(&self, key: &str, event: &CatalogEntry);

    /// Sink name for logging and health checks.
    fn name(&self) -> &'static str;
}

/// Publisher that drops events. Used in tests and broker-less runs;
/// "no bus attached" is a valid operational state.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpPublisher;

impl EventPublisher for NoOpPublisher {
    fn publish(&self, key: &str, _event: &CatalogEntry) {
        debug!(key, "Event publish skipped (no-op publisher)");
    }

    fn name(&self) -> &'static str {
        "NoOp"
    }
}

/// Kafka-backed publisher over a process-lifetime producer.
pub struct KafkaPublisher {
    producer: FutureProducer,
}

impl KafkaPublisher {
    /// Create a producer against `brokers` and probe broker metadata so a
    /// dead bus is detected at startup rather than on the first event.
    pub fn connect(brokers: &str) -> Result<Self, PublishError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|source| PublishError::Connect {
                brokers: brokers.to_string(),
                source,
            })?;

        producer
            .client()
            .fetch_metadata(
                Some(EVENT_TOPIC),
                Duration::from_secs(BROKER_PROBE_TIMEOUT_SECS),
            )
            .map_err(|source| PublishError::Connect {
                brokers: brokers.to_string(),
                source,
            })?;

        info!(brokers, topic = EVENT_TOPIC, "Connected to event bus");
        Ok(Self { producer })
    }

    fn try_publish(&self, key: &str, event: &CatalogEntry) -> Result<(), PublishError> {
        let payload =
            serde_json::to_string(event).map_err(|source| PublishError::Serialize {
                event_idx: event.event_idx,
                source,
            })?;
        let record = FutureRecord::to(EVENT_TOPIC).key(key).payload(&payload);
        let delivery = self
            .producer
            .send_result(record)
            .map_err(|(source, _)| PublishError::Enqueue {
                event_idx: event.event_idx,
                source,
            })?;

        // Delivery is confirmed asynchronously; failures are observed in a
        // background task so the pipeline never waits on the broker.
        let event_idx = event.event_idx;
        let key = key.to_string();
        tokio::spawn(async move {
            match delivery.await {
                Ok(Ok(_)) => debug!(event_idx, key, "Event delivered"),
                Ok(Err((e, _))) => warn!(event_idx, key, error = %e, "Event delivery failed"),
                Err(_) => warn!(event_idx, key, "Event delivery canceled"),
            }
        });
        Ok(())
    }
}

impl EventPublisher for KafkaPublisher {
    fn publish(&self, key: &str, event: &CatalogEntry) {
        if let Err(e) = self.try_publish(key, event) {
            warn!(error = %e, "Event publish failed");
        }
    }

    fn name(&self) -> &'static str {
        "Kafka"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Test double that records published keys.
    pub struct RecordingPublisher {
        pub published: Mutex<Vec<(String, i64)>>,
    }

    impl RecordingPublisher {
        pub fn new() -> Self {
            Self {
                published: Mutex::new(Vec::new()),
            }
        }
    }

    impl EventPublisher for RecordingPublisher {
        fn publish(&self, key: &str, event: &CatalogEntry) {
            self.published
                .lock()
                .unwrap()
                .push((key.to_string(), event.event_idx));
        }

        fn name(&self) -> &'static str {
            "Recording"
        }
    }

    fn entry(event_idx: i64) -> CatalogEntry {
        CatalogEntry {
            time: "2021-07-29T06:00:00.000".to_string(),
            magnitude: 1.5,
            longitude: -155.0,
            latitude: 19.5,
            depth_m: 6000.0,
            covariance: "0.100,0.200,0.000".to_string(),
            event_idx,
        }
    }

    #[test]
    fn test_noop_publisher() {
        let publisher = NoOpPublisher;
        publisher.publish("2021-07-29T06:00:00.000", &entry(0));
        assert_eq!(publisher.name(), "NoOp");
    }

    #[test]
    fn test_trait_object_records_in_order() {
        let publisher = RecordingPublisher::new();
        let sink: &dyn EventPublisher = &publisher;
        for idx in 0..3 {
            let event = entry(idx);
            sink.publish(&event.time, &event);
        }
        let published = publisher.published.lock().unwrap();
        let order: Vec<i64> = published.iter().map(|(_, idx)| *idx).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }
}
