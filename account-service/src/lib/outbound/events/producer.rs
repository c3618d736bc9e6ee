use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::FutureProducer;
use rdkafka::producer::FutureRecord;
use rdkafka::util::Timeout;
use thiserror::Error;

use crate::account::errors::EventPublisherError;
use crate::account::ports::EventPublisher;
use crate::config::KafkaConfig;
use crate::domain::account::events::AccountCreatedEvent;
use crate::domain::account::events::PasswordChangedEvent;
use crate::domain::account::events::PasswordResetRequestedEvent;
use crate::outbound::events::messages::AccountEventMessage;

#[derive(Debug, Error)]
pub enum KafkaProducerError {
    #[error("Failed to send message to Kafka: {0}")]
    SendError(String),

    #[error("Failed to serialize message: {0}")]
    SerializationError(String),
}

impl From<KafkaProducerError> for EventPublisherError {
    fn from(err: KafkaProducerError) -> Self {
        match err {
            KafkaProducerError::SerializationError(msg) => {
                EventPublisherError::SerializationFailed(msg)
            }
            KafkaProducerError::SendError(msg) => EventPublisherError::PublishFailed(msg),
        }
    }
}

pub struct KafkaEventProducer {
    producer: FutureProducer,
    topic: String,
    timeout: Duration,
}

impl KafkaEventProducer {
    /// Create a new Kafka event producer with "at least once" delivery semantics
    ///
    /// # Notes:
    /// - `acks=all`: Wait for all in-sync replicas to acknowledge
    /// - `enable.idempotence=true`: Prevents duplicate messages during retries
    /// - `message.timeout.ms=10000`: Upper bound on delivery; reset requests
    ///   surface a timeout to the caller as a delivery failure
    pub fn new(config: &KafkaConfig) -> Result<Self, anyhow::Error> {
        tracing::info!(
            "Initializing Kafka producer for account events: brokers={}, topic={}",
            &config.brokers,
            &config.topic
        );

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("message.timeout.ms", "10000")
            .set("enable.idempotence", "true")
            .set("acks", "all")
            .set("retries", "10")
            .set("max.in.flight.requests.per.connection", "5")
            .set("retry.backoff.ms", "100")
            .create()?;

        tracing::info!("Kafka producer initialized successfully");

        Ok(Self {
            producer,
            topic: config.topic.to_string(),
            timeout: Duration::from_secs(10),
        })
    }

    /// Publish an event keyed by account id, so events for one account stay
    /// ordered within a partition.
    async fn publish(
        &self,
        account_id: &str,
        message: &AccountEventMessage,
    ) -> Result<(), KafkaProducerError> {
        let payload = serde_json::to_string(message)
            .map_err(|e| KafkaProducerError::SerializationError(e.to_string()))?;

        let record = FutureRecord::to(&self.topic)
            .key(account_id)
            .payload(&payload);

        self.producer
            .send(record, Timeout::After(self.timeout))
            .await
            .map(|_| {
                tracing::debug!(
                    topic = %self.topic,
                    account_id,
                    "Event published"
                );
            })
            .map_err(|(err, _)| KafkaProducerError::SendError(err.to_string()))
    }
}

#[async_trait]
impl EventPublisher for KafkaEventProducer {
    async fn publish_account_created(
        &self,
        event: &AccountCreatedEvent,
    ) -> Result<(), EventPublisherError> {
        self.publish(&event.account_id, &AccountEventMessage::from(event))
            .await
            .map_err(Into::into)
    }

    async fn publish_password_reset_requested(
        &self,
        event: &PasswordResetRequestedEvent,
    ) -> Result<(), EventPublisherError> {
        self.publish(&event.account_id, &AccountEventMessage::from(event))
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to publish PasswordResetRequested event for account {}: {}",
                    event.account_id,
                    e
                );
                e.into()
            })
    }

    async fn publish_password_changed(
        &self,
        event: &PasswordChangedEvent,
    ) -> Result<(), EventPublisherError> {
        self.publish(&event.account_id, &AccountEventMessage::from(event))
            .await
            .map_err(Into::into)
    }
}
