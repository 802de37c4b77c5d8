use crate::messaging::config::RabbitMqConfig;
use chrono::{DateTime, Utc};
use lapin::{
    options::{BasicPublishOptions, ExchangeDeclareOptions},
    BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind,
    types::FieldTable
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PublisherError {
    #[error("Failed to connect to RabbitMQ: {0}")]
    ConnectionError(#[from] lapin::Error),

    #[error("Failed to serialize message: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Publisher not initialized")]
    NotInitialized
}

/// Message sent when a contest (race or challenge) has been settled.
/// The web layer consumes these to refresh rankings and accounting pages.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementMessage {
    pub contest_type: String,
    pub contest_id: i32,
    pub season: i32,
    pub processed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>
}

/// Message sent when a season is closed and rewards have been applied
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonClosedMessage {
    pub season: i32,
    pub rewarded_drivers: Vec<i32>,
    pub processed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>
}

/// RabbitMQ publisher for settlement events
pub struct RabbitMqPublisher {
    connection: Option<Arc<Connection>>,
    channel: Option<Channel>,
    exchange: String,
    routing_key: String
}

impl RabbitMqPublisher {
    /// Creates a new RabbitMQ publisher instance
    pub fn new(exchange: String, routing_key: String) -> Self {
        Self {
            connection: None,
            channel: None,
            exchange,
            routing_key
        }
    }

    /// Creates a new RabbitMQ publisher from configuration
    pub fn from_config(config: &RabbitMqConfig) -> Self {
        Self::new(config.exchange.clone(), config.routing_key.clone())
    }

    /// Creates and connects a publisher from configuration
    pub async fn connect_from_config(config: &RabbitMqConfig) -> Result<Self, PublisherError> {
        let mut publisher = Self::from_config(config);
        publisher.connect(&config.connection_url()).await?;
        Ok(publisher)
    }

    /// Connects to RabbitMQ and initializes the publisher
    pub async fn connect(&mut self, rabbitmq_url: &str) -> Result<(), PublisherError> {
        let connection = Connection::connect(rabbitmq_url, ConnectionProperties::default()).await?;
        let connection = Arc::new(connection);

        let channel = connection.create_channel().await?;

        // Declare the exchange (fanout type for broadcasting)
        channel
            .exchange_declare(
                &self.exchange,
                ExchangeKind::Fanout,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default()
            )
            .await?;

        self.connection = Some(connection);
        self.channel = Some(channel);

        info!("Connected to RabbitMQ at {}", rabbitmq_url);
        info!(
            "Exchange '{}' declared with routing key '{}'",
            self.exchange, self.routing_key
        );

        Ok(())
    }

    /// Publishes a settlement message for a settled contest
    pub async fn publish_settlement(
        &self,
        contest_type: &str,
        contest_id: i32,
        season: i32,
        correlation_id: Option<String>
    ) -> Result<(), PublisherError> {
        let message = SettlementMessage {
            contest_type: contest_type.to_string(),
            contest_id,
            season,
            processed_at: Utc::now(),
            correlation_id
        };

        self.publish(&message).await?;

        debug!(
            "Published settlement message for {} {} to exchange '{}' with routing key '{}'",
            contest_type, contest_id, self.exchange, self.routing_key
        );

        Ok(())
    }

    /// Publishes a season-closed message
    pub async fn publish_season_closed(
        &self,
        season: i32,
        rewarded_drivers: Vec<i32>,
        correlation_id: Option<String>
    ) -> Result<(), PublisherError> {
        let message = SeasonClosedMessage {
            season,
            rewarded_drivers,
            processed_at: Utc::now(),
            correlation_id
        };

        self.publish(&message).await?;

        debug!("Published season-closed message for season {}", season);

        Ok(())
    }

    async fn publish<T: Serialize>(&self, message: &T) -> Result<(), PublisherError> {
        let channel = self.channel.as_ref().ok_or(PublisherError::NotInitialized)?;

        let payload = serde_json::to_vec(message)?;
        let message_id = Uuid::new_v4().to_string();

        channel
            .basic_publish(
                &self.exchange,
                &self.routing_key,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default()
                    .with_content_type("application/json".into())
                    .with_message_id(message_id.into())
                    .with_timestamp(Utc::now().timestamp() as u64)
            )
            .await?;

        Ok(())
    }

    /// Checks if the publisher is connected
    pub fn is_connected(&self) -> bool {
        self.connection.is_some() && self.channel.is_some()
    }

    /// Closes the connection to RabbitMQ
    pub async fn close(&mut self) -> Result<(), PublisherError> {
        if let Some(channel) = self.channel.take() {
            channel.close(200, "Normal shutdown").await?;
        }

        if let Some(connection) = self.connection.take() {
            if let Ok(conn) = Arc::try_unwrap(connection) {
                conn.close(200, "Normal shutdown").await?;
            }
        }

        info!("RabbitMQ connection closed");
        Ok(())
    }
}

impl Drop for RabbitMqPublisher {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!("RabbitMQ publisher dropped without proper closure");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publisher_creation() {
        let config = RabbitMqConfig::default();
        let publisher = RabbitMqPublisher::from_config(&config);

        assert!(!publisher.is_connected());
    }

    #[test]
    fn test_settlement_message_serialization() {
        let message = SettlementMessage {
            contest_type: "race".to_string(),
            contest_id: 42,
            season: 3,
            processed_at: Utc::now(),
            correlation_id: None
        };

        let json = serde_json::to_string(&message).unwrap();

        assert!(json.contains("\"contestType\":\"race\""));
        assert!(json.contains("\"contestId\":42"));
        assert!(!json.contains("correlationId"));
    }

    #[test]
    fn test_season_closed_message_serialization() {
        let message = SeasonClosedMessage {
            season: 7,
            rewarded_drivers: vec![1, 2, 3],
            processed_at: Utc::now(),
            correlation_id: Some("corr-id".to_string())
        };

        let json = serde_json::to_string(&message).unwrap();

        assert!(json.contains("\"season\":7"));
        assert!(json.contains("\"correlationId\":\"corr-id\""));
    }

    #[test]
    fn test_publisher_drop_when_not_connected() {
        let config = RabbitMqConfig::default();
        let _publisher = RabbitMqPublisher::from_config(&config);
        // Publisher should drop without issues when not connected
    }
}
