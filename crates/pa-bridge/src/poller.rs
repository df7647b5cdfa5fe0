//! PurpleAir sensor poller.
//!
//! Fetches each configured device's local JSON endpoint once per tick and
//! republishes the body unchanged under `{sensor_topic_root}/{sensor_id}`.
//! On the first tick, when enabled, it also publishes Home Assistant
//! discovery records for every known metric of every device.
//!
//! A failing device is logged and skipped; the rest of the cycle goes on and
//! the next scheduled tick tries it again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use pa_mqtt_channel::{InboundPayload, MqttError};
use pa_protocol::discovery::{self, DiscoveryContext};
use pa_protocol::{ProtocolError, SensorReading};

use crate::config::{HomeAssistantConfig, PurpleAirConfig};
use crate::processor::{Connection, EventProcessor};

#[derive(Debug, Error)]
pub enum PollError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Mqtt(#[from] MqttError),
}

/// Event processor that polls PurpleAir devices and publishes their readings.
pub struct SensorPoller {
    config: PurpleAirConfig,
    home_assistant: HomeAssistantConfig,
    http: reqwest::Client,
    discovery_published: AtomicBool,
}

impl SensorPoller {
    pub fn new(
        config: PurpleAirConfig,
        home_assistant: HomeAssistantConfig,
    ) -> Result<Self, PollError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(PollError::Client)?;
        Ok(Self {
            config,
            home_assistant,
            http,
            discovery_published: AtomicBool::new(false),
        })
    }

    /// Whether discovery has been published during this process lifetime.
    pub fn discovery_published(&self) -> bool {
        self.discovery_published.load(Ordering::SeqCst)
    }

    /// GET `url` and return the body of a 200 response.
    pub async fn fetch(&self, url: &str) -> Result<String, PollError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| PollError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| PollError::Request {
            url: url.to_string(),
            source,
        })?;

        if status != StatusCode::OK {
            return Err(PollError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }
        Ok(body)
    }

    /// Fetch every device and publish its raw reading. Returns how many
    /// readings were published.
    pub async fn poll_targets(&self, connection: &Connection) -> usize {
        tracing::info!(targets = self.config.urls.len(), "retrieving data from PurpleAir devices");

        let mut published = 0;
        for url in &self.config.urls {
            tracing::info!(url = %url, "retrieving data");
            match self.poll_one(connection, url).await {
                Ok(sensor_id) => {
                    tracing::debug!(url = %url, sensor_id = %sensor_id, "reading published");
                    published += 1;
                }
                Err(e) => tracing::error!(url = %url, error = %e, "failed to retrieve data"),
            }
        }
        published
    }

    async fn poll_one(&self, connection: &Connection, url: &str) -> Result<String, PollError> {
        let body = self.fetch(url).await?;
        tracing::debug!(body = %body, "processing data");

        let sensor_id = SensorReading::parse(&body)?.sensor_id()?;
        connection
            .publish_sensor_value(&sensor_id, body.as_bytes())
            .await?;
        Ok(sensor_id)
    }

    /// Fetch every device and publish a retained discovery record for each
    /// known metric it reports. Returns how many records were published.
    pub async fn publish_discovery(&self, connection: &Connection) -> usize {
        let mut published = 0;
        for url in &self.config.urls {
            tracing::info!(url = %url, "publishing discovery");
            match self.discover_one(connection, url).await {
                Ok(count) => published += count,
                Err(e) => tracing::error!(url = %url, error = %e, "failed to publish discovery"),
            }
        }
        published
    }

    async fn discover_one(&self, connection: &Connection, url: &str) -> Result<usize, PollError> {
        let reading = SensorReading::parse(&self.fetch(url).await?)?;
        let ctx = DiscoveryContext {
            status_topic: connection.status_topic(),
            sensor_topic_root: &connection.config().sensor_topic_root,
            discovery_root: &self.home_assistant.discovery_topic,
        };

        let messages = discovery::build_records(&reading, &ctx)?;
        for message in &messages {
            let payload = serde_json::to_vec(&message.record).map_err(ProtocolError::from)?;
            tracing::debug!(topic = %message.topic, "publishing discovery record");
            connection.publish(&message.topic, &payload, true).await?;
        }
        Ok(messages.len())
    }
}

#[async_trait]
impl EventProcessor for SensorPoller {
    async fn process_event(&self, _connection: &Connection, topic: &str, _payload: InboundPayload) {
        tracing::trace!(topic = %topic, "ignoring inbound message");
    }

    async fn process_loop_tick(&self, connection: &Connection) -> Option<i64> {
        if self.home_assistant.discovery_enabled
            && !self.discovery_published.swap(true, Ordering::SeqCst)
        {
            let records = self.publish_discovery(connection).await;
            tracing::info!(records, "Home Assistant discovery published");
        }

        self.poll_targets(connection).await;
        Some(i64::try_from(self.config.refresh_interval_seconds).unwrap_or(i64::MAX))
    }

    fn wants_decoded_payload(&self, _connection: &Connection, _topic: &str) -> bool {
        false
    }

    async fn shutdown(&self, _connection: &Connection) {
        tracing::debug!("sensor poller stopped");
    }
}
