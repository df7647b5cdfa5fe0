//! The event-processor contract between the MQTT session and business logic.
//!
//! The orchestrator owns the broker session; an [`EventProcessor`] decides
//! what to do on every loop tick and with every inbound message. Processors
//! reach the broker only through the [`Connection`] handle they are given.

use std::sync::Arc;

use async_trait::async_trait;
use rumqttc::QoS;

use pa_mqtt_channel::{Channel, InboundPayload, MqttConfig, MqttResult};
use pa_protocol::{status, topics};

/// QoS used for every publish; the broker session gives no stronger guarantee.
pub const PUBLISH_QOS: QoS = QoS::AtMostOnce;

/// Handle to the live broker session, shared with processors.
#[derive(Clone)]
pub struct Connection {
    channel: Arc<dyn Channel>,
    config: Arc<MqttConfig>,
}

impl Connection {
    pub fn new(channel: Arc<dyn Channel>, config: Arc<MqttConfig>) -> Self {
        Self { channel, config }
    }

    pub fn config(&self) -> &MqttConfig {
        &self.config
    }

    pub fn channel(&self) -> &dyn Channel {
        self.channel.as_ref()
    }

    pub fn status_topic(&self) -> &str {
        &self.config.status_topic
    }

    pub fn online_status(&self) -> &'static str {
        status::ONLINE
    }

    pub fn offline_status(&self) -> &'static str {
        status::OFFLINE
    }

    /// Full topic for a sensor-relative topic.
    pub fn sensor_topic(&self, relative_topic: &str) -> String {
        topics::sensor_value(&self.config.sensor_topic_root, relative_topic)
    }

    /// Publish straight through to the transport; nothing is buffered here.
    pub async fn publish(&self, topic: &str, payload: &[u8], retain: bool) -> MqttResult<()> {
        self.channel.publish(topic, payload, PUBLISH_QOS, retain).await
    }

    /// Publish under the sensor topic root, always retained.
    pub async fn publish_sensor_value(&self, relative_topic: &str, payload: &[u8]) -> MqttResult<()> {
        let topic = self.sensor_topic(relative_topic);
        self.publish(&topic, payload, true).await
    }
}

/// Business logic driven by the orchestrator.
///
/// `process_event` may run on the network task while `process_loop_tick`
/// runs on the main loop, so implementations must be `Send + Sync` and
/// keep their own state behind atomics or locks.
#[async_trait]
pub trait EventProcessor: Send + Sync {
    /// React to a message received on a subscribed topic.
    async fn process_event(&self, connection: &Connection, topic: &str, payload: InboundPayload);

    /// One iteration of the main loop. Returns the suggested number of
    /// seconds to sleep before the next tick; `None`, zero or a negative
    /// value means the default of one second.
    async fn process_loop_tick(&self, connection: &Connection) -> Option<i64>;

    /// Whether payloads on `topic` should be JSON-decoded before dispatch.
    fn wants_decoded_payload(&self, connection: &Connection, topic: &str) -> bool;

    /// Release processor resources. Called once, after the session is torn down.
    async fn shutdown(&self, connection: &Connection);
}
