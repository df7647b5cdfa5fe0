use serde::Deserialize;

use crate::error::{MqttError, MqttResult};

/// MQTT broker connection and topic settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MqttConfig {
    /// Broker hostname.
    #[serde(default = "default_host")]
    pub host: String,
    /// Broker port (default 1883).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Username; credentials are only sent when both username and password are set.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// MQTT client ID (should be unique per broker).
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Subscription filter used when listening is enabled.
    #[serde(default = "default_listen_topic")]
    pub listen_topic: String,
    /// Retained availability topic (`online` / `offline`).
    #[serde(default = "default_status_topic")]
    pub status_topic: String,
    /// Prefix for every sensor value topic.
    #[serde(default = "default_sensor_topic_root")]
    pub sensor_topic_root: String,
    /// Keep-alive interval in seconds.
    #[serde(default = "default_keepalive")]
    pub keepalive_secs: u16,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    format!("purpleair2mqtt-{}", std::process::id())
}

fn default_listen_topic() -> String {
    "#".to_string()
}

fn default_status_topic() -> String {
    "alerts/purpleair2mqtt".to_string()
}

fn default_sensor_topic_root() -> String {
    "sensors/purpleair2mqtt".to_string()
}

fn default_keepalive() -> u16 {
    60
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: None,
            password: None,
            client_id: default_client_id(),
            listen_topic: default_listen_topic(),
            status_topic: default_status_topic(),
            sensor_topic_root: default_sensor_topic_root(),
            keepalive_secs: default_keepalive(),
        }
    }
}

impl MqttConfig {
    /// Reject settings the session cannot start with.
    pub fn validate(&self) -> MqttResult<()> {
        if self.status_topic.trim().is_empty() {
            return Err(MqttError::Config("status_topic must not be empty".into()));
        }
        if self.sensor_topic_root.trim_matches('/').trim().is_empty() {
            return Err(MqttError::Config(
                "sensor_topic_root must not be empty".into(),
            ));
        }
        if self.listen_topic.is_empty() {
            return Err(MqttError::Config("listen_topic must not be empty".into()));
        }
        Ok(())
    }
}
