//! MQTT topic builders for sensor values and Home Assistant discovery.
//!
//! Topic structure:
//! ```text
//! {sensor_topic_root}/{sensor_id}
//! {discovery_root}/sensor/purpleair2mqtt_{sensor_id}/{metric_key}/config
//! ```

const DISCOVERY_NODE_PREFIX: &str = "purpleair2mqtt";

// ─── Sensor values ───

/// Topic carrying the raw JSON reading of one device.
pub fn sensor_value(sensor_topic_root: &str, sensor_id: &str) -> String {
    format!("{sensor_topic_root}/{sensor_id}")
}

// ─── Home Assistant discovery ───

/// Config topic for one metric of one device.
pub fn discovery_config(discovery_root: &str, sensor_id: &str, metric_key: &str) -> String {
    format!("{discovery_root}/sensor/{DISCOVERY_NODE_PREFIX}_{sensor_id}/{metric_key}/config")
}

/// Device identifier shared by every entity of one sensor.
pub fn device_identifier(sensor_id: &str) -> String {
    format!("purpleair_{sensor_id}")
}

/// Entity unique id for one metric of one sensor.
pub fn unique_id(sensor_id: &str, metric_key: &str) -> String {
    format!("purpleair_{sensor_id}_{metric_key}")
}
