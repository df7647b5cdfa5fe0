//! Home Assistant MQTT discovery records.
//!
//! One record is produced per metric key that appears both in a device
//! reading and in [`METRIC_DESCRIPTORS`](crate::descriptors::METRIC_DESCRIPTORS).
//! Each record is published retained to its config topic so Home Assistant
//! creates the entity on startup.

use serde::Serialize;

use crate::descriptors::{self, MetricDescriptor};
use crate::error::ProtocolResult;
use crate::reading::SensorReading;
use crate::{status, topics};

const MANUFACTURER: &str = "PurpleAir";
const MODEL: &str = "PurpleAir Sensor";

/// Where the bridge publishes, needed to link entities to their topics.
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryContext<'a> {
    /// Bridge availability topic.
    pub status_topic: &'a str,
    /// Root under which sensor readings are published.
    pub sensor_topic_root: &'a str,
    /// Home Assistant discovery prefix (usually `homeassistant`).
    pub discovery_root: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Availability {
    pub topic: String,
}

/// Device registry entry shared by all entities of one sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hw_version: Option<String>,
    pub identifiers: Vec<String>,
    pub manufacturer: &'static str,
    pub model: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sw_version: Option<String>,
}

impl DeviceBlock {
    fn for_reading(reading: &SensorReading, sensor_id: &str) -> Self {
        Self {
            hw_version: reading.hardware_version(),
            identifiers: vec![topics::device_identifier(sensor_id)],
            manufacturer: MANUFACTURER,
            model: MODEL,
            name: reading.geo(),
            sw_version: reading.firmware_version(),
        }
    }
}

/// Discovery payload for a single sensor entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryRecord {
    #[serde(flatten)]
    pub template: MetricDescriptor,
    pub availability: Availability,
    pub payload_available: &'static str,
    pub payload_not_available: &'static str,
    pub device: DeviceBlock,
    pub unique_id: String,
    pub state_topic: String,
}

/// A record together with the topic it is published to.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryMessage {
    pub topic: String,
    pub record: DiscoveryRecord,
}

/// Build discovery messages for every known metric in `reading`.
///
/// Fails only when the reading carries no usable `SensorId`.
pub fn build_records(
    reading: &SensorReading,
    ctx: &DiscoveryContext<'_>,
) -> ProtocolResult<Vec<DiscoveryMessage>> {
    let sensor_id = reading.sensor_id()?;
    let state_topic = topics::sensor_value(ctx.sensor_topic_root, &sensor_id);
    let device = DeviceBlock::for_reading(reading, &sensor_id);

    let mut messages = Vec::new();
    for key in reading.keys() {
        let Some(template) = descriptors::lookup(key) else {
            tracing::debug!(key, "skipping unknown sensor key");
            continue;
        };

        messages.push(DiscoveryMessage {
            topic: topics::discovery_config(ctx.discovery_root, &sensor_id, key),
            record: DiscoveryRecord {
                template: *template,
                availability: Availability {
                    topic: ctx.status_topic.to_string(),
                },
                payload_available: status::ONLINE,
                payload_not_available: status::OFFLINE,
                device: device.clone(),
                unique_id: topics::unique_id(&sensor_id, key),
                state_topic: state_topic.clone(),
            },
        });
    }

    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use serde_json::json;

    const CTX: DiscoveryContext<'static> = DiscoveryContext {
        status_topic: "alerts/purpleair2mqtt",
        sensor_topic_root: "sensors/purpleair2mqtt",
        discovery_root: "homeassistant",
    };

    fn reading() -> SensorReading {
        SensorReading::from_value(json!({
            "SensorId": "84:f3:eb:7b:c8:ee",
            "Geo": "PurpleAir-c8ee",
            "version": "7.02",
            "hardwareversion": "2.0",
            "current_temp_f": 71,
            "pm2_5_atm": 3.4,
            "foo": "bar",
        }))
        .unwrap()
    }

    #[test]
    fn only_known_keys_produce_records() {
        let messages = build_records(&reading(), &CTX).unwrap();
        let mut keys: Vec<&str> = messages
            .iter()
            .map(|m| m.topic.split('/').nth(3).unwrap())
            .collect();
        keys.sort_unstable();
        // Geo and hardwareversion are diagnostic metrics in the table.
        assert_eq!(
            keys,
            vec!["Geo", "current_temp_f", "hardwareversion", "pm2_5_atm"]
        );
        assert!(messages.iter().all(|m| !m.topic.contains("/foo/")));
    }

    #[test]
    fn record_fields() {
        let messages = build_records(&reading(), &CTX).unwrap();
        let temp = messages
            .iter()
            .find(|m| m.topic.ends_with("/current_temp_f/config"))
            .unwrap();

        assert_eq!(
            temp.topic,
            "homeassistant/sensor/purpleair2mqtt_84f3eb7bc8ee/current_temp_f/config"
        );
        assert_eq!(temp.record.unique_id, "purpleair_84f3eb7bc8ee_current_temp_f");
        assert_eq!(
            temp.record.state_topic,
            "sensors/purpleair2mqtt/84f3eb7bc8ee"
        );
        assert_eq!(temp.record.availability.topic, "alerts/purpleair2mqtt");
        assert_eq!(temp.record.device.identifiers, vec!["purpleair_84f3eb7bc8ee"]);
        assert_eq!(temp.record.device.name.as_deref(), Some("PurpleAir-c8ee"));
    }

    #[test]
    fn record_serializes_flat() {
        let messages = build_records(&reading(), &CTX).unwrap();
        let temp = messages
            .iter()
            .find(|m| m.topic.ends_with("/current_temp_f/config"))
            .unwrap();
        let json = serde_json::to_value(&temp.record).unwrap();

        assert_eq!(json["name"], "Current Temperature");
        assert_eq!(json["device_class"], "temperature");
        assert_eq!(json["value_template"], "{{ value_json.current_temp_f }}");
        assert_eq!(json["payload_available"], "online");
        assert_eq!(json["payload_not_available"], "offline");
        assert_eq!(json["availability"]["topic"], "alerts/purpleair2mqtt");
        assert_eq!(json["device"]["manufacturer"], "PurpleAir");
        assert_eq!(json["device"]["model"], "PurpleAir Sensor");
        assert_eq!(json["device"]["hw_version"], "2.0");
        assert_eq!(json["device"]["sw_version"], "7.02");
        assert!(json.get("template").is_none());
    }

    #[test]
    fn missing_device_fields_are_omitted() {
        let reading =
            SensorReading::from_value(json!({"SensorId": "abc", "pressure": 1012.3})).unwrap();
        let messages = build_records(&reading, &CTX).unwrap();
        assert_eq!(messages.len(), 1);
        let json = serde_json::to_value(&messages[0].record.device).unwrap();
        assert!(json.get("name").is_none());
        assert!(json.get("hw_version").is_none());
        assert!(json.get("sw_version").is_none());
    }

    #[test]
    fn no_known_keys_yields_empty() {
        let reading = SensorReading::from_value(json!({"SensorId": "abc", "foo": 1})).unwrap();
        assert!(build_records(&reading, &CTX).unwrap().is_empty());
    }

    #[test]
    fn missing_sensor_id_is_an_error() {
        let reading = SensorReading::from_value(json!({"pressure": 1012.3})).unwrap();
        assert!(matches!(
            build_records(&reading, &CTX),
            Err(ProtocolError::MissingSensorId)
        ));
    }
}
