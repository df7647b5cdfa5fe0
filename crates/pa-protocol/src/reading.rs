//! A single JSON reading returned by a PurpleAir device's local endpoint.

use serde_json::{Map, Value};

use crate::error::{ProtocolError, ProtocolResult};

/// Characters removed from a raw `SensorId` to make it usable in a topic.
const SEPARATORS: [char; 4] = [' ', ',', ':', '-'];

/// Remove topic-unsafe separators, keeping every other character in order.
///
/// `"AB:12, 34-5"` becomes `"AB12345"`.
pub fn strip_separators(raw: &str) -> String {
    raw.chars().filter(|c| !SEPARATORS.contains(c)).collect()
}

/// Parsed device response, keyed by metric name.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    fields: Map<String, Value>,
}

impl SensorReading {
    /// Parse a response body. The body must be a JSON object.
    pub fn parse(body: &str) -> ProtocolResult<Self> {
        Self::from_value(serde_json::from_str(body)?)
    }

    pub fn from_value(value: Value) -> ProtocolResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(ProtocolError::NotAnObject),
        }
    }

    /// Topic-safe identifier derived from the `SensorId` field.
    pub fn sensor_id(&self) -> ProtocolResult<String> {
        self.fields
            .get("SensorId")
            .and_then(Value::as_str)
            .map(strip_separators)
            .ok_or(ProtocolError::MissingSensorId)
    }

    /// Display name configured on the device.
    pub fn geo(&self) -> Option<String> {
        self.text("Geo")
    }

    pub fn hardware_version(&self) -> Option<String> {
        self.text("hardwareversion")
    }

    /// Firmware version.
    pub fn firmware_version(&self) -> Option<String> {
        self.text("version")
    }

    /// Metric keys present in the response.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    fn text(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}
