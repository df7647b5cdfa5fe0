//! Static table of known PurpleAir metric keys and their Home Assistant
//! sensor templates.
//!
//! Keys follow the device JSON documented at
//! <https://community.purpleair.com/t/sensor-json-documentation/6917>.
//! Response keys missing from this table get no discovery record.

use serde::Serialize;

/// Home Assistant sensor template for one metric key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricDescriptor {
    /// Key in the device JSON response.
    #[serde(skip)]
    pub key: &'static str,
    pub name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<&'static str>,
    pub state_class: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<&'static str>,
    pub value_template: &'static str,
    pub enabled_by_default: bool,
}

/// Look up the template for a metric key.
pub fn lookup(key: &str) -> Option<&'static MetricDescriptor> {
    METRIC_DESCRIPTORS.iter().find(|d| d.key == key)
}

pub static METRIC_DESCRIPTORS: &[MetricDescriptor] = &[
    // ── General ──
    MetricDescriptor {
        key: "Adc",
        name: "Air Quality Index",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: Some("AQI"),
        value_template: "{{ value_json.Adc }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "current_temp_f",
        name: "Current Temperature",
        device_class: Some("temperature"),
        state_class: "measurement",
        unit_of_measurement: Some("°F"),
        value_template: "{{ value_json.current_temp_f }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "current_humidity",
        name: "Current Humidity",
        device_class: Some("humidity"),
        state_class: "measurement",
        unit_of_measurement: Some("%"),
        value_template: "{{ value_json.current_humidity }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "current_dewpoint_f",
        name: "Current Dewpoint",
        device_class: Some("temperature"),
        state_class: "measurement",
        unit_of_measurement: Some("°F"),
        value_template: "{{ value_json.current_dewpoint_f }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "pressure",
        name: "Air Pressure",
        device_class: Some("pressure"),
        state_class: "measurement",
        unit_of_measurement: Some("mbar"),
        value_template: "{{ value_json.pressure }}",
        enabled_by_default: true,
    },

    // ── Channel B ──
    MetricDescriptor {
        key: "p25aqic_b",
        name: "PM2.5 AQI Color B",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: None,
        value_template: "{{ value_json.p25aqic_b }}",
        enabled_by_default: false,
    },
    MetricDescriptor {
        key: "pm2.5_aqi_b",
        name: "PM2.5 AQI B",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: None,
        value_template: "{{ value_json['pm2.5_aqi_b'] }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "pm1_0_cf_1_b",
        name: "1.0um CF=1 Mass B",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: Some("ug/m3"),
        value_template: "{{ value_json.pm1_0_cf_1_b }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "pm2_5_cf_1_b",
        name: "2.5um CF=1 Mass B",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: Some("ug/m3"),
        value_template: "{{ value_json.pm2_5_cf_1_b }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "pm10_0_cf_1_b",
        name: "10.0um CF=1 Mass B",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: Some("ug/m3"),
        value_template: "{{ value_json.pm10_0_cf_1_b }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "pm1_0_atm_b",
        name: "1.0um ATM Mass B",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: Some("ug/m3"),
        value_template: "{{ value_json.pm1_0_atm_b }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "pm2_5_atm_b",
        name: "2.5um ATM Mass B",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: Some("ug/m3"),
        value_template: "{{ value_json.pm2_5_atm_b }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "pm10_0_atm_b",
        name: "10.0um ATM Mass B",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: Some("ug/m3"),
        value_template: "{{ value_json.pm10_0_atm_b }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "p_0_3_um_b",
        name: "0.3um Particle Count B",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: Some("um/dl"),
        value_template: "{{ value_json.p_0_3_um_b }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "p_0_5_um_b",
        name: "0.5um Particle Count B",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: Some("um/dl"),
        value_template: "{{ value_json.p_0_5_um_b }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "p_1_0_um_b",
        name: "1.0um Particle Count B",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: Some("um/dl"),
        value_template: "{{ value_json.p_1_0_um_b }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "p_2_5_um_b",
        name: "2.5um Particle Count B",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: Some("um/dl"),
        value_template: "{{ value_json.p_2_5_um_b }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "p_5_0_um_b",
        name: "5.0um Particle Count B",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: Some("um/dl"),
        value_template: "{{ value_json.p_5_0_um_b }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "p_10_0_um_b",
        name: "10.0um Particle Count B",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: Some("um/dl"),
        value_template: "{{ value_json.p_10_0_um_b }}",
        enabled_by_default: true,
    },

    // ── Channel A ──
    MetricDescriptor {
        key: "p25aqic",
        name: "PM2.5 AQI Color A",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: None,
        value_template: "{{ value_json.p25aqic }}",
        enabled_by_default: false,
    },
    MetricDescriptor {
        key: "pm2.5_aqi",
        name: "PM2.5 AQI A",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: None,
        value_template: "{{ value_json['pm2.5_aqi'] }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "pm1_0_cf_1",
        name: "1.0um CF=1 Mass A",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: Some("ug/m3"),
        value_template: "{{ value_json.pm1_0_cf_1 }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "pm2_5_cf_1",
        name: "2.5um CF=1 Mass A",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: Some("ug/m3"),
        value_template: "{{ value_json.pm2_5_cf_1 }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "pm10_0_cf_1",
        name: "10.0um CF=1 Mass A",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: Some("ug/m3"),
        value_template: "{{ value_json.pm10_0_cf_1 }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "pm1_0_atm",
        name: "1.0um ATM Mass A",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: Some("ug/m3"),
        value_template: "{{ value_json.pm1_0_atm }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "pm2_5_atm",
        name: "2.5um ATM Mass A",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: Some("ug/m3"),
        value_template: "{{ value_json.pm2_5_atm }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "pm10_0_atm",
        name: "10.0um ATM Mass A",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: Some("ug/m3"),
        value_template: "{{ value_json.pm10_0_atm }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "p_0_3_um",
        name: "0.3um Particle Count A",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: Some("um/dl"),
        value_template: "{{ value_json.p_0_3_um }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "p_0_5_um",
        name: "0.5um Particle Count A",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: Some("um/dl"),
        value_template: "{{ value_json.p_0_5_um }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "p_1_0_um",
        name: "1.0um Particle Count A",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: Some("um/dl"),
        value_template: "{{ value_json.p_1_0_um }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "p_2_5_um",
        name: "2.5um Particle Count A",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: Some("um/dl"),
        value_template: "{{ value_json.p_2_5_um }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "p_5_0_um",
        name: "5.0um Particle Count A",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: Some("um/dl"),
        value_template: "{{ value_json.p_5_0_um }}",
        enabled_by_default: true,
    },
    MetricDescriptor {
        key: "p_10_0_um",
        name: "10.0um Particle Count A",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: Some("um/dl"),
        value_template: "{{ value_json.p_10_0_um }}",
        enabled_by_default: true,
    },

    // ── Diagnostics ──
    MetricDescriptor {
        key: "Geo",
        name: "Name of the PurpleAir WiFi network for device setup",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: None,
        value_template: "PurpleAir-{{ value_json.Geo }}",
        enabled_by_default: false,
    },
    MetricDescriptor {
        key: "Mem",
        name: "Free Heap Memory",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: None,
        value_template: "{{ value_json.Mem }}",
        enabled_by_default: false,
    },
    MetricDescriptor {
        key: "memfrag",
        name: "Fragmentation of Heap Memory",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: None,
        value_template: "{{ value_json.memfrag }}",
        enabled_by_default: false,
    },
    MetricDescriptor {
        key: "memfb",
        name: "Max Free Block Size",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: None,
        value_template: "{{ value_json.memfb }}",
        enabled_by_default: false,
    },
    MetricDescriptor {
        key: "memcs",
        name: "Free Stack Space",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: None,
        value_template: "{{ value_json.memcs }}",
        enabled_by_default: false,
    },
    MetricDescriptor {
        key: "loggingrate",
        name: "Logging Rate",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: None,
        value_template: "{{ value_json.loggingrate }}",
        enabled_by_default: false,
    },
    MetricDescriptor {
        key: "uptime",
        name: "Uptime",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: None,
        value_template: "{{ value_json.uptime }}",
        enabled_by_default: false,
    },
    MetricDescriptor {
        key: "rssi",
        name: "WiFi Signal Strength",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: None,
        value_template: "{{ value_json.rssi }}",
        enabled_by_default: false,
    },
    MetricDescriptor {
        key: "hardwareversion",
        name: "Hardware Version",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: None,
        value_template: "{{ value_json.hardwareversion }}",
        enabled_by_default: false,
    },
    MetricDescriptor {
        key: "hardwarediscovered",
        name: "Hardware Discovered",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: None,
        value_template: "{{ value_json.hardwarediscovered }}",
        enabled_by_default: false,
    },
    MetricDescriptor {
        key: "status_0",
        name: "NTP time sync",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: None,
        value_template: "{{ value_json.status_0 }}",
        enabled_by_default: false,
    },
    MetricDescriptor {
        key: "status_1",
        name: "Location lookup",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: None,
        value_template: "{{ value_json.status_1 }}",
        enabled_by_default: false,
    },
    MetricDescriptor {
        key: "status_2",
        name: "Update check",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: None,
        value_template: "{{ value_json.status_2 }}",
        enabled_by_default: false,
    },
    MetricDescriptor {
        key: "status_3",
        name: "Connection to PurpleAir servers",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: None,
        value_template: "{{ value_json.status_3 }}",
        enabled_by_default: false,
    },
    MetricDescriptor {
        key: "status_6",
        name: "Data Processor #1 Status",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: None,
        value_template: "{{ value_json.status_6 }}",
        enabled_by_default: false,
    },
    MetricDescriptor {
        key: "ssid",
        name: "WiFi SSID",
        device_class: None,
        state_class: "measurement",
        unit_of_measurement: None,
        value_template: "{{ value_json.ssid }}",
        enabled_by_default: false,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn keys_are_unique() {
        let keys: HashSet<_> = METRIC_DESCRIPTORS.iter().map(|d| d.key).collect();
        assert_eq!(keys.len(), METRIC_DESCRIPTORS.len());
    }

    #[test]
    fn lookup_known_key() {
        let temp = lookup("current_temp_f").unwrap();
        assert_eq!(temp.device_class, Some("temperature"));
        assert_eq!(temp.unit_of_measurement, Some("°F"));
        assert_eq!(temp.value_template, "{{ value_json.current_temp_f }}");
    }

    #[test]
    fn lookup_unknown_key() {
        assert!(lookup("foo").is_none());
        assert!(lookup("SensorId").is_none());
    }

    #[test]
    fn templates_reference_their_key() {
        for d in METRIC_DESCRIPTORS {
            assert!(
                d.value_template.contains(d.key),
                "template for {} should reference its key",
                d.key
            );
        }
    }

    #[test]
    fn dotted_keys_use_subscript_templates() {
        assert_eq!(
            lookup("pm2.5_aqi").unwrap().value_template,
            "{{ value_json['pm2.5_aqi'] }}"
        );
    }

    #[test]
    fn diagnostics_disabled_by_default() {
        for key in ["Mem", "rssi", "uptime", "ssid", "status_0"] {
            assert!(!lookup(key).unwrap().enabled_by_default, "{key}");
        }
    }

    #[test]
    fn serializes_without_key_or_empty_options() {
        let json = serde_json::to_value(lookup("Mem").unwrap()).unwrap();
        assert!(json.get("key").is_none());
        assert!(json.get("device_class").is_none());
        assert!(json.get("unit_of_measurement").is_none());
        assert_eq!(json["state_class"], "measurement");
    }
}
