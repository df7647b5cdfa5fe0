//! Shared test harness for E2E integration tests.
//!
//! Runs the real orchestrator and sensor poller against a shared
//! `MockChannel` broker and wiremock-served PurpleAir devices.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pa_bridge::config::{HomeAssistantConfig, PurpleAirConfig};
use pa_bridge::orchestrator::{NetworkLoop, Orchestrator};
use pa_bridge::poller::SensorPoller;
use pa_bridge::processor::Connection;
use pa_mqtt_channel::{MockChannel, MqttConfig};

pub const STATUS_TOPIC: &str = "alerts/purpleair2mqtt";
pub const SENSOR_ROOT: &str = "sensors/purpleair2mqtt";
pub const DISCOVERY_ROOT: &str = "homeassistant";

/// Sample device body: four known metrics plus one unknown key.
pub fn device_body(sensor_id: &str, geo: &str) -> Value {
    json!({
        "SensorId": sensor_id,
        "Geo": geo,
        "version": "7.02",
        "hardwareversion": "2.0",
        "current_temp_f": 71,
        "pm2.5_aqi": 14,
        "foo": "bar",
    })
}

/// Number of discovery records `device_body` yields.
pub const KNOWN_KEYS_PER_DEVICE: usize = 4;

/// Network loop stand-in that counts stop/finish calls.
#[derive(Clone, Default)]
pub struct CountingNetwork {
    pub stops: Arc<AtomicUsize>,
    pub finishes: Arc<AtomicUsize>,
}

#[async_trait]
impl NetworkLoop for CountingNetwork {
    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    async fn finish(self) {
        self.finishes.fetch_add(1, Ordering::SeqCst);
    }
}

/// End-to-end harness: one mock broker, one mock device server.
pub struct TestHarness {
    pub mqtt: Arc<MockChannel>,
    pub devices: MockServer,
    pub orchestrator: Orchestrator,
    pub poller: Arc<SensorPoller>,
}

impl TestHarness {
    /// Build a harness polling `routes` on the device server. Each route must
    /// be mounted with [`mount_device`] or [`mount_status`] by the test.
    pub async fn new(routes: &[&str], refresh_secs: u64, discovery_enabled: bool) -> Self {
        let devices = MockServer::start().await;
        let urls = routes
            .iter()
            .map(|r| format!("{}{r}", devices.uri()))
            .collect();

        let poller = Arc::new(
            SensorPoller::new(
                PurpleAirConfig {
                    urls,
                    refresh_interval_seconds: refresh_secs,
                    request_timeout_seconds: 2,
                },
                HomeAssistantConfig {
                    discovery_enabled,
                    discovery_topic: DISCOVERY_ROOT.into(),
                },
            )
            .expect("http client"),
        );

        let mqtt = Arc::new(MockChannel::new());
        let config = MqttConfig {
            status_topic: STATUS_TOPIC.into(),
            sensor_topic_root: SENSOR_ROOT.into(),
            ..MqttConfig::default()
        };
        let connection = Connection::new(mqtt.clone(), Arc::new(config));
        let orchestrator = Orchestrator::new(connection, false, poller.clone());

        Self {
            mqtt,
            devices,
            orchestrator,
            poller,
        }
    }

    pub async fn mount_device(&self, route: &str, sensor_id: &str, geo: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(device_body(sensor_id, geo)))
            .mount(&self.devices)
            .await;
    }

    /// Device that answers only after `delay`.
    pub async fn mount_slow_device(&self, route: &str, sensor_id: &str, geo: &str, delay: Duration) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(device_body(sensor_id, geo))
                    .set_delay(delay),
            )
            .mount(&self.devices)
            .await;
    }

    /// HTTP requests the device server has received for `route`.
    pub async fn requests_to(&self, route: &str) -> usize {
        self.devices
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == route)
            .count()
    }

    pub async fn mount_status(&self, route: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_string("unavailable"))
            .mount(&self.devices)
            .await;
    }

    /// Messages published under the sensor topic root.
    pub fn sensor_publishes(&self) -> Vec<pa_mqtt_channel::PublishedMessage> {
        self.mqtt.published_under(&format!("{SENSOR_ROOT}/"))
    }

    /// Messages published under the discovery prefix.
    pub fn discovery_publishes(&self) -> Vec<pa_mqtt_channel::PublishedMessage> {
        self.mqtt.published_under(&format!("{DISCOVERY_ROOT}/"))
    }

    /// Status values published, in order.
    pub fn status_history(&self) -> Vec<String> {
        self.mqtt
            .published_to(STATUS_TOPIC)
            .iter()
            .map(|m| m.text())
            .collect()
    }
}
