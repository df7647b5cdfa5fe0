//! MQTT channel: async client for the broker session.
//!
//! Wraps `rumqttc::AsyncClient` behind the `Channel` trait so the bridge
//! can be exercised against `MockChannel` in tests.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, LastWill, MqttOptions, Packet, QoS};

use crate::config::MqttConfig;
use crate::error::{MqttError, MqttResult};
use pa_protocol::status;

/// Upper bound on waiting for the broker's CONNACK.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Request queue depth between the client handle and the event loop.
const REQUEST_CAPACITY: usize = 64;

// ── Channel trait ─────────────────────────────────────────────

/// Abstraction for MQTT publishing, subscribing and session teardown.
///
/// Implementations must accept concurrent calls from the network task and
/// the main loop.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Publish a raw payload to a topic.
    async fn publish(&self, topic: &str, payload: &[u8], qos: QoS, retain: bool)
    -> MqttResult<()>;

    /// Subscribe to a topic filter.
    async fn subscribe(&self, filter: &str, qos: QoS) -> MqttResult<()>;

    /// Send DISCONNECT to the broker.
    async fn disconnect(&self) -> MqttResult<()>;
}

// ── MqttChannel ───────────────────────────────────────────────

/// MQTT channel connected to the configured broker.
///
/// Owns the `AsyncClient`. The `EventLoop` is returned separately from
/// `connect()`; the caller must keep polling it in a spawned task or no
/// packets reach the wire.
pub struct MqttChannel {
    client: AsyncClient,
}

impl MqttChannel {
    /// Connect to the broker and wait for its CONNACK.
    ///
    /// Registers a retained `offline` last will on the status topic so the
    /// broker announces an unclean exit. A failed first connect is returned
    /// as `MqttError::Connection`; no retry happens here.
    pub async fn connect(config: &MqttConfig) -> MqttResult<(Self, EventLoop)> {
        let options = build_options(config);
        let (client, mut eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);

        match tokio::time::timeout(CONNECT_TIMEOUT, await_connack(&mut eventloop)).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::error!(host = %config.host, port = config.port, "timed out waiting for CONNACK");
                return Err(MqttError::Connection(format!(
                    "no CONNACK from {}:{} within {}s",
                    config.host,
                    config.port,
                    CONNECT_TIMEOUT.as_secs()
                )));
            }
        }

        tracing::info!(host = %config.host, port = config.port, client_id = %config.client_id, "MQTT session established");
        Ok((Self { client }, eventloop))
    }
}

/// Build rumqttc options from the config: keep-alive, credentials, last will.
pub fn build_options(config: &MqttConfig) -> MqttOptions {
    let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
    options.set_keep_alive(Duration::from_secs(config.keepalive_secs.into()));

    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        options.set_credentials(username, password);
    } else if config.username.is_some() || config.password.is_some() {
        tracing::warn!("MQTT username and password must both be set; connecting anonymously");
    }

    options.set_last_will(LastWill::new(
        &config.status_topic,
        status::OFFLINE,
        QoS::AtMostOnce,
        true,
    ));
    options
}

async fn await_connack(eventloop: &mut EventLoop) -> MqttResult<()> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                return match ack.code {
                    ConnectReturnCode::Success => Ok(()),
                    code => {
                        tracing::error!(code = ?code, "broker refused the connection");
                        Err(MqttError::Connection(format!("broker refused: {code:?}")))
                    }
                };
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "MQTT connect failed");
                return Err(MqttError::Connection(e.to_string()));
            }
        }
    }
}

#[async_trait]
impl Channel for MqttChannel {
    async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> MqttResult<()> {
        self.client
            .publish(topic, qos, retain, payload.to_vec())
            .await
            .map_err(|e| MqttError::Publish(e.to_string()))
    }

    async fn subscribe(&self, filter: &str, qos: QoS) -> MqttResult<()> {
        self.client
            .subscribe(filter, qos)
            .await
            .map_err(|e| MqttError::Subscribe(e.to_string()))
    }

    async fn disconnect(&self) -> MqttResult<()> {
        self.client
            .disconnect()
            .await
            .map_err(|e| MqttError::Disconnect(e.to_string()))
    }
}
