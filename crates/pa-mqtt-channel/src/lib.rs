//! MQTT channel for the PurpleAir bridge.
//!
//! Provides the transport seam between the bridge and the broker:
//! - `Channel` trait for publish/subscribe/disconnect (mockable in tests)
//! - `MqttChannel` backed by rumqttc, with a retained last will
//! - `MockChannel` for testing without a broker
//! - `InboundPayload` decoding for received messages

pub mod channel;
pub mod config;
pub mod error;
pub mod handler;
pub mod mock;

// Re-exports for convenience.
pub use channel::{Channel, MqttChannel};
pub use config::MqttConfig;
pub use error::{MqttError, MqttResult};
pub use handler::{DecodeError, InboundPayload, decode};
pub use mock::{ChannelOp, MockChannel, PublishedMessage};
