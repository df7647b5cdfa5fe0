//! Mock MQTT channel for testing without a real broker.
//!
//! Records every publish, subscription and disconnect, both per kind and
//! in a single ordered journal so teardown ordering can be asserted.

use async_trait::async_trait;
use rumqttc::QoS;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::channel::Channel;
use crate::error::{MqttError, MqttResult};

/// A recorded publish call.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
    pub retain: bool,
}

impl PublishedMessage {
    /// Payload as UTF-8 text (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// One recorded channel operation, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelOp {
    Publish(PublishedMessage),
    Subscribe(String),
    Disconnect,
}

/// Mock implementation of the `Channel` trait.
///
/// Thread-safe via `Mutex` (fine for test contexts).
pub struct MockChannel {
    journal: Mutex<Vec<ChannelOp>>,
    fail_subscribe: AtomicBool,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            journal: Mutex::new(Vec::new()),
            fail_subscribe: AtomicBool::new(false),
        }
    }

    /// Make every later `subscribe` call fail.
    pub fn fail_subscriptions(&self) {
        self.fail_subscribe.store(true, Ordering::SeqCst);
    }

    /// All operations in call order.
    pub fn journal(&self) -> Vec<ChannelOp> {
        self.journal.lock().unwrap().clone()
    }

    /// Get all published messages.
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.journal
            .lock()
            .unwrap()
            .iter()
            .filter_map(|op| match op {
                ChannelOp::Publish(msg) => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }

    /// Get all subscription filters.
    pub fn subscriptions(&self) -> Vec<String> {
        self.journal
            .lock()
            .unwrap()
            .iter()
            .filter_map(|op| match op {
                ChannelOp::Subscribe(filter) => Some(filter.clone()),
                _ => None,
            })
            .collect()
    }

    /// Get the last published message.
    pub fn last_published(&self) -> Option<PublishedMessage> {
        self.published().pop()
    }

    /// Get published messages for a specific topic.
    pub fn published_to(&self, topic: &str) -> Vec<PublishedMessage> {
        self.published()
            .into_iter()
            .filter(|m| m.topic == topic)
            .collect()
    }

    /// Get published messages whose topic starts with `prefix`.
    pub fn published_under(&self, prefix: &str) -> Vec<PublishedMessage> {
        self.published()
            .into_iter()
            .filter(|m| m.topic.starts_with(prefix))
            .collect()
    }

    /// Check whether a subscription was made to the given filter.
    pub fn is_subscribed_to(&self, filter: &str) -> bool {
        self.subscriptions().iter().any(|f| f == filter)
    }

    /// Number of `disconnect` calls so far.
    pub fn disconnect_count(&self) -> usize {
        self.journal
            .lock()
            .unwrap()
            .iter()
            .filter(|op| matches!(op, ChannelOp::Disconnect))
            .count()
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnect_count() > 0
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for MockChannel {
    async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> MqttResult<()> {
        self.journal
            .lock()
            .unwrap()
            .push(ChannelOp::Publish(PublishedMessage {
                topic: topic.to_string(),
                payload: payload.to_vec(),
                qos,
                retain,
            }));
        Ok(())
    }

    async fn subscribe(&self, filter: &str, _qos: QoS) -> MqttResult<()> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(MqttError::Subscribe(format!("rejected filter {filter}")));
        }
        self.journal
            .lock()
            .unwrap()
            .push(ChannelOp::Subscribe(filter.to_string()));
        Ok(())
    }

    async fn disconnect(&self) -> MqttResult<()> {
        self.journal.lock().unwrap().push(ChannelOp::Disconnect);
        Ok(())
    }
}
