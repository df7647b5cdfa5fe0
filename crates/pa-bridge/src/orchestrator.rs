//! MQTT session orchestrator.
//!
//! Owns one broker session end to end: connect with a retained last will,
//! announce `online`, dispatch inbound messages to the processor, call the
//! processor's loop tick on the main task, and tear everything down in a
//! fixed order when the stop signal fires:
//!
//! ```text
//! publish "offline" -> stop network dispatch -> disconnect -> processor.shutdown
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{Event, EventLoop, Outgoing, Packet};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use pa_mqtt_channel::{MqttChannel, MqttConfig, MqttResult, decode};

use crate::processor::{Connection, EventProcessor, PUBLISH_QOS};

/// Sleep used when a processor suggests no positive delay.
pub const DEFAULT_TICK_DELAY: Duration = Duration::from_secs(1);

/// Pause before polling the event loop again after a connection error.
/// rumqttc reconnects on the next poll.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Upper bound on flushing queued packets during teardown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on each broker call made during teardown.
const TEARDOWN_STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Turn a processor's suggested delay into the sleep before the next tick.
pub fn next_delay(suggested_secs: Option<i64>) -> Duration {
    match suggested_secs {
        Some(secs) if secs > 0 => Duration::from_secs(secs.unsigned_abs()),
        _ => DEFAULT_TICK_DELAY,
    }
}

/// Why the session dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// We sent DISCONNECT during teardown.
    Requested,
    /// Network error or broker-initiated close.
    Unexpected(String),
}

// ── Network task ─────────────────────────────────────────────

/// The background task driving the transport.
#[async_trait]
pub trait NetworkLoop: Send {
    /// Stop dispatching callbacks. Queued outgoing packets still flush.
    fn stop(&self);

    /// Wait until the task has flushed the DISCONNECT and exited.
    async fn finish(self);
}

/// Spawned tasks for one session: the poller of the rumqttc event loop and
/// the dispatcher that runs callbacks.
///
/// Callbacks publish through the client, whose request queue only the event
/// loop poller drains, so they never run on the poller itself.
pub struct NetworkTask {
    stop_tx: watch::Sender<bool>,
    poller: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
}

/// Callback work handed from the event loop poller to the dispatcher.
enum Dispatch {
    Connected,
    Message { topic: String, payload: Vec<u8> },
}

impl NetworkTask {
    pub fn spawn(eventloop: EventLoop, orchestrator: Arc<Orchestrator>) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (dispatch_tx, dispatch_rx) = mpsc::unbounded_channel();
        let dispatcher = tokio::spawn(dispatch(dispatch_rx, orchestrator.clone(), stop_rx.clone()));
        let poller = tokio::spawn(drive(eventloop, orchestrator, dispatch_tx, stop_rx));
        Self {
            stop_tx,
            poller,
            dispatcher,
        }
    }
}

#[async_trait]
impl NetworkLoop for NetworkTask {
    fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    async fn finish(self) {
        if let Err(e) = self.poller.await {
            tracing::warn!(error = %e, "network task ended abnormally");
        }
        // The poller dropped the event loop, so a callback still blocked on
        // the client fails fast.
        if let Err(e) = self.dispatcher.await {
            tracing::warn!(error = %e, "dispatch task ended abnormally");
        }
    }
}

async fn dispatch(
    mut rx: mpsc::UnboundedReceiver<Dispatch>,
    orchestrator: Arc<Orchestrator>,
    stop_rx: watch::Receiver<bool>,
) {
    while let Some(work) = rx.recv().await {
        if *stop_rx.borrow() {
            break;
        }
        match work {
            Dispatch::Connected => orchestrator.on_connect().await,
            Dispatch::Message { topic, payload } => orchestrator.on_message(&topic, &payload).await,
        }
    }
}

async fn drive(
    mut eventloop: EventLoop,
    orchestrator: Arc<Orchestrator>,
    dispatch_tx: mpsc::UnboundedSender<Dispatch>,
    mut stop_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            event = eventloop.poll() => match event {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    tracing::info!("MQTT session reconnected");
                    let _ = dispatch_tx.send(Dispatch::Connected);
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let _ = dispatch_tx.send(Dispatch::Message {
                        payload: publish.payload.to_vec(),
                        topic: publish.topic,
                    });
                }
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    orchestrator.on_disconnect(&DisconnectReason::Unexpected(
                        "broker closed the session".into(),
                    ));
                }
                Ok(_) => {}
                Err(e) => {
                    orchestrator.on_disconnect(&DisconnectReason::Unexpected(e.to_string()));
                    tokio::select! {
                        _ = stop_rx.changed() => break,
                        () = tokio::time::sleep(RECONNECT_DELAY) => {}
                    }
                }
            },
        }
    }

    drop(dispatch_tx);

    // Flush what teardown queued (the offline status, then DISCONNECT)
    // without dispatching anything further.
    let drain = async {
        loop {
            match eventloop.poll().await {
                Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                    orchestrator.on_disconnect(&DisconnectReason::Requested);
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(error = %e, "event loop closed while draining");
                    break;
                }
            }
        }
    };
    if tokio::time::timeout(DRAIN_TIMEOUT, drain).await.is_err() {
        tracing::warn!("timed out flushing MQTT packets during shutdown");
    }
}

// ── Orchestrator ─────────────────────────────────────────────

/// Callbacks and main loop for one broker session.
pub struct Orchestrator {
    connection: Connection,
    listen_enabled: bool,
    processor: Arc<dyn EventProcessor>,
    torn_down: AtomicBool,
}

impl Orchestrator {
    pub fn new(
        connection: Connection,
        listen_enabled: bool,
        processor: Arc<dyn EventProcessor>,
    ) -> Self {
        Self {
            connection,
            listen_enabled,
            processor,
            torn_down: AtomicBool::new(false),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Subscribe when listening, then announce `online` (retained).
    /// Runs after every CONNACK.
    pub async fn on_connect(&self) {
        tracing::info!("MQTT session is connected");

        if self.listen_enabled {
            let topic = &self.connection.config().listen_topic;
            tracing::info!(topic = %topic, "subscribing");
            if let Err(e) = self.connection.channel().subscribe(topic, PUBLISH_QOS).await {
                tracing::error!(topic = %topic, error = %e, "subscription failed");
            }
        } else {
            tracing::debug!("MQTT topic listening is disabled");
        }

        let status_topic = self.connection.status_topic();
        if let Err(e) = self
            .connection
            .publish(status_topic, self.connection.online_status().as_bytes(), true)
            .await
        {
            tracing::error!(error = %e, "failed to publish online status");
        }
    }

    /// Decode if the processor asks for JSON, then dispatch. Undecodable
    /// messages are logged and dropped.
    pub async fn on_message(&self, topic: &str, payload: &[u8]) {
        let wants_json = self.processor.wants_decoded_payload(&self.connection, topic);
        match decode(payload, wants_json) {
            Ok(data) => {
                self.processor
                    .process_event(&self.connection, topic, data)
                    .await;
            }
            Err(e) => {
                tracing::warn!(
                    topic = %topic,
                    error = %e,
                    payload = %String::from_utf8_lossy(payload),
                    "failed to decode message as JSON"
                );
            }
        }
    }

    /// Log unexpected drops. Reconnecting is left to the transport.
    pub fn on_disconnect(&self, reason: &DisconnectReason) {
        match reason {
            DisconnectReason::Requested => tracing::debug!("MQTT session closed"),
            DisconnectReason::Unexpected(cause) => {
                tracing::warn!(cause = %cause, "MQTT session is disconnected");
            }
        }
    }

    /// Run one processor tick and return how long to sleep afterwards.
    pub async fn tick(&self) -> Duration {
        let suggested = self.processor.process_loop_tick(&self.connection).await;
        next_delay(suggested)
    }

    /// Tick, sleep, repeat until `stop` resolves. `stop` is watched while a
    /// tick runs too, but an in-flight tick is never cancelled: it finishes
    /// and the loop exits without sleeping.
    pub async fn run_until<F>(&self, stop: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(stop);
        loop {
            let tick = self.tick();
            tokio::pin!(tick);
            let finished = tokio::select! {
                biased;
                delay = &mut tick => Some(delay),
                () = &mut stop => None,
            };
            let Some(delay) = finished else {
                tracing::info!("stop requested, finishing the current tick");
                (&mut tick).await;
                break;
            };
            tracing::debug!(delay_secs = delay.as_secs(), "tick complete");

            tokio::select! {
                biased;
                () = &mut stop => break,
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Ordered teardown: `offline` status, stop network dispatch, disconnect,
    /// then the processor's shutdown hook. Each step runs even if an earlier
    /// one failed. A second call does nothing.
    pub async fn shutdown<N: NetworkLoop>(&self, network: N) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            tracing::warn!("shutdown already completed");
            return;
        }
        tracing::info!("shutting down");

        let status_topic = self.connection.status_topic();
        let offline = self.connection.publish(
            status_topic,
            self.connection.offline_status().as_bytes(),
            true,
        );
        match tokio::time::timeout(TEARDOWN_STEP_TIMEOUT, offline).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "failed to publish offline status"),
            Err(_) => tracing::warn!("timed out queueing offline status"),
        }

        network.stop();

        match tokio::time::timeout(TEARDOWN_STEP_TIMEOUT, self.connection.channel().disconnect())
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "failed to disconnect cleanly"),
            Err(_) => tracing::warn!("timed out queueing disconnect"),
        }
        network.finish().await;

        self.processor.shutdown(&self.connection).await;
        tracing::info!("disconnected");
    }
}

/// Connect, run the main loop until `stop` resolves, then tear down.
///
/// A failed initial connect is returned to the caller; restarting is the
/// supervisor's job.
pub async fn connect_and_loop<F>(
    config: &MqttConfig,
    listen_enabled: bool,
    processor: Arc<dyn EventProcessor>,
    stop: F,
) -> MqttResult<()>
where
    F: Future<Output = ()>,
{
    config.validate()?;

    tracing::info!(host = %config.host, port = config.port, "connecting to broker");
    let (channel, eventloop) = MqttChannel::connect(config).await.inspect_err(|e| {
        tracing::error!(error = %e, "unable to connect to broker");
    })?;

    let connection = Connection::new(Arc::new(channel), Arc::new(config.clone()));
    let orchestrator = Arc::new(Orchestrator::new(connection, listen_enabled, processor));

    let network = NetworkTask::spawn(eventloop, orchestrator.clone());
    // The first CONNACK was consumed by `connect`.
    orchestrator.on_connect().await;

    orchestrator.run_until(stop).await;
    orchestrator.shutdown(network).await;
    Ok(())
}
