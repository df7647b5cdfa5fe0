//! E2E tests for session start and ordered teardown.

mod helpers;

use std::sync::atomic::Ordering;

use pa_mqtt_channel::ChannelOp;

use helpers::{CountingNetwork, STATUS_TOPIC, TestHarness};

/// Connect announces `online`, teardown announces `offline` then disconnects.
#[tokio::test]
async fn e2e_online_then_offline() {
    let h = TestHarness::new(&["/json"], 60, false).await;
    h.mount_device("/json", "ab:cd", "PurpleAir-abcd").await;

    h.orchestrator.on_connect().await;
    h.orchestrator.tick().await;

    let network = CountingNetwork::default();
    h.orchestrator.shutdown(network.clone()).await;

    assert_eq!(h.status_history(), vec!["online", "offline"]);
    assert!(h.mqtt.published_to(STATUS_TOPIC).iter().all(|m| m.retain));
    assert_eq!(network.stops.load(Ordering::SeqCst), 1);
    assert_eq!(network.finishes.load(Ordering::SeqCst), 1);

    let journal = h.mqtt.journal();
    let offline = journal
        .iter()
        .position(|op| matches!(op, ChannelOp::Publish(m) if m.text() == "offline"))
        .unwrap();
    let disconnect = journal
        .iter()
        .position(|op| matches!(op, ChannelOp::Disconnect))
        .unwrap();
    assert!(offline < disconnect);
    assert_eq!(disconnect, journal.len() - 1);
}

/// The bridge never subscribes: it only publishes.
#[tokio::test]
async fn e2e_listening_disabled() {
    let h = TestHarness::new(&[], 60, true).await;

    h.orchestrator.on_connect().await;

    assert!(h.mqtt.subscriptions().is_empty());
}

/// A second shutdown is a no-op.
#[tokio::test]
async fn e2e_shutdown_is_idempotent() {
    let h = TestHarness::new(&[], 60, false).await;

    let network = CountingNetwork::default();
    h.orchestrator.shutdown(network.clone()).await;
    h.orchestrator.shutdown(network.clone()).await;

    assert_eq!(h.mqtt.disconnect_count(), 1);
    assert_eq!(h.status_history(), vec!["offline"]);
    assert_eq!(network.finishes.load(Ordering::SeqCst), 1);
}

/// `run_until` with an already-resolved stop runs exactly one tick.
#[tokio::test]
async fn e2e_stop_before_first_sleep() {
    let h = TestHarness::new(&["/json"], 60, false).await;
    h.mount_device("/json", "ab:cd", "PurpleAir-abcd").await;

    h.orchestrator.run_until(std::future::ready(())).await;

    assert_eq!(h.sensor_publishes().len(), 1);
}
