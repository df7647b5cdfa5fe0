//! E2E tests for device failures during a poll cycle.

mod helpers;

use helpers::{KNOWN_KEYS_PER_DEVICE, SENSOR_ROOT, TestHarness};

/// One failing device does not stop the others from being published.
#[tokio::test]
async fn e2e_failing_device_is_isolated() {
    let h = TestHarness::new(&["/a", "/down", "/c"], 60, false).await;
    h.mount_device("/a", "aa:aa", "PurpleAir-aaaa").await;
    h.mount_status("/down", 500).await;
    h.mount_device("/c", "cc:cc", "PurpleAir-cccc").await;

    h.orchestrator.tick().await;

    let topics: Vec<String> = h.sensor_publishes().into_iter().map(|m| m.topic).collect();
    assert_eq!(
        topics,
        vec![format!("{SENSOR_ROOT}/aaaa"), format!("{SENSOR_ROOT}/cccc")]
    );
}

/// A failing device gets no discovery, and discovery is not retried for it.
#[tokio::test]
async fn e2e_discovery_skips_failing_device() {
    let h = TestHarness::new(&["/a", "/down"], 60, true).await;
    h.mount_device("/a", "aa:aa", "PurpleAir-aaaa").await;
    h.mount_status("/down", 404).await;

    h.orchestrator.tick().await;
    h.orchestrator.tick().await;

    assert!(h.poller.discovery_published());
    assert_eq!(h.discovery_publishes().len(), KNOWN_KEYS_PER_DEVICE);
    assert_eq!(h.sensor_publishes().len(), 2);
}

/// Unknown route on the mock server (404) is skipped quietly.
#[tokio::test]
async fn e2e_unmounted_route_is_skipped() {
    let h = TestHarness::new(&["/nothing-here"], 60, false).await;

    h.orchestrator.tick().await;

    assert!(h.mqtt.published().is_empty());
}

/// A device that comes back is published again on the next tick.
#[tokio::test]
async fn e2e_device_recovers_next_tick() {
    let h = TestHarness::new(&["/flaky"], 60, false).await;
    h.mount_status("/flaky", 503).await;

    h.orchestrator.tick().await;
    assert!(h.sensor_publishes().is_empty());

    h.devices.reset().await;
    h.mount_device("/flaky", "fe:ed", "PurpleAir-feed").await;

    h.orchestrator.tick().await;
    assert_eq!(h.mqtt.published_to(&format!("{SENSOR_ROOT}/feed")).len(), 1);
}
