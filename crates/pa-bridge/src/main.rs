//! purpleair2mqtt: polls PurpleAir sensors over HTTP and republishes their
//! readings to an MQTT broker, with optional Home Assistant discovery.

use std::sync::Arc;

use pa_bridge::config::{self, AppConfig};
use pa_bridge::poller::SensorPoller;
use pa_bridge::{logging, orchestrator, signal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Load config ─────────────────────────────────────────────
    let config_path = config::resolve_path(
        std::env::var(config::CONFIG_FILE_ENV).ok(),
        std::env::args().nth(1),
    );
    let config = AppConfig::from_file(&config_path)?;

    // Keep the guard alive so buffered file output is flushed on exit.
    let _log_guard = logging::init(&config.logging)?;

    // Handlers are live from here on, including during connect and the first tick.
    let stop = signal::listen()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        "purpleair2mqtt starting"
    );
    tracing::info!(
        host = %config.mqtt.host,
        port = config.mqtt.port,
        client_id = %config.mqtt.client_id,
        status_topic = %config.mqtt.status_topic,
        sensor_topic_root = %config.mqtt.sensor_topic_root,
        targets = config.purple_air.urls.len(),
        refresh_interval_seconds = config.purple_air.refresh_interval_seconds,
        discovery_enabled = config.home_assistant.discovery_enabled,
        "config loaded"
    );
    if config.purple_air.urls.is_empty() {
        tracing::warn!("no PurpleAir URLs configured; only status will be published");
    }

    // ── Sensor poller ───────────────────────────────────────────
    let poller = SensorPoller::new(config.purple_air.clone(), config.home_assistant.clone())?;

    // ── Run until SIGINT/SIGTERM ────────────────────────────────
    orchestrator::connect_and_loop(&config.mqtt, false, Arc::new(poller), stop.wait()).await?;

    tracing::info!("purpleair2mqtt stopped");
    Ok(())
}
