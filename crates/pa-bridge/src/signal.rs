//! Process stop signal.
//!
//! [`listen`] registers the SIGINT/SIGTERM handlers immediately, before the
//! first tick, so a signal arriving at any point after startup leads to the
//! ordered teardown instead of the default disposition.

use tokio::sync::watch;

/// Requests a stop.
pub struct StopTrigger {
    tx: watch::Sender<bool>,
}

impl StopTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

/// Resolves once a stop has been requested.
#[derive(Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for the stop request. A dropped trigger counts as a stop.
    pub async fn wait(mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

pub fn channel() -> (StopTrigger, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopTrigger { tx }, StopSignal { rx })
}

/// Install SIGINT and SIGTERM handlers and return the signal they trigger.
/// Must be called inside the runtime.
#[cfg(unix)]
pub fn listen() -> std::io::Result<StopSignal> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let (trigger, stop) = channel();

    tokio::spawn(async move {
        let name = tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
        };
        tracing::info!(signal = name, "shutdown signal received");
        trigger.trigger();
    });
    Ok(stop)
}

/// Install the Ctrl-C handler and return the signal it triggers.
#[cfg(not(unix))]
pub fn listen() -> std::io::Result<StopSignal> {
    let (trigger, stop) = channel();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("shutdown signal received");
                trigger.trigger();
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        }
    });
    Ok(stop)
}
