//! purpleair2mqtt: library crate for the PurpleAir to MQTT bridge.
//!
//! Re-exports all modules so external crates (e.g. `pa-e2e-tests`) can
//! drive the orchestrator and poller against mock transports.

pub mod config;
pub mod logging;
pub mod orchestrator;
pub mod poller;
pub mod processor;
pub mod signal;
