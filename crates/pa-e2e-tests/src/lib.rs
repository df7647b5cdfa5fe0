//! End-to-end tests for purpleair2mqtt live under `tests/`.
//!
//! They wire the real orchestrator and sensor poller to a `MockChannel`
//! broker and wiremock-served PurpleAir devices.
