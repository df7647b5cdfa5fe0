//! Availability payloads published on the bridge status topic.

/// Retained on the status topic after a successful connect.
pub const ONLINE: &str = "online";

/// Retained on the status topic by the last will and on clean shutdown.
pub const OFFLINE: &str = "offline";
