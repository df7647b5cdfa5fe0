//! Errors raised while interpreting PurpleAir device responses.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid sensor JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("sensor response is not a JSON object")]
    NotAnObject,

    #[error("sensor response has no string `SensorId` field")]
    MissingSensorId,
}

/// Convenience alias for protocol results.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
