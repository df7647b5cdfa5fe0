//! Decoding of inbound MQTT payloads before they reach a processor.
//!
//! Processors choose per topic whether they want parsed JSON or the raw
//! bytes; a payload that fails to decode is reported so the caller can
//! drop it.

use thiserror::Error;

/// Payload handed to a processor.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundPayload {
    /// UTF-8 JSON, parsed.
    Json(serde_json::Value),
    /// Bytes exactly as received.
    Raw(Vec<u8>),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("payload is not JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode `payload` as UTF-8 JSON when `wants_json`, else pass it through.
pub fn decode(payload: &[u8], wants_json: bool) -> Result<InboundPayload, DecodeError> {
    if !wants_json {
        return Ok(InboundPayload::Raw(payload.to_vec()));
    }
    let text = std::str::from_utf8(payload)?;
    Ok(InboundPayload::Json(serde_json::from_str(text)?))
}
