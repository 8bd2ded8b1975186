//! JSON codec for stored events.
//!
//! Current records are self-describing JSON objects:
//!
//! ```json
//! {"timestamp":"2024-05-01T10:00:00Z","description":{"type":"audioBait","details":"{...}"}}
//! ```
//!
//! Legacy records are `{"description":{"type":...,"details":{...}}}` and get
//! their timestamp from the key they are stored under.

use crate::errors::{EventStoreError, EventStoreResult};
use crate::event::{Event, LegacyEvent};
use crate::key::EventKey;

/// Serialize an event in the current schema.
pub fn encode(event: &Event) -> EventStoreResult<Vec<u8>> {
    serde_json::to_vec(event).map_err(EventStoreError::Encoding)
}

/// Deserialize a current-schema record.
pub fn decode(bytes: &[u8]) -> EventStoreResult<Event> {
    serde_json::from_slice(bytes).map_err(EventStoreError::MalformedRecord)
}

/// Deserialize a legacy record stored under `key`.
pub fn decode_legacy(key: &EventKey, bytes: &[u8]) -> EventStoreResult<Event> {
    let malformed = |reason: String| EventStoreError::MalformedLegacyRecord {
        key: key.to_string(),
        reason,
    };
    let legacy: LegacyEvent =
        serde_json::from_slice(bytes).map_err(|e| malformed(e.to_string()))?;
    legacy
        .into_event(key.timestamp())
        .map_err(|e| malformed(e.to_string()))
}

/// Convert a legacy record straight into current-schema bytes.
pub fn reencode_legacy(key: &EventKey, bytes: &[u8]) -> EventStoreResult<Vec<u8>> {
    encode(&decode_legacy(key, bytes)?)
}
