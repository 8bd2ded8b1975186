//! Event records, current and legacy.
//!
//! The two schemas disagree about `details`: legacy producers wrote a JSON
//! object, the current schema carries an opaque, already-serialized string
//! that the store never interprets. Both shapes are kept as separate types so
//! the conversion stays explicit (see [`LegacyEvent::into_event`]).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::utils::datetime::EventTimestamp;

/// The durable unit of the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Event {
    pub timestamp: EventTimestamp,
    pub description: EventDescription,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventDescription {
    /// Short tag naming the kind of event, e.g. `audioBait`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Pass-through payload for the delivery side.
    pub details: String,
}

impl Event {
    pub fn new(
        timestamp: EventTimestamp,
        event_type: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            description: EventDescription {
                event_type: event_type.into(),
                details: details.into(),
            },
        }
    }

    /// Build an event whose details are the serialization of a JSON value.
    pub fn with_json_details(
        timestamp: EventTimestamp,
        event_type: impl Into<String>,
        details: &Value,
    ) -> serde_json::Result<Self> {
        Ok(Self::new(timestamp, event_type, serde_json::to_string(details)?))
    }

    pub fn event_type(&self) -> &str {
        &self.description.event_type
    }

    pub fn details(&self) -> &str {
        &self.description.details
    }

    /// Parse the opaque details back into JSON.
    pub fn details_value(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.description.details)
    }
}

/// Pre-migration record: no timestamp (that lives in the key) and
/// structured details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyEvent {
    pub description: LegacyDescription,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyDescription {
    #[serde(rename = "type")]
    pub event_type: String,
    /// Absent and `null` both read as an empty map.
    #[serde(default, deserialize_with = "null_as_empty_map")]
    pub details: Map<String, Value>,
}

fn null_as_empty_map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl LegacyEvent {
    pub fn new(event_type: impl Into<String>, details: Map<String, Value>) -> Self {
        Self {
            description: LegacyDescription {
                event_type: event_type.into(),
                details,
            },
        }
    }

    /// Serialize in the legacy wire shape, as accepted by `EventStore::queue`.
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Convert into the current schema, flattening details to their
    /// canonical (key-sorted) serialization.
    pub fn into_event(self, timestamp: EventTimestamp) -> serde_json::Result<Event> {
        let details = serde_json::to_string(&self.description.details)?;
        Ok(Event::new(timestamp, self.description.event_type, details))
    }
}
