//! DateTime utilities for event timestamps
//!
//! Events are stamped with a `DateTime<Utc>`. Before a timestamp becomes a
//! key it is truncated to a [`TimestampPrecision`]; the legacy write path
//! always truncates to whole seconds, the current one uses whatever the store
//! was configured with.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Type alias for the timestamp carried by every event.
pub type EventTimestamp = DateTime<Utc>;

/// Sub-second precision kept when deriving keys from timestamps.
///
/// Coarser precisions make key collisions (and therefore silent overwrites)
/// more likely for events recorded close together.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TimestampPrecision {
    Seconds,
    #[default]
    Millis,
    Micros,
    Nanos,
}

impl TimestampPrecision {
    /// Precision used by the legacy write path.
    pub const LEGACY: TimestampPrecision = TimestampPrecision::Seconds;

    /// Width of one precision step in nanoseconds.
    pub fn step_nanos(self) -> u32 {
        match self {
            TimestampPrecision::Seconds => 1_000_000_000,
            TimestampPrecision::Millis => 1_000_000,
            TimestampPrecision::Micros => 1_000,
            TimestampPrecision::Nanos => 1,
        }
    }

    /// Truncate `timestamp` down to this precision.
    ///
    /// A fraction inside a leap second floors within that leap second.
    /// Returns `None` if chrono cannot represent the floored instant.
    pub fn truncate(self, timestamp: EventTimestamp) -> Option<EventTimestamp> {
        let step = self.step_nanos();
        let nanos = timestamp.nanosecond();
        // The fraction is never negative, so this always floors towards the past.
        DateTime::from_timestamp(timestamp.timestamp(), nanos - nanos % step)
    }
}

/// Helper trait for creating event timestamps
pub trait EventTimestampExt {
    /// Current UTC time truncated to `precision`.
    fn now_with(precision: TimestampPrecision) -> Option<Self>
    where
        Self: Sized;
}

impl EventTimestampExt for EventTimestamp {
    fn now_with(precision: TimestampPrecision) -> Option<Self> {
        precision.truncate(Utc::now())
    }
}
