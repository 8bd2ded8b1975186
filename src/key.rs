//! Order-preserving event keys.
//!
//! A key is the event timestamp, truncated to a [`TimestampPrecision`], as
//! signed nanoseconds since the Unix epoch with the sign bit flipped and
//! written big-endian. Comparing two keys byte by byte therefore gives the
//! same answer as comparing their timestamps, which is what redb uses to
//! order `&[u8]` keys.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use derive_more::{From, Into};

use crate::errors::{EventStoreError, EventStoreResult};
use crate::utils::datetime::{EventTimestamp, TimestampPrecision};

const SIGN_BIT: u64 = 1 << 63;

/// Opaque, chronologically ordered handle addressing one stored event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
pub struct EventKey([u8; EventKey::LEN]);

impl EventKey {
    /// Encoded width of every key.
    pub const LEN: usize = 8;

    /// Derive the key for `timestamp` at the given precision.
    pub fn from_timestamp(
        timestamp: EventTimestamp,
        precision: TimestampPrecision,
    ) -> EventStoreResult<Self> {
        let nanos = precision
            .truncate(timestamp)
            .and_then(|truncated| truncated.timestamp_nanos_opt())
            .ok_or(EventStoreError::TimestampOutOfRange(timestamp))?;
        Ok(Self(((nanos as u64) ^ SIGN_BIT).to_be_bytes()))
    }

    /// Raw key bytes as stored in the backend.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The (already truncated) timestamp this key was derived from.
    pub fn timestamp(&self) -> EventTimestamp {
        let nanos = (u64::from_be_bytes(self.0) ^ SIGN_BIT) as i64;
        DateTime::<Utc>::from_timestamp_nanos(nanos)
    }
}

impl TryFrom<&[u8]> for EventKey {
    type Error = EventStoreError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let raw: [u8; EventKey::LEN] = bytes
            .try_into()
            .map_err(|_| EventStoreError::InvalidKey { found: bytes.len() })?;
        Ok(Self(raw))
    }
}

impl AsRef<[u8]> for EventKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.timestamp().to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use quickcheck::{QuickCheck, TestResult};

    fn at(secs: i64, nanos: u32) -> EventTimestamp {
        Utc.timestamp_opt(secs, nanos).unwrap()
    }

    #[test]
    fn test_key_roundtrips_to_truncated_timestamp() {
        let ts = at(1_700_000_000, 987_654_321);
        let key = EventKey::from_timestamp(ts, TimestampPrecision::Millis).unwrap();
        assert_eq!(key.timestamp(), at(1_700_000_000, 987_000_000));

        let key = EventKey::from_timestamp(ts, TimestampPrecision::Nanos).unwrap();
        assert_eq!(key.timestamp(), ts);
    }

    #[test]
    fn test_keys_order_across_epoch() {
        let precision = TimestampPrecision::Nanos;
        let before = EventKey::from_timestamp(at(-1, 0), precision).unwrap();
        let epoch = EventKey::from_timestamp(at(0, 0), precision).unwrap();
        let after = EventKey::from_timestamp(at(1, 0), precision).unwrap();

        assert!(before.as_bytes() < epoch.as_bytes());
        assert!(epoch.as_bytes() < after.as_bytes());
        assert!(before < after);
    }

    #[test]
    fn test_same_second_collides_at_seconds_precision() {
        let a = EventKey::from_timestamp(at(100, 1), TimestampPrecision::Seconds).unwrap();
        let b = EventKey::from_timestamp(at(100, 999_999_999), TimestampPrecision::Seconds)
            .unwrap();
        assert_eq!(a, b);

        let a = EventKey::from_timestamp(at(100, 1_000_000), TimestampPrecision::Millis).unwrap();
        let b = EventKey::from_timestamp(at(100, 2_000_000), TimestampPrecision::Millis).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_out_of_range_timestamp_is_rejected() {
        let far_future = at(i64::from(i32::MAX) * 10, 0);
        let err = EventKey::from_timestamp(far_future, TimestampPrecision::Seconds).unwrap_err();
        assert!(matches!(err, EventStoreError::TimestampOutOfRange(_)));
    }

    #[test]
    fn test_try_from_slice() {
        let key = EventKey::from_timestamp(at(42, 0), TimestampPrecision::Seconds).unwrap();
        let parsed = EventKey::try_from(key.as_bytes()).unwrap();
        assert_eq!(parsed, key);

        let err = EventKey::try_from(&[1u8, 2, 3][..]).unwrap_err();
        assert!(matches!(err, EventStoreError::InvalidKey { found: 3 }));
    }

    #[test]
    fn test_display_is_rfc3339() {
        let key = EventKey::from_timestamp(at(0, 0), TimestampPrecision::Seconds).unwrap();
        assert_eq!(key.to_string(), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn prop_byte_order_matches_time_order() {
        fn prop(a_secs: i32, a_nanos: u32, b_secs: i32, b_nanos: u32) -> TestResult {
            let a = at(i64::from(a_secs), a_nanos % 1_000_000_000);
            let b = at(i64::from(b_secs), b_nanos % 1_000_000_000);
            let ka = EventKey::from_timestamp(a, TimestampPrecision::Nanos).unwrap();
            let kb = EventKey::from_timestamp(b, TimestampPrecision::Nanos).unwrap();
            TestResult::from_bool(a.cmp(&b) == ka.as_bytes().cmp(kb.as_bytes()))
        }
        QuickCheck::new().quickcheck(prop as fn(i32, u32, i32, u32) -> TestResult);
    }
}
