//! Legacy schema migration for redb.
//!
//! Stores written by older producers keep events in the `events` table in
//! the bare legacy shape. On every open the store checks for that table and,
//! if it holds records, converts all of them into `event_records` inside the
//! open's write transaction, then drops the legacy table.
//!
//! The conversion itself ([`plan_migration`]) is a pure function over the raw
//! legacy entries so it can be tested without a database. The executor
//! ([`migrate_legacy`]) is all-or-nothing: a single bad record fails the
//! whole run and the caller aborts the transaction, leaving the legacy table
//! as it was for a later retry.

use log::{info, warn};
use redb::{ReadTransaction, ReadableTable, ReadableTableMetadata, TableError, WriteTransaction};

use super::tables::{self, CURRENT_EVENTS, LEGACY_EVENTS, STORE_META};
use crate::codec;
use crate::errors::{EventStoreError, EventStoreResult};
use crate::key::EventKey;

/// What the migration found in the legacy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyState {
    NoLegacyBucket,
    LegacyBucketEmpty,
    LegacyBucketHasRecords(u64),
}

/// A legacy record that could not be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFailure {
    /// Printable key: the key timestamp, or the raw bytes if the key is invalid.
    pub key: String,
    pub reason: String,
}

impl From<MigrationFailure> for EventStoreError {
    fn from(failure: MigrationFailure) -> Self {
        EventStoreError::MalformedLegacyRecord {
            key: failure.key,
            reason: failure.reason,
        }
    }
}

/// Outcome of converting a batch of legacy entries.
#[derive(Debug, Clone, Default)]
pub struct MigrationPlan {
    /// Current-schema records keyed by their original legacy key.
    pub converted: Vec<(EventKey, Vec<u8>)>,
    pub failures: Vec<MigrationFailure>,
}

impl MigrationPlan {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of one migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub state: LegacyState,
    pub records_migrated: usize,
}

impl MigrationReport {
    pub(crate) fn noop(state: LegacyState) -> Self {
        Self {
            state,
            records_migrated: 0,
        }
    }

    /// Whether the run wrote anything.
    pub fn wrote(&self) -> bool {
        self.records_migrated > 0
    }
}

/// Convert raw legacy `(key, value)` entries into current-schema records.
pub fn plan_migration<I>(entries: I) -> MigrationPlan
where
    I: IntoIterator<Item = (Vec<u8>, Vec<u8>)>,
{
    let mut plan = MigrationPlan::default();
    for (raw_key, value) in entries {
        let key = match EventKey::try_from(raw_key.as_slice()) {
            Ok(key) => key,
            Err(e) => {
                plan.failures.push(MigrationFailure {
                    key: format!("{raw_key:?}"),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        match codec::reencode_legacy(&key, &value) {
            Ok(bytes) => plan.converted.push((key, bytes)),
            Err(e) => plan.failures.push(MigrationFailure {
                key: key.to_string(),
                reason: match e {
                    EventStoreError::MalformedLegacyRecord { reason, .. } => reason,
                    other => other.to_string(),
                },
            }),
        }
    }
    plan
}

/// Inspect the legacy table without creating it.
pub fn detect_legacy_state(txn: &WriteTransaction) -> EventStoreResult<LegacyState> {
    if !tables::table_exists(txn, LEGACY_EVENTS)? {
        return Ok(LegacyState::NoLegacyBucket);
    }
    let legacy = txn.open_table(LEGACY_EVENTS)?;
    Ok(match legacy.len()? {
        0 => LegacyState::LegacyBucketEmpty,
        n => LegacyState::LegacyBucketHasRecords(n),
    })
}

/// Inspect the legacy table from a read transaction.
pub fn peek_legacy_state(txn: &ReadTransaction) -> EventStoreResult<LegacyState> {
    let legacy = match txn.open_table(LEGACY_EVENTS) {
        Ok(table) => table,
        Err(TableError::TableDoesNotExist(_)) => return Ok(LegacyState::NoLegacyBucket),
        Err(e) => return Err(e.into()),
    };
    Ok(match legacy.len()? {
        0 => LegacyState::LegacyBucketEmpty,
        n => LegacyState::LegacyBucketHasRecords(n),
    })
}

/// Move every legacy record into the current table within `txn`.
///
/// Performs no writes unless the legacy table holds records. On error the
/// caller must abort `txn`; nothing has been committed.
pub fn migrate_legacy(txn: &WriteTransaction) -> EventStoreResult<MigrationReport> {
    let state = detect_legacy_state(txn)?;
    if !matches!(state, LegacyState::LegacyBucketHasRecords(_)) {
        return Ok(MigrationReport::noop(state));
    }

    let entries = {
        let legacy = txn.open_table(LEGACY_EVENTS)?;
        legacy
            .iter()?
            .map(|entry| entry.map(|(k, v)| (k.value().to_vec(), v.value().to_vec())))
            .collect::<Result<Vec<_>, _>>()?
    };

    let plan = plan_migration(entries);
    if let Some(first) = plan.failures.first() {
        for failure in &plan.failures {
            warn!(
                "legacy record {} cannot be migrated: {}",
                failure.key, failure.reason
            );
        }
        warn!(
            "aborting legacy migration, {} record(s) failed",
            plan.failures.len()
        );
        return Err(first.clone().into());
    }

    let migrated = plan.converted.len();
    {
        let mut current = txn.open_table(CURRENT_EVENTS)?;
        for (key, bytes) in &plan.converted {
            current.insert(key.as_bytes(), bytes.as_slice())?;
        }
    }
    txn.delete_table(LEGACY_EVENTS)?;

    let mut meta = {
        let table = txn.open_table(STORE_META)?;
        tables::read_meta(&table)?
    };
    meta.migrations_applied += 1;
    meta.records_migrated += migrated as u64;
    meta.last_migration_millis = Some(chrono::Utc::now().timestamp_millis());
    tables::write_meta(txn, &meta)?;

    info!("migrated {migrated} legacy event(s) into the current schema");
    Ok(MigrationReport { state, records_migrated: migrated })
}
