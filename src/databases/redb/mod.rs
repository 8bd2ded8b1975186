//! Redb-backed event store.
//!
//! [`EventStore`] owns the redb file for its whole lifetime. Every public
//! operation is a single redb transaction; redb serialises writers and lets
//! readers run concurrently, so the store adds no locking of its own and can
//! be shared between threads behind an `Arc`.
//!
//! ```rust,no_run
//! use eventstore::prelude::*;
//! use chrono::Utc;
//!
//! let store = EventStore::open("events.db")?;
//! store.add(&Event::new(Utc::now(), "audioBait", r#"{"fileId":"bird2"}"#))?;
//!
//! for key in store.get_keys()? {
//!     let event = store.get_event(&key)?;
//!     // ... deliver `event`, then:
//!     store.delete(&key)?;
//! }
//! store.close()?;
//! # Ok::<(), eventstore::errors::EventStoreError>(())
//! ```

pub mod migration;
pub mod tables;

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata};

use crate::codec;
use crate::config::StoreConfig;
use crate::errors::{EventStoreError, EventStoreResult};
use crate::event::Event;
use crate::key::EventKey;
use crate::utils::datetime::{EventTimestamp, TimestampPrecision};

pub use migration::{LegacyState, MigrationReport};
pub use tables::SchemaMeta;
use tables::{CURRENT_EVENTS, LEGACY_EVENTS, STORE_META};

/// Durable event queue over a single redb file.
pub struct EventStore {
    db: Database,
    path: PathBuf,
    precision: TimestampPrecision,
    last_migration: MigrationReport,
}

impl EventStore {
    /// Open or create the store at `path` with default settings.
    pub fn open<P: AsRef<Path>>(path: P) -> EventStoreResult<Self> {
        Self::open_with_config(StoreConfig::new(path.as_ref()))
    }

    /// Open or create the store, initialise its tables and migrate any
    /// legacy records before returning.
    pub fn open_with_config(config: StoreConfig) -> EventStoreResult<Self> {
        let StoreConfig {
            path,
            precision,
            create_parent_dirs,
            cache_size_bytes,
        } = config;

        if create_parent_dirs {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .map_err(|e| EventStoreError::backend_open(&path, e))?;
            }
        }

        let mut builder = Database::builder();
        if let Some(bytes) = cache_size_bytes {
            builder.set_cache_size(bytes);
        }
        let db = builder
            .create(&path)
            .map_err(|e| EventStoreError::backend_open(&path, e))?;
        info!("opened event store at {}", path.display());

        // An initialised store without legacy records reopens without a write.
        let (needs_init, legacy_state) = {
            let txn = db.begin_read()?;
            (
                tables::needs_init(&txn)?,
                migration::peek_legacy_state(&txn)?,
            )
        };
        if needs_init {
            let txn = db.begin_write()?;
            tables::init_tables(&txn)?;
            txn.commit()?;
        }

        let last_migration = match legacy_state {
            LegacyState::LegacyBucketHasRecords(_) => Self::run_migration(&db)?,
            state => {
                debug!("no legacy events to migrate ({state:?})");
                MigrationReport::noop(state)
            }
        };

        Ok(Self {
            db,
            path,
            precision,
            last_migration,
        })
    }

    fn run_migration(db: &Database) -> EventStoreResult<MigrationReport> {
        let txn = db.begin_write()?;
        match migration::migrate_legacy(&txn) {
            Ok(report) if report.wrote() => {
                txn.commit()?;
                Ok(report)
            }
            Ok(report) => {
                debug!("no legacy events to migrate ({:?})", report.state);
                txn.abort()?;
                Ok(report)
            }
            Err(e) => {
                if let Err(abort_err) = txn.abort() {
                    warn!("failed to abort legacy migration: {abort_err}");
                }
                Err(e)
            }
        }
    }

    /// Release the backend file.
    pub fn close(self) -> EventStoreResult<()> {
        let Self { db, path, .. } = self;
        drop(db);
        info!("closed event store at {}", path.display());
        Ok(())
    }

    /// The key `event` is (or would be) stored under.
    pub fn key_for(&self, event: &Event) -> EventStoreResult<EventKey> {
        EventKey::from_timestamp(event.timestamp, self.precision)
    }

    /// Store `event` in the current schema, replacing any record with the
    /// same key.
    pub fn add(&self, event: &Event) -> EventStoreResult<EventKey> {
        let key = self.key_for(event)?;
        let bytes = codec::encode(event)?;

        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(CURRENT_EVENTS)?;
            table.insert(key.as_bytes(), bytes.as_slice())?;
        }
        txn.commit()?;

        debug!("added {} event at {key}", event.event_type());
        Ok(key)
    }

    /// Write an already-encoded legacy payload into the legacy table.
    ///
    /// The key is derived at whole-second precision, as legacy producers did.
    /// The record is picked up by the migration on the next open.
    pub fn queue(&self, raw: &[u8], timestamp: EventTimestamp) -> EventStoreResult<EventKey> {
        let key = EventKey::from_timestamp(timestamp, TimestampPrecision::LEGACY)?;

        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(LEGACY_EVENTS)?;
            table.insert(key.as_bytes(), raw)?;
        }
        txn.commit()?;

        debug!("queued legacy event at {key}");
        Ok(key)
    }

    /// Raw current-schema bytes stored under `key`.
    pub fn get(&self, key: &EventKey) -> EventStoreResult<Vec<u8>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(CURRENT_EVENTS)?;
        let guard = table
            .get(key.as_bytes())?
            .ok_or(EventStoreError::NotFound(*key))?;
        Ok(guard.value().to_vec())
    }

    /// Decoded event stored under `key`.
    pub fn get_event(&self, key: &EventKey) -> EventStoreResult<Event> {
        codec::decode(&self.get(key)?)
    }

    /// All current keys in ascending (chronological) order.
    pub fn get_keys(&self) -> EventStoreResult<Vec<EventKey>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(CURRENT_EVENTS)?;
        let keys = table
            .iter()?
            .map(|entry| -> EventStoreResult<EventKey> {
                let (key, _) = entry?;
                EventKey::try_from(key.value())
            })
            .collect::<EventStoreResult<Vec<_>>>()?;
        Ok(keys)
    }

    /// Remove the record under `key`. Returns whether one existed; a missing
    /// key is not an error.
    pub fn delete(&self, key: &EventKey) -> EventStoreResult<bool> {
        let txn = self.db.begin_write()?;
        let existed = {
            let mut table = txn.open_table(CURRENT_EVENTS)?;
            table.remove(key.as_bytes())?.is_some()
        };
        txn.commit()?;

        debug!("deleted event at {key} (existed: {existed})");
        Ok(existed)
    }

    /// Timestamps still waiting in the legacy table, ascending.
    ///
    /// Empty once the migration has run.
    pub fn legacy_timestamps(&self) -> EventStoreResult<Vec<EventTimestamp>> {
        let txn = self.db.begin_read()?;
        let table = match txn.open_table(LEGACY_EVENTS) {
            Ok(table) => table,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let timestamps = table
            .iter()?
            .map(|entry| -> EventStoreResult<EventTimestamp> {
                let (key, _) = entry?;
                Ok(EventKey::try_from(key.value())?.timestamp())
            })
            .collect::<EventStoreResult<Vec<_>>>()?;
        Ok(timestamps)
    }

    /// Number of records in the current table.
    pub fn len(&self) -> EventStoreResult<u64> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(CURRENT_EVENTS)?;
        Ok(table.len()?)
    }

    pub fn is_empty(&self) -> EventStoreResult<bool> {
        Ok(self.len()? == 0)
    }

    pub fn schema_meta(&self) -> EventStoreResult<SchemaMeta> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(STORE_META)?;
        tables::read_meta(&table)
    }

    /// What the migration did when this store was opened.
    pub fn last_migration(&self) -> &MigrationReport {
        &self.last_migration
    }

    /// Compact the database to reclaim space
    pub fn compact(&mut self) -> EventStoreResult<bool> {
        Ok(self.db.compact()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn precision(&self) -> TimestampPrecision {
        self.precision
    }
}

impl std::fmt::Debug for EventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStore")
            .field("path", &self.path)
            .field("precision", &self.precision)
            .field("last_migration", &self.last_migration)
            .finish_non_exhaustive()
    }
}
