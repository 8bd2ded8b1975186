//! redb table definitions and schema metadata.

use redb::{ReadTransaction, ReadableTable, TableDefinition, TableError, TableHandle, WriteTransaction};

use crate::errors::{EventStoreError, EventStoreResult};

// Key: EventKey bytes, Value: legacy JSON payload, written verbatim by `queue`
pub const LEGACY_EVENTS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("events");

// Key: EventKey bytes, Value: current-schema JSON record
pub const CURRENT_EVENTS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("event_records");

// Key: metadata name, Value: bincode-encoded metadata record
pub const STORE_META: TableDefinition<&str, &[u8]> = TableDefinition::new("store_meta");

const SCHEMA_META_KEY: &str = "schema";

/// Version of the layout in `CURRENT_EVENTS`. Version 1 is the legacy table.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Bookkeeping about the on-disk schema and the migrations applied to it.
#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct SchemaMeta {
    pub schema_version: u32,
    /// Number of migrations that converted at least one record.
    pub migrations_applied: u32,
    /// Total legacy records converted over the file's lifetime.
    pub records_migrated: u64,
    /// Unix millis of the most recent migration.
    pub last_migration_millis: Option<i64>,
}

impl Default for SchemaMeta {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            migrations_applied: 0,
            records_migrated: 0,
            last_migration_millis: None,
        }
    }
}

impl SchemaMeta {
    pub(crate) fn to_bytes(&self) -> EventStoreResult<Vec<u8>> {
        Ok(bincode::encode_to_vec(self, bincode::config::standard())?)
    }

    pub(crate) fn from_bytes(bytes: &[u8]) -> EventStoreResult<Self> {
        let (meta, _) = bincode::decode_from_slice(bytes, bincode::config::standard())?;
        Ok(meta)
    }
}

/// Whether `definition` names a table that already exists in `txn`.
///
/// Opening a table inside a write transaction creates it, so existence has
/// to be checked against the table listing instead.
pub(crate) fn table_exists<K, V>(
    txn: &WriteTransaction,
    definition: TableDefinition<'_, K, V>,
) -> EventStoreResult<bool>
where
    K: redb::Key + 'static,
    V: redb::Value + 'static,
{
    let name = definition.name();
    Ok(txn.list_tables()?.any(|handle| handle.name() == name))
}

/// Create the current and metadata tables, seeding the schema record.
pub(crate) fn init_tables(txn: &WriteTransaction) -> EventStoreResult<()> {
    txn.open_table(CURRENT_EVENTS)?;
    let mut meta = txn.open_table(STORE_META)?;
    if meta.get(SCHEMA_META_KEY)?.is_none() {
        let bytes = SchemaMeta::default().to_bytes()?;
        meta.insert(SCHEMA_META_KEY, bytes.as_slice())?;
    }
    Ok(())
}

/// Whether [`init_tables`] still has anything to create.
///
/// Runs in a read transaction, so an initialised store can be reopened
/// without starting a write.
pub(crate) fn needs_init(txn: &ReadTransaction) -> EventStoreResult<bool> {
    match txn.open_table(CURRENT_EVENTS) {
        Ok(_) => {}
        Err(TableError::TableDoesNotExist(_)) => return Ok(true),
        Err(e) => return Err(e.into()),
    }
    match txn.open_table(STORE_META) {
        Ok(meta) => Ok(meta.get(SCHEMA_META_KEY)?.is_none()),
        Err(TableError::TableDoesNotExist(_)) => Ok(true),
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn read_meta<T>(table: &T) -> EventStoreResult<SchemaMeta>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let guard = table
        .get(SCHEMA_META_KEY)?
        .ok_or(EventStoreError::MissingSchemaMeta)?;
    SchemaMeta::from_bytes(guard.value())
}

pub(crate) fn write_meta(txn: &WriteTransaction, meta: &SchemaMeta) -> EventStoreResult<()> {
    let mut table = txn.open_table(STORE_META)?;
    let bytes = meta.to_bytes()?;
    table.insert(SCHEMA_META_KEY, bytes.as_slice())?;
    Ok(())
}
