use std::path::PathBuf;

use thiserror::Error;

use crate::key::EventKey;
use crate::utils::datetime::EventTimestamp;

pub type EventStoreResult<T> = Result<T, EventStoreError>;

#[derive(Error, Debug)]
pub enum EventStoreError {
    #[error("Backend Open Error: cannot open {}: {source}", .path.display())]
    BackendOpen {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Malformed Record: {0}")]
    MalformedRecord(#[source] serde_json::Error),

    #[error("Malformed Legacy Record at {key}: {reason}")]
    MalformedLegacyRecord { key: String, reason: String },

    #[error("Not Found: no event stored under key {0}")]
    NotFound(EventKey),

    #[error("Invalid Key: expected {} bytes, found {found}", EventKey::LEN)]
    InvalidKey { found: usize },

    #[error("Timestamp Out Of Range: {0} cannot be encoded as an event key")]
    TimestampOutOfRange(EventTimestamp),

    #[error("Encoding Error: {0}")]
    Encoding(#[source] serde_json::Error),

    #[error("Schema Meta Encode Error: {0}")]
    MetaEncode(#[from] bincode::error::EncodeError),

    #[error("Schema Meta Decode Error: {0}")]
    MetaDecode(#[from] bincode::error::DecodeError),

    #[error("Schema Meta Missing")]
    MissingSchemaMeta,

    #[error("Redb Transaction Error: {0}")]
    RedbTransactionError(#[from] redb::TransactionError),

    #[error("Redb Storage Error: {0}")]
    RedbStorageError(#[from] redb::StorageError),

    #[error("Redb Table Error: {0}")]
    RedbTableError(#[from] redb::TableError),

    #[error("Redb Commit Error: {0}")]
    RedbCommitError(#[from] redb::CommitError),

    #[error("Redb Compaction Error: {0}")]
    RedbCompactionError(#[from] redb::CompactionError),
}

impl EventStoreError {
    pub(crate) fn backend_open(
        path: impl Into<PathBuf>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::BackendOpen {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Whether the error only reports an absent key.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
