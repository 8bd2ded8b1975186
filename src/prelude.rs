//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use eventstore::prelude::*;
//! ```

pub use crate::config::StoreConfig;
pub use crate::databases::redb::{EventStore, LegacyState, MigrationReport, SchemaMeta};
pub use crate::errors::{EventStoreError, EventStoreResult};
pub use crate::event::{Event, EventDescription, LegacyEvent};
pub use crate::key::EventKey;
pub use crate::utils::datetime::{EventTimestamp, EventTimestampExt, TimestampPrecision};
