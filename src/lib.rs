//! # eventstore
//!
//! An embedded, crash-safe queue of events waiting to be delivered to a
//! remote API, kept in a single redb file.
//!
//! ## Features
//!
//! - **Ordered keys**: events are keyed by timestamp; keys sort
//!   chronologically as raw bytes
//! - **Transactions**: every add/get/delete/list is one redb transaction
//! - **Legacy migration**: records written by older producers are converted
//!   into the current schema on open, all-or-nothing and idempotently
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use eventstore::prelude::*;
//! use chrono::Utc;
//!
//! let store = EventStore::open("events.db")?;
//! let event = Event::new(Utc::now(), "audioBait", r#"{"fileId":"bird2","volume":"2"}"#);
//! let key = store.add(&event)?;
//!
//! let bytes = store.get(&key)?;
//! store.delete(&key)?;
//! # let _ = bytes;
//! # Ok::<(), eventstore::errors::EventStoreError>(())
//! ```

pub mod codec;
pub mod config;
pub mod databases;
pub mod errors;
pub mod event;
pub mod key;
pub mod prelude;
pub mod utils;

pub use databases::redb::EventStore;
pub use errors::{EventStoreError, EventStoreResult};
