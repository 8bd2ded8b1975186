// Common test utilities and helpers
#![allow(dead_code)]

use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};
use eventstore::prelude::*;
use serde_json::{Map, Value};
use tempfile::TempDir;

/// Route library logging to the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A temporary directory holding a store file that is removed on drop.
pub struct TestDb {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl TestDb {
    pub fn new() -> Self {
        init_logging();
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("store.db");
        Self { dir, path }
    }

    pub fn open(&self) -> EventStore {
        EventStore::open(&self.path).expect("open store")
    }

    pub fn open_with(&self, precision: TimestampPrecision) -> EventStore {
        EventStore::open_with_config(StoreConfig::new(&self.path).with_precision(precision))
            .expect("open store")
    }
}

/// Whole-second timestamp, like the legacy producers used.
pub fn at_secs(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub fn details(value: Value) -> Map<String, Value> {
    serde_json::from_value(value).expect("details must be a JSON object")
}

/// Encode a legacy payload the way old producers wrote it.
pub fn legacy_payload(event_type: &str, value: Value) -> Vec<u8> {
    LegacyEvent::new(event_type, details(value))
        .to_bytes()
        .expect("encode legacy payload")
}
