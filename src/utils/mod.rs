//! Utility modules for eventstore
//!
//! Time handling shared by key derivation and configuration.

pub mod datetime;

pub use datetime::{EventTimestamp, EventTimestampExt, TimestampPrecision};
