//! Store configuration.
//!
//! Built with `typed-builder`; only the path is required.

use std::path::PathBuf;
use typed_builder::TypedBuilder;

use crate::utils::datetime::TimestampPrecision;

/// Configuration for an [`EventStore`](crate::databases::redb::EventStore).
///
/// # Examples
///
/// ```
/// use eventstore::config::StoreConfig;
/// use eventstore::utils::TimestampPrecision;
///
/// // Create with defaults
/// let config = StoreConfig::builder()
///     .path("events.db")
///     .build();
/// assert_eq!(config.precision, TimestampPrecision::Millis);
///
/// // Customize options
/// let config = StoreConfig::builder()
///     .path("/var/lib/reporter/events.db")
///     .precision(TimestampPrecision::Seconds)
///     .cache_size_bytes(Some(4 * 1024 * 1024))
///     .build();
/// ```
#[derive(Debug, Clone, TypedBuilder)]
#[builder(doc)]
pub struct StoreConfig {
    /// Path to the database file
    #[builder(setter(into))]
    pub path: PathBuf,

    /// Precision used when deriving keys for `add`
    #[builder(default)]
    pub precision: TimestampPrecision,

    /// Whether to create missing parent directories
    #[builder(default = true)]
    pub create_parent_dirs: bool,

    /// Page cache size handed to redb; `None` keeps redb's default
    #[builder(default = None)]
    pub cache_size_bytes: Option<usize>,
}

impl StoreConfig {
    /// Create a basic configuration with just a path
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            precision: TimestampPrecision::default(),
            create_parent_dirs: true,
            cache_size_bytes: None,
        }
    }

    pub fn with_precision(mut self, precision: TimestampPrecision) -> Self {
        self.precision = precision;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_matches_builder_defaults() {
        let built = StoreConfig::builder().path("a.db").build();
        let plain = StoreConfig::new("a.db");
        assert_eq!(built.path, plain.path);
        assert_eq!(built.precision, plain.precision);
        assert_eq!(built.create_parent_dirs, plain.create_parent_dirs);
        assert_eq!(built.cache_size_bytes, plain.cache_size_bytes);
    }

    #[test]
    fn test_with_precision() {
        let config = StoreConfig::new("a.db").with_precision(TimestampPrecision::Nanos);
        assert_eq!(config.precision, TimestampPrecision::Nanos);
    }
}
