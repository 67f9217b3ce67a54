//! Environment-driven settings for the search indexer.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use search_indexer_repository::config::{DEFAULT_BACKOFF_UNIT, DEFAULT_MAX_ATTEMPTS};
use search_indexer_repository::opensearch::IndexConfig;
use search_indexer_repository::BatchIndexingConfig;

use crate::IndexingError;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default target index.
const DEFAULT_OPENSEARCH_INDEX: &str = "documents";

/// Default request timeout in seconds.
const DEFAULT_OPENSEARCH_TIMEOUT_SECS: u64 = 60;

/// Default number of operations the command line sends per batch.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerSettings {
    pub opensearch_url: String,
    pub opensearch_username: Option<String>,
    pub opensearch_password: Option<String>,
    pub index: IndexConfig,
    pub batching: BatchIndexingConfig,
    /// File holding the activity completion marker, if activity tracking is enabled.
    pub activity_status_path: Option<PathBuf>,
}

impl IndexerSettings {
    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_USERNAME` / `OPENSEARCH_PASSWORD`: basic auth credentials (optional)
    /// - `OPENSEARCH_INDEX`: target index (default: documents)
    /// - `OPENSEARCH_TIMEOUT_SECS`: request timeout (default: 60)
    /// - `INDEXING_MAX_ATTEMPTS`: attempts per submission (default: 5)
    /// - `INDEXING_BACKOFF_UNIT_MS`: backoff unit in milliseconds (default: 1)
    /// - `INDEXING_MAX_BATCH_SIZE`: operations per batch, 0 for unlimited (default: 1000)
    /// - `ACTIVITY_STATUS_PATH`: activity completion marker file (optional)
    ///
    /// # Returns
    ///
    /// * `Ok(IndexerSettings)` - Parsed settings
    /// * `Err(IndexingError::ConfigError)` - If a numeric variable is malformed
    pub fn from_env() -> Result<Self, IndexingError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IndexingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let opensearch_url =
            lookup("OPENSEARCH_URL").unwrap_or_else(|| DEFAULT_OPENSEARCH_URL.to_string());
        let index_name =
            lookup("OPENSEARCH_INDEX").unwrap_or_else(|| DEFAULT_OPENSEARCH_INDEX.to_string());
        let timeout_secs = parse_var(
            "OPENSEARCH_TIMEOUT_SECS",
            lookup("OPENSEARCH_TIMEOUT_SECS"),
            DEFAULT_OPENSEARCH_TIMEOUT_SECS,
        )?;

        let max_attempts = parse_var(
            "INDEXING_MAX_ATTEMPTS",
            lookup("INDEXING_MAX_ATTEMPTS"),
            DEFAULT_MAX_ATTEMPTS,
        )?;
        let backoff_unit_ms = parse_var(
            "INDEXING_BACKOFF_UNIT_MS",
            lookup("INDEXING_BACKOFF_UNIT_MS"),
            DEFAULT_BACKOFF_UNIT.as_millis() as u64,
        )?;
        let max_batch_size = parse_var(
            "INDEXING_MAX_BATCH_SIZE",
            lookup("INDEXING_MAX_BATCH_SIZE"),
            DEFAULT_MAX_BATCH_SIZE,
        )?;

        let batching = BatchIndexingConfig {
            max_attempts,
            backoff_unit: Duration::from_millis(backoff_unit_ms),
            max_batch_size: (max_batch_size > 0).then_some(max_batch_size),
        };

        Ok(Self {
            opensearch_url,
            opensearch_username: lookup("OPENSEARCH_USERNAME"),
            opensearch_password: lookup("OPENSEARCH_PASSWORD"),
            index: IndexConfig::new(index_name)
                .with_request_timeout(Duration::from_secs(timeout_secs)),
            batching,
            activity_status_path: lookup("ACTIVITY_STATUS_PATH").map(PathBuf::from),
        })
    }
}

fn parse_var<T>(name: &str, value: Option<String>, default: T) -> Result<T, IndexingError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| {
            IndexingError::config(format!("Invalid value '{}' for {}: {}", raw, name, e))
        }),
        None => Ok(default),
    }
}
