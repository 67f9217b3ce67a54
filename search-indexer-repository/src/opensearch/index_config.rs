//! OpenSearch index configuration.

use std::time::Duration;

/// Default name of the target index.
pub const DEFAULT_INDEX_NAME: &str = "documents";

/// Default timeout for a single bulk request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Target index and request settings for the OpenSearch gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Name (or alias) of the index documents are written to.
    pub index_name: String,
    /// Timeout applied to every request sent to the cluster.
    pub request_timeout: Duration,
}

impl IndexConfig {
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the request timeout.
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_NAME)
    }
}
