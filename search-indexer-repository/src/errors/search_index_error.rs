//! Batch indexing error types.
//!
//! This module defines the errors returned by the `BatchIndexingClient`. Transient
//! per-document failures never show up here unless the retry budget runs out.

use thiserror::Error;

use crate::errors::SearchError;
use crate::types::{BatchOutcome, DocumentResult};
use search_indexer_shared::DocumentKey;

/// Errors returned by batch indexing operations.
///
/// Callers see a complete success, a permanent failure, or a retry-exhausted outcome.
/// The two outcome-carrying variants hold a result for every submitted key.
#[derive(Debug, Clone, Error)]
pub enum SearchIndexError {
    /// The caller passed an absent or malformed operation list. No remote call was made.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Batch size exceeds configured maximum. No remote call was made.
    #[error("Batch size {provided} exceeds maximum {max}")]
    BatchSizeExceeded { provided: usize, max: usize },

    /// At least one document failed with a status code outside the transient set.
    #[error("Permanent batch failure: {}", .0.failure_summary())]
    PermanentFailure(BatchOutcome),

    /// Transient failures persisted through the last allowed attempt.
    #[error("Retry exhausted after {} attempts: {}", .0.attempts, .0.failure_summary())]
    RetryExhausted(BatchOutcome),

    /// The gateway failed as a whole (transport, authentication, protocol).
    #[error(transparent)]
    Gateway(#[from] SearchError),

    /// A spawned indexing task was cancelled before it finished.
    #[error("Indexing task cancelled")]
    Cancelled,

    /// A spawned indexing task terminated abnormally.
    #[error("Indexing task failed: {0}")]
    TaskFailed(String),

    /// The operation is not supported by this indexing engine.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl SearchIndexError {
    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a batch size exceeded error.
    pub fn batch_size_exceeded(provided: usize, max: usize) -> Self {
        Self::BatchSizeExceeded { provided, max }
    }

    /// Create an unsupported operation error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// The outcome carried by this error, if any.
    pub fn outcome(&self) -> Option<&BatchOutcome> {
        match self {
            Self::PermanentFailure(outcome) | Self::RetryExhausted(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Per-document results that did not succeed.
    pub fn failed_results(&self) -> Vec<&DocumentResult> {
        self.outcome()
            .map(|outcome| outcome.failed().collect())
            .unwrap_or_default()
    }

    /// Keys of the documents that were not committed.
    pub fn failed_keys(&self) -> Vec<&DocumentKey> {
        self.failed_results()
            .into_iter()
            .map(|result| &result.key)
            .collect()
    }
}
