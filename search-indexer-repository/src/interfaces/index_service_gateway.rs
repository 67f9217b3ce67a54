//! Index service gateway trait definition.
//!
//! This module defines the abstract interface the batch indexing client uses to
//! reach the remote search index, allowing for different backend implementations
//! (OpenSearch, mock, etc.).

use async_trait::async_trait;

use crate::errors::SearchError;
use crate::types::{Batch, DocumentResult};

/// Response of the index service to one submitted batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexResponse {
    /// Every operation in the batch was committed.
    ///
    /// Per-document results are optional here: the client treats any operation
    /// without a result as succeeded.
    Completed(Vec<DocumentResult>),
    /// At least one operation failed. Carries a result for every operation in the batch.
    PartialFailure(Vec<DocumentResult>),
}

impl IndexResponse {
    pub fn results(&self) -> &[DocumentResult] {
        match self {
            Self::Completed(results) | Self::PartialFailure(results) => results,
        }
    }
}

/// Abstract interface to the remote search index.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`: a single gateway is created once and
/// shared read-only by every client and spawned indexing task.
///
/// # Error Handling
///
/// Per-document failures are data, reported through `IndexResponse::PartialFailure`.
/// An `Err(SearchError)` means the request failed as a whole (transport,
/// authentication, malformed response) and is never retried by the client.
#[async_trait]
pub trait IndexServiceGateway: Send + Sync {
    /// Submit a batch of document operations in a single request.
    ///
    /// # Arguments
    ///
    /// * `batch` - The operations to apply, all of the same kind
    ///
    /// # Returns
    ///
    /// * `Ok(IndexResponse::Completed)` - If every operation was committed
    /// * `Ok(IndexResponse::PartialFailure)` - If some operations failed
    /// * `Err(SearchError)` - If the request failed as a whole
    async fn index(&self, batch: &Batch) -> Result<IndexResponse, SearchError>;

    /// Check if the index service is healthy and reachable.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the service is healthy
    /// * `Ok(false)` - If the service is unhealthy
    /// * `Err(SearchError)` - If the health check fails to execute
    async fn health_check(&self) -> Result<bool, SearchError>;
}
