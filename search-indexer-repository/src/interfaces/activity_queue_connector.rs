//! Activity queue connector trait definition.

use async_trait::async_trait;

use crate::errors::SearchError;

/// Source of the indexing activity completion marker.
///
/// The marker format is owned by the connector; see
/// `search_indexer_shared::IndexingActivityStatus` for how it is parsed.
#[async_trait]
pub trait ActivityQueueConnector: Send + Sync {
    /// Read the raw completion marker.
    async fn completion_info(&self) -> Result<String, SearchError>;
}
