//! Dependency initialization and wiring for the search indexer.

use std::sync::Arc;
use tracing::info;

use crate::activity::{self, FileActivityQueueConnector};
use crate::config::IndexerSettings;
use crate::engine::IndexingEngine;
use crate::IndexingError;
use search_indexer_repository::{
    ActivityQueueConnector, BatchIndexingClient, IndexServiceGateway, OpenSearchGateway,
    SearchIndexError,
};
use search_indexer_shared::IndexingActivityStatus;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The indexing engine, already started.
    pub engine: IndexingEngine,
    /// The settings the dependencies were built from.
    pub settings: IndexerSettings,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// See [`IndexerSettings::from_env`] for the variables read.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If initialization fails
    pub async fn new() -> Result<Self, IndexingError> {
        let settings = IndexerSettings::from_env()?;
        Self::from_settings(settings).await
    }

    /// Initialize all dependencies from already parsed settings.
    pub async fn from_settings(settings: IndexerSettings) -> Result<Self, IndexingError> {
        info!(
            opensearch_url = %settings.opensearch_url,
            index = %settings.index.index_name,
            max_attempts = settings.batching.max_attempts,
            backoff_unit_ms = settings.batching.backoff_unit.as_millis() as u64,
            max_batch_size = ?settings.batching.max_batch_size,
            "Initializing dependencies"
        );

        // Initialize OpenSearch gateway
        let gateway = match (&settings.opensearch_username, &settings.opensearch_password) {
            (Some(username), Some(password)) => OpenSearchGateway::with_basic_auth(
                &settings.opensearch_url,
                settings.index.clone(),
                username.clone(),
                password.clone(),
            ),
            _ => OpenSearchGateway::new(&settings.opensearch_url, settings.index.clone()),
        }
        .map_err(|e| IndexingError::config(format!("Failed to create OpenSearch gateway: {}", e)))?;

        // Verify OpenSearch is reachable
        let healthy = gateway
            .health_check()
            .await
            .map_err(|e| IndexingError::config(format!("OpenSearch health check failed: {}", e)))?;

        if !healthy {
            return Err(IndexingError::config("OpenSearch cluster is unhealthy"));
        }

        info!("OpenSearch connection verified");

        let client = BatchIndexingClient::with_config(Arc::new(gateway), settings.batching.clone());

        let engine = IndexingEngine::new(client, Self::activity_connector(&settings));
        engine.start();

        Ok(Self { engine, settings })
    }

    /// Build the activity queue connector configured by `settings`, if any.
    pub fn activity_connector(settings: &IndexerSettings) -> Option<Arc<dyn ActivityQueueConnector>> {
        settings.activity_status_path.as_ref().map(|path| {
            info!(path = %path.display(), "Activity status file configured");
            Arc::new(FileActivityQueueConnector::new(path)) as Arc<dyn ActivityQueueConnector>
        })
    }

    /// Read the activity status without connecting to OpenSearch.
    pub async fn read_activity_status(
        settings: &IndexerSettings,
    ) -> Result<IndexingActivityStatus, IndexingError> {
        let connector = Self::activity_connector(settings);
        activity::read_activity_status(connector.as_deref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with(activity_status_path: Option<&std::path::Path>) -> IndexerSettings {
        IndexerSettings::from_lookup(|name| match name {
            "OPENSEARCH_URL" => Some("http://127.0.0.1:1".to_string()),
            "ACTIVITY_STATUS_PATH" => {
                activity_status_path.map(|path| path.display().to_string())
            }
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_activity_status_does_not_need_opensearch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity");
        std::fs::write(&path, "12(9)").unwrap();

        let status = Dependencies::read_activity_status(&settings_with(Some(&path)))
            .await
            .unwrap();

        assert_eq!(status, IndexingActivityStatus::new(12, vec![9]));
    }

    #[tokio::test]
    async fn test_activity_status_without_path_is_unsupported() {
        let result = Dependencies::read_activity_status(&settings_with(None)).await;

        assert!(matches!(
            result,
            Err(IndexingError::Indexing(SearchIndexError::Unsupported(_)))
        ));
    }
}
