//! File-backed activity queue connector.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::IndexingError;
use search_indexer_repository::{ActivityQueueConnector, SearchError, SearchIndexError};
use search_indexer_shared::IndexingActivityStatus;

/// Read and parse the completion marker from an optional connector.
pub async fn read_activity_status(
    connector: Option<&dyn ActivityQueueConnector>,
) -> Result<IndexingActivityStatus, IndexingError> {
    let connector = connector.ok_or_else(|| {
        SearchIndexError::unsupported("activity status tracking is not configured")
    })?;
    let marker = connector.completion_info().await?;
    Ok(marker.parse::<IndexingActivityStatus>()?)
}

/// Reads the activity completion marker from a file.
///
/// A missing file means no activity has completed yet.
#[derive(Debug, Clone)]
pub struct FileActivityQueueConnector {
    path: PathBuf,
}

impl FileActivityQueueConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ActivityQueueConnector for FileActivityQueueConnector {
    async fn completion_info(&self) -> Result<String, SearchError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(contents.trim().to_string()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Activity status file not found");
                Ok(IndexingActivityStatus::default().to_string())
            }
            Err(e) => Err(SearchError::activity_queue(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}
