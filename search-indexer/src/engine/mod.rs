//! Lifecycle shell around the batch indexing client.
//!
//! The engine owns the Running and Paused flags. Submissions are refused while
//! the engine is stopped and held back while it is paused; the client itself
//! never looks at either flag.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, instrument};

use crate::activity;
use crate::IndexingError;
use search_indexer_repository::{
    ActivityQueueConnector, BatchIndexingClient, BatchOutcome, IndexingTask, SearchIndexError,
};
use search_indexer_shared::{DocumentKey, IndexDocument, IndexingActivityStatus};

/// Lifecycle state of an [`IndexingEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Stopped,
    Running,
    Paused,
}

/// Pausable front end for a [`BatchIndexingClient`].
///
/// A new engine is stopped; call [`start`](Self::start) before submitting.
pub struct IndexingEngine {
    client: BatchIndexingClient,
    activity: Option<Arc<dyn ActivityQueueConnector>>,
    state: watch::Sender<EngineState>,
}

impl IndexingEngine {
    pub fn new(
        client: BatchIndexingClient,
        activity: Option<Arc<dyn ActivityQueueConnector>>,
    ) -> Self {
        let (state, _) = watch::channel(EngineState::Stopped);
        Self {
            client,
            activity,
            state,
        }
    }

    pub fn client(&self) -> &BatchIndexingClient {
        &self.client
    }

    pub fn state(&self) -> EngineState {
        *self.state.borrow()
    }

    /// Running, whether paused or not.
    pub fn is_running(&self) -> bool {
        self.state() != EngineState::Stopped
    }

    pub fn is_paused(&self) -> bool {
        self.state() == EngineState::Paused
    }

    /// Start the engine. Clears a pending pause.
    pub fn start(&self) {
        self.state.send_replace(EngineState::Running);
        info!("Indexing engine started");
    }

    /// Hold back new submissions until [`resume`](Self::resume) is called.
    ///
    /// Has no effect unless the engine is running.
    pub fn pause(&self) {
        let paused = self.transition(EngineState::Running, EngineState::Paused);
        if paused {
            info!("Indexing engine paused");
        }
    }

    /// Release submissions held back by [`pause`](Self::pause).
    pub fn resume(&self) {
        let resumed = self.transition(EngineState::Paused, EngineState::Running);
        if resumed {
            info!("Indexing engine resumed");
        }
    }

    /// Stop the engine. Submissions waiting on a pause fail with `NotRunning`.
    pub fn shutdown(&self) {
        self.state.send_replace(EngineState::Stopped);
        info!("Indexing engine shut down");
    }

    pub fn restart(&self) {
        self.shutdown();
        self.start();
    }

    fn transition(&self, from: EngineState, to: EngineState) -> bool {
        self.state.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        })
    }

    /// Wait until the engine is no longer paused.
    ///
    /// Returns the state that ended the wait: `Running`, or `Stopped` if the
    /// engine was shut down in the meantime.
    pub async fn wait_if_paused(&self) -> EngineState {
        let mut receiver = self.state.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        let state = match receiver
            .wait_for(|state| *state != EngineState::Paused)
            .await
        {
            Ok(state) => *state,
            Err(_) => EngineState::Stopped,
        };
        state
    }

    async fn ensure_ready(&self) -> Result<(), IndexingError> {
        if !self.is_running() {
            return Err(IndexingError::NotRunning);
        }
        if self.is_paused() {
            info!("Submission waiting for engine to resume");
        }
        match self.wait_if_paused().await {
            EngineState::Stopped => Err(IndexingError::NotRunning),
            _ => Ok(()),
        }
    }

    /// Upload documents through the client once the engine is running and not paused.
    #[instrument(skip_all)]
    pub async fn upload<D>(&self, documents: D) -> Result<BatchOutcome, IndexingError>
    where
        D: Into<Option<Vec<IndexDocument>>>,
    {
        self.ensure_ready().await?;
        Ok(self.client.upload(documents).await?)
    }

    /// Delete documents through the client once the engine is running and not paused.
    #[instrument(skip_all)]
    pub async fn delete<K>(&self, keys: K) -> Result<BatchOutcome, IndexingError>
    where
        K: Into<Option<Vec<DocumentKey>>>,
    {
        self.ensure_ready().await?;
        Ok(self.client.delete(keys).await?)
    }

    /// Like [`upload`](Self::upload), but the submission runs on a cancellable task.
    pub async fn spawn_upload<D>(&self, documents: D) -> Result<IndexingTask, IndexingError>
    where
        D: Into<Option<Vec<IndexDocument>>>,
    {
        self.ensure_ready().await?;
        Ok(self.client.spawn_upload(documents)?)
    }

    /// Like [`delete`](Self::delete), but the submission runs on a cancellable task.
    pub async fn spawn_delete<K>(&self, keys: K) -> Result<IndexingTask, IndexingError>
    where
        K: Into<Option<Vec<DocumentKey>>>,
    {
        self.ensure_ready().await?;
        Ok(self.client.spawn_delete(keys)?)
    }

    /// Read and parse the activity completion marker.
    pub async fn read_activity_status(&self) -> Result<IndexingActivityStatus, IndexingError> {
        activity::read_activity_status(self.activity.as_deref()).await
    }

    pub async fn documents_by_node_id(
        &self,
        _node_id: &str,
    ) -> Result<Vec<IndexDocument>, IndexingError> {
        Err(SearchIndexError::unsupported("document lookup by node id").into())
    }

    /// Apply deletions, additions, and updates as one reconciliation.
    pub async fn actualize(
        &self,
        _deletions: Vec<DocumentKey>,
        _additions: Vec<IndexDocument>,
        _updates: Vec<IndexDocument>,
    ) -> Result<BatchOutcome, IndexingError> {
        Err(SearchIndexError::unsupported("actualize").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use search_indexer_repository::{
        Batch, DocumentResult, IndexResponse, IndexServiceGateway, SearchError,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingGateway {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl IndexServiceGateway for CountingGateway {
        async fn index(&self, batch: &Batch) -> Result<IndexResponse, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(IndexResponse::Completed(
                batch
                    .keys()
                    .map(|key| DocumentResult::succeeded(key.clone(), 201))
                    .collect(),
            ))
        }

        async fn health_check(&self) -> Result<bool, SearchError> {
            Ok(true)
        }
    }

    struct StaticConnector(&'static str);

    #[async_trait]
    impl ActivityQueueConnector for StaticConnector {
        async fn completion_info(&self) -> Result<String, SearchError> {
            Ok(self.0.to_string())
        }
    }

    fn engine_with(
        activity: Option<Arc<dyn ActivityQueueConnector>>,
    ) -> (Arc<IndexingEngine>, Arc<CountingGateway>) {
        let gateway = Arc::new(CountingGateway::default());
        let client = BatchIndexingClient::new(gateway.clone());
        (Arc::new(IndexingEngine::new(client, activity)), gateway)
    }

    fn documents() -> Vec<IndexDocument> {
        vec![IndexDocument::new("a"), IndexDocument::new("b")]
    }

    #[test]
    fn test_lifecycle_transitions() {
        let (engine, _) = engine_with(None);
        assert_eq!(engine.state(), EngineState::Stopped);

        engine.pause();
        assert_eq!(engine.state(), EngineState::Stopped);

        engine.start();
        assert!(engine.is_running());
        assert!(!engine.is_paused());

        engine.pause();
        assert!(engine.is_running());
        assert!(engine.is_paused());

        engine.resume();
        assert_eq!(engine.state(), EngineState::Running);

        engine.pause();
        engine.restart();
        assert_eq!(engine.state(), EngineState::Running);

        engine.shutdown();
        assert!(!engine.is_running());
    }

    #[tokio::test]
    async fn test_wait_if_paused_reports_ending_state() {
        let (engine, _) = engine_with(None);
        engine.start();
        assert_eq!(engine.wait_if_paused().await, EngineState::Running);

        engine.pause();
        let waiting = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.wait_if_paused().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        engine.resume();
        assert_eq!(waiting.await.unwrap(), EngineState::Running);

        engine.pause();
        let waiting = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.wait_if_paused().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        engine.shutdown();
        assert_eq!(waiting.await.unwrap(), EngineState::Stopped);
    }

    #[tokio::test]
    async fn test_upload_requires_running() {
        let (engine, gateway) = engine_with(None);

        let result = engine.upload(documents()).await;

        assert!(matches!(result, Err(IndexingError::NotRunning)));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upload_and_delete_when_running() {
        let (engine, gateway) = engine_with(None);
        engine.start();

        let outcome = engine.upload(documents()).await.unwrap();
        assert!(outcome.is_success());

        let outcome = engine
            .delete(vec![DocumentKey::from("a")])
            .await
            .unwrap();
        assert!(outcome.is_success());
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_errors_pass_through() {
        let (engine, _) = engine_with(None);
        engine.start();

        let result = engine.upload(None::<Vec<IndexDocument>>).await;

        assert!(matches!(
            result,
            Err(IndexingError::Indexing(SearchIndexError::InvalidArgument(_)))
        ));
    }

    #[tokio::test]
    async fn test_upload_waits_while_paused() {
        let (engine, gateway) = engine_with(None);
        engine.start();
        engine.pause();

        let pending = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.upload(documents()).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pending.is_finished());
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);

        engine.resume();

        let outcome = pending.await.unwrap().unwrap();
        assert!(outcome.is_success());
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_releases_paused_submission() {
        let (engine, gateway) = engine_with(None);
        engine.start();
        engine.pause();

        let pending = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.upload(documents()).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        engine.shutdown();

        let result = pending.await.unwrap();
        assert!(matches!(result, Err(IndexingError::NotRunning)));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_spawn_upload() {
        let (engine, _) = engine_with(None);
        engine.start();

        let task = engine.spawn_upload(documents()).await.unwrap();

        assert!(task.join().await.unwrap().is_success());
    }

    #[tokio::test]
    async fn test_read_activity_status() {
        let (engine, _) = engine_with(Some(Arc::new(StaticConnector("42(40,37)"))));

        let status = engine.read_activity_status().await.unwrap();

        assert_eq!(status, IndexingActivityStatus::new(42, vec![37, 40]));
    }

    #[tokio::test]
    async fn test_read_activity_status_errors() {
        let (engine, _) = engine_with(Some(Arc::new(StaticConnector("garbage"))));
        assert!(matches!(
            engine.read_activity_status().await,
            Err(IndexingError::ActivityStatus(_))
        ));

        let (engine, _) = engine_with(None);
        assert!(matches!(
            engine.read_activity_status().await,
            Err(IndexingError::Indexing(SearchIndexError::Unsupported(_)))
        ));
    }

    #[tokio::test]
    async fn test_unsupported_operations() {
        let (engine, _) = engine_with(None);
        engine.start();

        assert!(matches!(
            engine.documents_by_node_id("node-1").await,
            Err(IndexingError::Indexing(SearchIndexError::Unsupported(_)))
        ));
        assert!(matches!(
            engine.actualize(vec![], documents(), vec![]).await,
            Err(IndexingError::Indexing(SearchIndexError::Unsupported(_)))
        ));
    }
}
