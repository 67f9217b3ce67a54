//! Batch indexing client implementation.
//!
//! This module provides the main client for committing document operations to the
//! search index. A submission is sent as one batch; documents that fail with a
//! transient status code are re-sent in a smaller batch after an exponential
//! backoff, until everything is committed, a permanent failure occurs, or the
//! attempt budget runs out.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::BatchIndexingConfig;
use crate::errors::{SearchError, SearchIndexError};
use crate::interfaces::{IndexResponse, IndexServiceGateway};
use crate::retry;
use crate::types::{Batch, BatchOutcome, DocumentResult, OutcomeStatus};
use search_indexer_shared::{DocumentKey, DocumentOperation, IndexDocument};

/// Status code recorded for operations the gateway confirmed without a per-document result.
const IMPLICIT_SUCCESS_STATUS: u16 = 200;

/// The main client for committing document operations to the search index.
///
/// The gateway is created once by the caller and shared by every clone of the
/// client and every spawned task. Cloning the client is cheap.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use search_indexer_repository::opensearch::{IndexConfig, OpenSearchGateway};
/// use search_indexer_repository::BatchIndexingClient;
/// use search_indexer_shared::IndexDocument;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let gateway = OpenSearchGateway::new("http://localhost:9200", IndexConfig::new("documents"))?;
/// let client = BatchIndexingClient::new(Arc::new(gateway));
///
/// let outcome = client
///     .upload(vec![IndexDocument::new("doc-1").with_field("title", "Hello")])
///     .await?;
/// assert!(outcome.is_success());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BatchIndexingClient {
    gateway: Arc<dyn IndexServiceGateway>,
    config: BatchIndexingConfig,
}

impl BatchIndexingClient {
    /// Create a new BatchIndexingClient with default configuration.
    pub fn new(gateway: Arc<dyn IndexServiceGateway>) -> Self {
        Self {
            gateway,
            config: BatchIndexingConfig::default(),
        }
    }

    /// Create a new BatchIndexingClient with custom configuration.
    pub fn with_config(gateway: Arc<dyn IndexServiceGateway>, config: BatchIndexingConfig) -> Self {
        Self { gateway, config }
    }

    pub fn config(&self) -> &BatchIndexingConfig {
        &self.config
    }

    /// The gateway this client submits batches to.
    pub fn gateway(&self) -> &Arc<dyn IndexServiceGateway> {
        &self.gateway
    }

    /// Upload (create or replace) documents.
    ///
    /// # Arguments
    ///
    /// * `documents` - The documents to upload; `None` is rejected
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOutcome)` - If every document was committed
    /// * `Err(SearchIndexError::InvalidArgument)` - If `documents` is absent or invalid
    /// * `Err(SearchIndexError::BatchSizeExceeded)` - If a `max_batch_size` is configured and exceeded
    /// * `Err(SearchIndexError::PermanentFailure)` - If a document failed permanently
    /// * `Err(SearchIndexError::RetryExhausted)` - If transient failures outlasted the attempt budget
    /// * `Err(SearchIndexError::Gateway)` - If the gateway failed as a whole
    pub async fn upload<D>(&self, documents: D) -> Result<BatchOutcome, SearchIndexError>
    where
        D: Into<Option<Vec<IndexDocument>>>,
    {
        let batch = self.prepare_upload(documents.into())?;
        self.index_with_retry(batch, CancellationToken::new()).await
    }

    /// Delete documents by key.
    ///
    /// Same contract as [`upload`](Self::upload). Deleting a key that is not in the
    /// index is reported by the gateway as a success.
    pub async fn delete<K>(&self, keys: K) -> Result<BatchOutcome, SearchIndexError>
    where
        K: Into<Option<Vec<DocumentKey>>>,
    {
        let batch = self.prepare_delete(keys.into())?;
        self.index_with_retry(batch, CancellationToken::new()).await
    }

    /// Submit a pre-built list of operations.
    ///
    /// The list must be homogeneous: all upserts or all deletes.
    pub async fn submit<O>(&self, operations: O) -> Result<BatchOutcome, SearchIndexError>
    where
        O: Into<Option<Vec<DocumentOperation>>>,
    {
        let batch = self.prepare(operations.into(), "operations")?;
        self.index_with_retry(batch, CancellationToken::new()).await
    }

    /// Upload documents on a background task.
    ///
    /// Validation happens before the task is spawned, so an absent or invalid
    /// document list fails immediately. Must be called within a tokio runtime.
    pub fn spawn_upload<D>(&self, documents: D) -> Result<IndexingTask, SearchIndexError>
    where
        D: Into<Option<Vec<IndexDocument>>>,
    {
        let batch = self.prepare_upload(documents.into())?;
        Ok(self.spawn(batch))
    }

    /// Delete documents on a background task. See [`spawn_upload`](Self::spawn_upload).
    pub fn spawn_delete<K>(&self, keys: K) -> Result<IndexingTask, SearchIndexError>
    where
        K: Into<Option<Vec<DocumentKey>>>,
    {
        let batch = self.prepare_delete(keys.into())?;
        Ok(self.spawn(batch))
    }

    /// Submit a pre-built list of operations on a background task.
    pub fn spawn_submit<O>(&self, operations: O) -> Result<IndexingTask, SearchIndexError>
    where
        O: Into<Option<Vec<DocumentOperation>>>,
    {
        let batch = self.prepare(operations.into(), "operations")?;
        Ok(self.spawn(batch))
    }

    fn spawn(&self, batch: Batch) -> IndexingTask {
        let cancel = CancellationToken::new();
        let client = self.clone();
        let token = cancel.clone();
        let handle = tokio::spawn(async move { client.index_with_retry(batch, token).await });

        IndexingTask { handle, cancel }
    }

    fn prepare_upload(
        &self,
        documents: Option<Vec<IndexDocument>>,
    ) -> Result<Batch, SearchIndexError> {
        let operations = documents.map(|documents| {
            documents
                .into_iter()
                .map(DocumentOperation::Upsert)
                .collect()
        });
        self.prepare(operations, "documents")
    }

    fn prepare_delete(&self, keys: Option<Vec<DocumentKey>>) -> Result<Batch, SearchIndexError> {
        let operations = keys.map(|keys| keys.into_iter().map(DocumentOperation::delete).collect());
        self.prepare(operations, "keys")
    }

    /// Validate an operation list and turn it into the first batch.
    fn prepare(
        &self,
        operations: Option<Vec<DocumentOperation>>,
        argument: &str,
    ) -> Result<Batch, SearchIndexError> {
        let operations = operations.ok_or_else(|| {
            SearchIndexError::invalid_argument(format!("{} must not be absent", argument))
        })?;

        self.validate_batch_size(operations.len())?;

        let mut seen: HashSet<&DocumentKey> = HashSet::with_capacity(operations.len());
        for operation in &operations {
            let key = operation.key();
            if key.is_blank() {
                return Err(SearchIndexError::invalid_argument(format!(
                    "{} contains an operation with an empty key",
                    argument
                )));
            }
            if !seen.insert(key) {
                return Err(SearchIndexError::invalid_argument(format!(
                    "{} contains duplicate key '{}'",
                    argument, key
                )));
            }
        }

        let batch = Batch::new(operations);
        if !batch.is_empty() && batch.kind().is_none() {
            return Err(SearchIndexError::invalid_argument(format!(
                "{} mixes upserts and deletes",
                argument
            )));
        }

        Ok(batch)
    }

    /// Check if batch size exceeds the configured limit.
    fn validate_batch_size(&self, size: usize) -> Result<(), SearchIndexError> {
        if let Some(max) = self.config.max_batch_size {
            if size > max {
                return Err(SearchIndexError::batch_size_exceeded(size, max));
            }
        }
        Ok(())
    }

    /// Submit a batch, retrying transiently failed documents with exponential backoff.
    #[instrument(skip_all, fields(batch_id = %Uuid::new_v4(), operations = batch.len()))]
    async fn index_with_retry(
        &self,
        batch: Batch,
        cancel: CancellationToken,
    ) -> Result<BatchOutcome, SearchIndexError> {
        let mut ledger = ResultLedger::new(&batch);
        if batch.is_empty() {
            return Ok(ledger.finish(OutcomeStatus::AllSucceeded, 0));
        }

        let max_attempts = self.config.effective_max_attempts();
        let mut batch = batch;
        let mut attempt: u32 = 1;

        loop {
            debug!(attempt = attempt, size = batch.len(), "Submitting batch");

            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(attempt = attempt, "Indexing cancelled before attempt completed");
                    return Err(SearchIndexError::Cancelled);
                }
                response = self.gateway.index(&batch) => response,
            };

            let results = match response.and_then(|response| Self::resolve_results(&batch, response)) {
                Ok(results) => results,
                Err(e) => {
                    error!(attempt = attempt, error = %e, "Batch request failed");
                    return Err(e.into());
                }
            };
            ledger.record(&results);

            let failures: Vec<&DocumentResult> =
                results.iter().filter(|result| !result.succeeded).collect();

            if failures.is_empty() {
                if attempt > 1 {
                    info!(attempt = attempt, "Batch indexed after retry");
                } else {
                    debug!("Batch indexed");
                }
                return Ok(ledger.finish(OutcomeStatus::AllSucceeded, attempt));
            }

            if let Some(permanent) = failures
                .iter()
                .find(|result| !retry::is_transient_status(result.status_code))
            {
                error!(
                    attempt = attempt,
                    key = %permanent.key,
                    status_code = permanent.status_code,
                    failed = failures.len(),
                    "Non-retryable document failure, aborting batch"
                );
                let outcome = ledger.finish(OutcomeStatus::PermanentFailure, attempt);
                return Err(SearchIndexError::PermanentFailure(outcome));
            }

            if attempt >= max_attempts {
                let outcome = ledger.finish(OutcomeStatus::PartialFailureExhausted, attempt);
                error!(
                    attempts = attempt,
                    failed = failures.len(),
                    "Transient document failures persisted after last attempt"
                );
                return Err(SearchIndexError::RetryExhausted(outcome));
            }

            let failed_keys: HashSet<&DocumentKey> =
                failures.iter().map(|result| &result.key).collect();
            let next = batch.retain_keys(&failed_keys);
            let delay = retry::backoff_delay(attempt, self.config.backoff_unit);

            warn!(
                attempt = attempt,
                max_attempts = max_attempts,
                failed = next.len(),
                delay_ms = delay.as_millis() as u64,
                "Transient document failures, retrying"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(attempt = attempt, "Indexing cancelled during backoff");
                    return Err(SearchIndexError::Cancelled);
                }
                _ = tokio::time::sleep(delay) => {}
            }

            batch = next;
            attempt += 1;
        }
    }

    /// Pair every operation in the batch with its result from the gateway response.
    ///
    /// A completed response may omit results; those operations count as succeeded.
    /// A partial failure must report every operation.
    fn resolve_results(
        batch: &Batch,
        response: IndexResponse,
    ) -> Result<Vec<DocumentResult>, SearchError> {
        let (reported, partial) = match response {
            IndexResponse::Completed(results) => (results, false),
            IndexResponse::PartialFailure(results) => (results, true),
        };

        let mut by_key: HashMap<DocumentKey, DocumentResult> = reported
            .into_iter()
            .map(|result| (result.key.clone(), result))
            .collect();

        let results = batch
            .keys()
            .map(|key| match by_key.remove(key) {
                Some(result) => Ok(result),
                None if !partial => Ok(DocumentResult::succeeded(
                    key.clone(),
                    IMPLICIT_SUCCESS_STATUS,
                )),
                None => Err(SearchError::parse(format!(
                    "Partial failure response has no result for key '{}'",
                    key
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        if !by_key.is_empty() {
            warn!(
                unknown = by_key.len(),
                "Ignoring results for keys that were not in the batch"
            );
        }

        Ok(results)
    }
}

/// Last known result per key, in original submission order.
struct ResultLedger {
    order: Vec<DocumentKey>,
    latest: HashMap<DocumentKey, DocumentResult>,
}

impl ResultLedger {
    fn new(batch: &Batch) -> Self {
        Self {
            order: batch.keys().cloned().collect(),
            latest: HashMap::with_capacity(batch.len()),
        }
    }

    fn record(&mut self, results: &[DocumentResult]) {
        for result in results {
            self.latest.insert(result.key.clone(), result.clone());
        }
    }

    fn finish(mut self, status: OutcomeStatus, attempts: u32) -> BatchOutcome {
        let results = self
            .order
            .iter()
            .filter_map(|key| self.latest.remove(key))
            .collect();

        BatchOutcome {
            status,
            attempts,
            results,
        }
    }
}

/// Handle to a submission running on a background task.
///
/// Dropping the handle detaches the task; it keeps running to completion.
#[derive(Debug)]
pub struct IndexingTask {
    handle: JoinHandle<Result<BatchOutcome, SearchIndexError>>,
    cancel: CancellationToken,
}

impl IndexingTask {
    /// Request cancellation.
    ///
    /// An in-flight gateway request is dropped and a pending backoff wait ends
    /// immediately; no further attempt is made. Documents the service already
    /// committed stay committed.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A token that cancels this task when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the task to finish and return its outcome.
    pub async fn join(self) -> Result<BatchOutcome, SearchIndexError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(SearchIndexError::Cancelled),
            Err(e) => Err(SearchIndexError::TaskFailed(e.to_string())),
        }
    }
}
