//! # Search Indexer Repository
//!
//! This crate provides the batch indexing client and the traits it depends on.
//! The client submits batches of document operations to a remote search index,
//! retries the documents that failed transiently with exponential backoff, and
//! reports a definitive status for every submitted key. A concrete gateway for
//! OpenSearch is included.

pub mod client;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod retry;
pub mod types;

pub use client::{BatchIndexingClient, IndexingTask};
pub use config::BatchIndexingConfig;
pub use errors::{SearchError, SearchIndexError};
pub use interfaces::{ActivityQueueConnector, IndexResponse, IndexServiceGateway};
pub use opensearch::OpenSearchGateway;
pub use types::{Batch, BatchOutcome, DocumentResult, OutcomeStatus};
