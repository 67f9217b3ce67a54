//! # Search Indexer
//!
//! Application layer for the batch indexer.
//!
//! This crate wires the batch indexing client to OpenSearch from environment
//! configuration, wraps it in a pausable lifecycle engine, and exposes both to
//! the command line binary.

pub mod activity;
pub mod config;
pub mod engine;
pub mod input;

pub use activity::FileActivityQueueConnector;
pub use config::{Dependencies, IndexerSettings};
pub use engine::{EngineState, IndexingEngine};

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The engine was asked to index while stopped.
    #[error("Indexing engine is not running")]
    NotRunning,

    /// Batch indexing error.
    #[error("Indexing error: {0}")]
    Indexing(#[from] search_indexer_repository::SearchIndexError),

    /// Search error.
    #[error("Search error: {0}")]
    SearchError(#[from] search_indexer_repository::SearchError),

    /// Activity marker could not be parsed.
    #[error("Activity status error: {0}")]
    ActivityStatus(#[from] search_indexer_shared::ParseActivityStatusError),

    /// Input document could not be decoded.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
