//! Search error types.
//!
//! This module defines the errors raised by index service gateways and activity
//! queue connectors. The batch indexing client never retries them.

use thiserror::Error;

/// Errors that can occur while talking to the remote search index.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Failed to establish connection to the search engine.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The bulk request as a whole was rejected or could not be sent.
    #[error("Bulk index error: {0}")]
    BulkIndexError(String),

    /// The search engine rejected the credentials.
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Failed to parse response from search engine.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to read the completion marker from the activity queue.
    #[error("Activity queue error: {0}")]
    ActivityQueueError(String),
}

impl SearchError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a bulk index error.
    pub fn bulk_index(msg: impl Into<String>) -> Self {
        Self::BulkIndexError(msg.into())
    }

    /// Create an authentication error.
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::AuthenticationError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create an activity queue error.
    pub fn activity_queue(msg: impl Into<String>) -> Self {
        Self::ActivityQueueError(msg.into())
    }
}
