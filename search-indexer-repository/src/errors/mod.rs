//! Error types for the search indexer repository.
//!
//! `SearchError` covers the transport layer behind the index service gateway.
//! `SearchIndexError` is what callers of the batch indexing client see.

mod search_error;
mod search_index_error;

pub use search_error::SearchError;
pub use search_index_error::SearchIndexError;
