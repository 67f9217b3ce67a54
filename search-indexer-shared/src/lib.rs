//! # Search Indexer Shared
//!
//! This crate defines shared data structures used across the batch search indexer.
//! It includes the documents and operations submitted to the remote index, and the
//! activity status consumed from the activity queue.

pub mod types;

pub use types::activity_status::{IndexingActivityStatus, ParseActivityStatusError};
pub use types::document_operation::{DocumentOperation, OperationKind};
pub use types::index_document::{DocumentKey, IndexDocument};
