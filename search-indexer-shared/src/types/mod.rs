//! This module defines the core data structures used across the search indexer.
//! It re-exports specific types like `IndexDocument` and `DocumentOperation`.

pub mod activity_status;
pub mod document_operation;
pub mod index_document;

pub use activity_status::IndexingActivityStatus;
pub use document_operation::{DocumentOperation, OperationKind};
pub use index_document::{DocumentKey, IndexDocument};
