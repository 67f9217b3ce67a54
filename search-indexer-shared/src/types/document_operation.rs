//! Document operation types.
//!
//! A document operation is a single mutation sent to the search index as part of a batch.

use serde::{Deserialize, Serialize};

use super::index_document::{DocumentKey, IndexDocument};

/// A single mutation of the search index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DocumentOperation {
    /// Create the document, or replace it if it already exists.
    Upsert(IndexDocument),
    /// Remove the document with the given key.
    Delete { key: DocumentKey },
}

/// The kind of a [`DocumentOperation`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Upsert,
    Delete,
}

impl DocumentOperation {
    /// Create a delete operation for the given key.
    pub fn delete(key: impl Into<DocumentKey>) -> Self {
        Self::Delete { key: key.into() }
    }

    /// The key of the document this operation targets.
    pub fn key(&self) -> &DocumentKey {
        match self {
            Self::Upsert(document) => &document.key,
            Self::Delete { key } => key,
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Upsert(_) => OperationKind::Upsert,
            Self::Delete { .. } => OperationKind::Delete,
        }
    }
}

impl From<IndexDocument> for DocumentOperation {
    fn from(document: IndexDocument) -> Self {
        Self::Upsert(document)
    }
}
