//! Batch and result types for search index operations.

use std::collections::HashSet;

use serde::Serialize;

use search_indexer_shared::{DocumentKey, DocumentOperation, OperationKind};

/// Maximum number of failed keys listed in a failure summary.
const SUMMARY_KEY_LIMIT: usize = 10;

/// An immutable, ordered group of document operations submitted in one attempt.
///
/// Retries never modify a batch: they build a new one from the operations that
/// must be re-sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    operations: Vec<DocumentOperation>,
}

impl Batch {
    pub fn new(operations: Vec<DocumentOperation>) -> Self {
        Self { operations }
    }

    pub fn operations(&self) -> &[DocumentOperation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Keys of all operations, in submission order.
    pub fn keys(&self) -> impl Iterator<Item = &DocumentKey> {
        self.operations.iter().map(DocumentOperation::key)
    }

    /// The operation kind shared by every operation, or `None` if the batch is empty or mixed.
    pub fn kind(&self) -> Option<OperationKind> {
        let first = self.operations.first()?.kind();
        self.operations
            .iter()
            .all(|operation| operation.kind() == first)
            .then_some(first)
    }

    /// Build a new batch holding only the operations whose key is in `keys`.
    ///
    /// Operations keep their original content and relative order.
    pub fn retain_keys(&self, keys: &HashSet<&DocumentKey>) -> Batch {
        Batch::new(
            self.operations
                .iter()
                .filter(|operation| keys.contains(operation.key()))
                .cloned()
                .collect(),
        )
    }
}

impl From<Vec<DocumentOperation>> for Batch {
    fn from(operations: Vec<DocumentOperation>) -> Self {
        Self::new(operations)
    }
}

/// Result of a single operation within a submitted batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentResult {
    /// Key of the document the operation targeted.
    pub key: DocumentKey,
    /// Whether the operation was committed.
    pub succeeded: bool,
    /// Status code reported by the index service for this document.
    pub status_code: u16,
    /// Error message reported by the index service, if the operation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl DocumentResult {
    /// Create a successful result.
    pub fn succeeded(key: impl Into<DocumentKey>, status_code: u16) -> Self {
        Self {
            key: key.into(),
            succeeded: true,
            status_code,
            error_message: None,
        }
    }

    /// Create a failed result.
    pub fn failed(
        key: impl Into<DocumentKey>,
        status_code: u16,
        error_message: Option<String>,
    ) -> Self {
        Self {
            key: key.into(),
            succeeded: false,
            status_code,
            error_message,
        }
    }
}

/// Terminal status of one logical submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Every operation was committed.
    AllSucceeded,
    /// Some operations still failed transiently after the last allowed attempt.
    PartialFailureExhausted,
    /// A non-retryable failure aborted the submission.
    PermanentFailure,
}

/// Aggregate result of one logical submission across all of its attempts.
///
/// Holds exactly one result per submitted key, reflecting the last attempt that
/// included the key, in the caller's original order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub status: OutcomeStatus,
    /// Number of attempts made against the index service.
    pub attempts: u32,
    pub results: Vec<DocumentResult>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::AllSucceeded
    }

    /// Results of operations that were not committed.
    pub fn failed(&self) -> impl Iterator<Item = &DocumentResult> {
        self.results.iter().filter(|result| !result.succeeded)
    }

    pub fn failed_keys(&self) -> Vec<&DocumentKey> {
        self.failed().map(|result| &result.key).collect()
    }

    pub fn succeeded_count(&self) -> usize {
        self.results.iter().filter(|result| result.succeeded).count()
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    /// Human readable list of failed keys with their last status code and message.
    pub fn failure_summary(&self) -> String {
        let failed_count = self.failed_count();
        if failed_count == 0 {
            return "no failed documents".to_string();
        }

        let mut entries: Vec<String> = self
            .failed()
            .take(SUMMARY_KEY_LIMIT)
            .map(|result| match &result.error_message {
                Some(message) => format!("{} ({}: {})", result.key, result.status_code, message),
                None => format!("{} ({})", result.key, result.status_code),
            })
            .collect();

        if failed_count > SUMMARY_KEY_LIMIT {
            entries.push(format!("and {} more", failed_count - SUMMARY_KEY_LIMIT));
        }

        format!("{} failed documents: {}", failed_count, entries.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use search_indexer_shared::IndexDocument;

    fn upsert(key: &str) -> DocumentOperation {
        DocumentOperation::Upsert(IndexDocument::new(key).with_field("title", key))
    }

    #[test]
    fn test_batch_kind() {
        assert_eq!(Batch::new(vec![]).kind(), None);
        assert_eq!(
            Batch::new(vec![upsert("a"), upsert("b")]).kind(),
            Some(OperationKind::Upsert)
        );
        assert_eq!(
            Batch::new(vec![upsert("a"), DocumentOperation::delete("b")]).kind(),
            None
        );
    }

    #[test]
    fn test_retain_keys_preserves_content_and_order() {
        let batch = Batch::new(vec![upsert("a"), upsert("b"), upsert("c")]);
        let c = DocumentKey::from("c");
        let a = DocumentKey::from("a");
        let keys: HashSet<&DocumentKey> = [&c, &a].into_iter().collect();

        let retried = batch.retain_keys(&keys);

        assert_eq!(retried.operations(), &[upsert("a"), upsert("c")]);
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn test_failure_summary_truncates() {
        let results = (0..12)
            .map(|i| DocumentResult::failed(format!("k{}", i), 503, None))
            .collect();
        let outcome = BatchOutcome {
            status: OutcomeStatus::PartialFailureExhausted,
            attempts: 5,
            results,
        };

        let summary = outcome.failure_summary();
        assert!(summary.starts_with("12 failed documents"));
        assert!(summary.contains("k9 (503)"));
        assert!(!summary.contains("k10 (503)"));
        assert!(summary.ends_with("and 2 more"));
    }

    #[test]
    fn test_outcome_counts() {
        let outcome = BatchOutcome {
            status: OutcomeStatus::PermanentFailure,
            attempts: 1,
            results: vec![
                DocumentResult::succeeded("a", 201),
                DocumentResult::failed("b", 400, Some("mapper_parsing_exception".to_string())),
            ],
        };

        assert!(!outcome.is_success());
        assert_eq!(outcome.succeeded_count(), 1);
        assert_eq!(outcome.failed_count(), 1);
        assert_eq!(outcome.failed_keys(), vec![&DocumentKey::from("b")]);
        assert_eq!(
            outcome.failure_summary(),
            "1 failed documents: b (400: mapper_parsing_exception)"
        );
    }
}
