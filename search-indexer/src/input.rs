//! Command line input handling.

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::IndexingError;
use search_indexer_repository::BatchIndexingConfig;
use search_indexer_shared::IndexDocument;

/// Read newline-delimited JSON documents.
///
/// Blank lines are skipped. Every other line must be a JSON object holding a
/// string or numeric key under `key_field`; the remaining properties become the
/// document fields.
pub async fn read_documents<R>(reader: R, key_field: &str) -> Result<Vec<IndexDocument>, IndexingError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut documents = Vec::new();
    let mut line_number = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(&line).map_err(|e| {
            IndexingError::invalid_input(format!("line {}: {}", line_number, e))
        })?;
        let document = IndexDocument::from_json_object(value, key_field).ok_or_else(|| {
            IndexingError::invalid_input(format!(
                "line {}: expected a JSON object with a '{}' key",
                line_number, key_field
            ))
        })?;
        documents.push(document);
    }

    Ok(documents)
}

/// Number of operations to submit per batch under `config`.
pub fn chunk_size(config: &BatchIndexingConfig) -> usize {
    config.max_batch_size.unwrap_or(usize::MAX).max(1)
}
