//! Bulk request bodies and bulk response parsing.
//!
//! API reference: https://docs.opensearch.org/latest/api-reference/document-apis/bulk/

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::errors::SearchError;
use crate::interfaces::IndexResponse;
use crate::types::{Batch, DocumentResult};
use search_indexer_shared::DocumentOperation;

/// Field stamped onto every uploaded document.
pub(crate) const INDEXED_AT_FIELD: &str = "indexed_at";

/// Build the newline-delimited bulk body for a batch.
///
/// Upserts become `index` actions (create or replace) followed by the document
/// source. Deletes become a single `delete` action line.
pub(crate) fn build_bulk_body(batch: &Batch, indexed_at: DateTime<Utc>) -> Vec<Value> {
    let mut body = Vec::with_capacity(batch.len() * 2);

    for operation in batch.operations() {
        match operation {
            DocumentOperation::Upsert(document) => {
                body.push(json!({ "index": { "_id": document.key.as_str() } }));
                let mut source = document.fields.clone();
                source.insert(
                    INDEXED_AT_FIELD.to_string(),
                    json!(indexed_at.to_rfc3339()),
                );
                body.push(Value::Object(source));
            }
            DocumentOperation::Delete { key } => {
                body.push(json!({ "delete": { "_id": key.as_str() } }));
            }
        }
    }

    body
}

/// Parse a bulk response body into per-document results.
///
/// Deleting a document that does not exist (404 without an error object) is a success.
pub(crate) fn parse_bulk_response(body: &Value) -> Result<IndexResponse, SearchError> {
    let items = body
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| SearchError::parse("Bulk response is missing 'items'"))?;

    let results = items
        .iter()
        .map(parse_item)
        .collect::<Result<Vec<_>, _>>()?;

    if results.iter().all(|result| result.succeeded) {
        Ok(IndexResponse::Completed(results))
    } else {
        Ok(IndexResponse::PartialFailure(results))
    }
}

fn parse_item(item: &Value) -> Result<DocumentResult, SearchError> {
    let (action, detail) = item
        .as_object()
        .and_then(|object| object.iter().next())
        .ok_or_else(|| SearchError::parse(format!("Malformed bulk item: {}", item)))?;

    let key = detail
        .get("_id")
        .and_then(Value::as_str)
        .ok_or_else(|| SearchError::parse(format!("Bulk item without '_id': {}", item)))?;

    let status_code = detail
        .get("status")
        .and_then(Value::as_u64)
        .and_then(|status| u16::try_from(status).ok())
        .ok_or_else(|| SearchError::parse(format!("Bulk item without valid 'status': {}", item)))?;

    if let Some(error) = detail.get("error") {
        return Ok(DocumentResult::failed(
            key,
            status_code,
            Some(format_item_error(error)),
        ));
    }

    let is_success = (200..300).contains(&status_code);
    let is_missing_delete = action == "delete" && status_code == 404;

    if is_success || is_missing_delete {
        Ok(DocumentResult::succeeded(key, status_code))
    } else {
        Ok(DocumentResult::failed(key, status_code, None))
    }
}

/// Render an item error as `type: reason`, falling back to the raw JSON.
fn format_item_error(error: &Value) -> String {
    if let Some(message) = error.as_str() {
        return message.to_string();
    }

    let error_type = error.get("type").and_then(Value::as_str);
    let reason = error.get("reason").and_then(Value::as_str);

    match (error_type, reason) {
        (Some(error_type), Some(reason)) => format!("{}: {}", error_type, reason),
        (Some(error_type), None) => error_type.to_string(),
        (None, Some(reason)) => reason.to_string(),
        (None, None) => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use search_indexer_shared::IndexDocument;

    #[test]
    fn test_build_bulk_body_for_upserts() {
        let batch = Batch::new(vec![
            DocumentOperation::Upsert(IndexDocument::new("a").with_field("title", "First")),
            DocumentOperation::Upsert(IndexDocument::new("b")),
        ]);
        let indexed_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let body = build_bulk_body(&batch, indexed_at);

        assert_eq!(body.len(), 4);
        assert_eq!(body[0], json!({"index": {"_id": "a"}}));
        assert_eq!(body[1]["title"], "First");
        assert_eq!(body[1]["indexed_at"], "2024-05-01T12:00:00+00:00");
        assert_eq!(body[2], json!({"index": {"_id": "b"}}));
    }

    #[test]
    fn test_build_bulk_body_for_deletes() {
        let batch = Batch::new(vec![
            DocumentOperation::delete("a"),
            DocumentOperation::delete("b"),
        ]);

        let body = build_bulk_body(&batch, Utc::now());

        assert_eq!(
            body,
            vec![
                json!({"delete": {"_id": "a"}}),
                json!({"delete": {"_id": "b"}}),
            ]
        );
    }

    #[test]
    fn test_parse_all_succeeded() {
        let body = json!({
            "took": 3,
            "errors": false,
            "items": [
                {"index": {"_index": "documents", "_id": "a", "status": 201, "result": "created"}},
                {"index": {"_index": "documents", "_id": "b", "status": 200, "result": "updated"}}
            ]
        });

        let response = parse_bulk_response(&body).unwrap();

        assert_eq!(
            response,
            IndexResponse::Completed(vec![
                DocumentResult::succeeded("a", 201),
                DocumentResult::succeeded("b", 200),
            ])
        );
    }

    #[test]
    fn test_parse_partial_failure() {
        let body = json!({
            "errors": true,
            "items": [
                {"index": {"_id": "a", "status": 201}},
                {"index": {"_id": "b", "status": 503, "error": {
                    "type": "unavailable_shards_exception",
                    "reason": "primary shard is not active"
                }}},
                {"index": {"_id": "c", "status": 400, "error": {
                    "type": "mapper_parsing_exception",
                    "reason": "failed to parse field [size]"
                }}}
            ]
        });

        let response = parse_bulk_response(&body).unwrap();

        let IndexResponse::PartialFailure(results) = response else {
            panic!("expected partial failure");
        };
        assert!(results[0].succeeded);
        assert_eq!(
            results[1],
            DocumentResult::failed(
                "b",
                503,
                Some("unavailable_shards_exception: primary shard is not active".to_string())
            )
        );
        assert_eq!(results[2].status_code, 400);
        assert!(!results[2].succeeded);
    }

    #[test]
    fn test_parse_missing_delete_is_success() {
        let body = json!({
            "errors": false,
            "items": [
                {"delete": {"_id": "gone", "status": 404, "result": "not_found"}}
            ]
        });

        let response = parse_bulk_response(&body).unwrap();

        assert_eq!(
            response,
            IndexResponse::Completed(vec![DocumentResult::succeeded("gone", 404)])
        );
    }

    #[test]
    fn test_parse_non_success_status_without_error() {
        let body = json!({"items": [{"index": {"_id": "a", "status": 422}}]});

        let response = parse_bulk_response(&body).unwrap();

        assert_eq!(
            response,
            IndexResponse::PartialFailure(vec![DocumentResult::failed("a", 422, None)])
        );
    }

    #[test]
    fn test_parse_malformed_responses() {
        assert!(matches!(
            parse_bulk_response(&json!({"errors": false})),
            Err(SearchError::ParseError(_))
        ));
        assert!(matches!(
            parse_bulk_response(&json!({"items": [{"index": {"status": 201}}]})),
            Err(SearchError::ParseError(_))
        ));
        assert!(matches!(
            parse_bulk_response(&json!({"items": [{"index": {"_id": "a"}}]})),
            Err(SearchError::ParseError(_))
        ));
        assert!(matches!(
            parse_bulk_response(&json!({"items": ["oops"]})),
            Err(SearchError::ParseError(_))
        ));
    }

    #[test]
    fn test_format_item_error_variants() {
        assert_eq!(format_item_error(&json!("plain")), "plain");
        assert_eq!(format_item_error(&json!({"type": "t"})), "t");
        assert_eq!(format_item_error(&json!({"reason": "r"})), "r");
        assert_eq!(format_item_error(&json!({"code": 1})), "{\"code\":1}");
    }
}
