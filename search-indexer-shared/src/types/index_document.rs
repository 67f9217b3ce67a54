//! Index document types.
//!
//! This module defines the document structure submitted to the remote search index.
//! The field set is opaque to the indexer: only the key is interpreted.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stable unique identity of a document in the search index.
///
/// Keys are compared by exact string value and must be unique within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentKey(String);

impl DocumentKey {
    /// Create a new document key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DocumentKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for DocumentKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Document representation for the search index.
///
/// # Fields
///
/// - `key`: Unique identity of the document in the index
/// - `fields`: Opaque field payload, sent to the index as-is
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexDocument {
    pub key: DocumentKey,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl IndexDocument {
    /// Create a new document with an empty field set.
    ///
    /// # Example
    ///
    /// ```
    /// use search_indexer_shared::IndexDocument;
    ///
    /// let doc = IndexDocument::new("doc-1")
    ///     .with_field("title", "Quarterly report")
    ///     .with_field("pages", 12);
    /// assert_eq!(doc.key.as_str(), "doc-1");
    /// assert_eq!(doc.fields.len(), 2);
    /// ```
    pub fn new(key: impl Into<DocumentKey>) -> Self {
        Self {
            key: key.into(),
            fields: Map::new(),
        }
    }

    /// Create a document from a key and an existing field map.
    pub fn with_fields(key: impl Into<DocumentKey>, fields: Map<String, Value>) -> Self {
        Self {
            key: key.into(),
            fields,
        }
    }

    /// Set a single field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Build a document from a JSON object, taking its key from `key_field`.
    ///
    /// The key field is removed from the field set. String and number keys are accepted.
    /// Returns `None` if the value is not an object or the key field is missing.
    pub fn from_json_object(value: Value, key_field: &str) -> Option<Self> {
        let Value::Object(mut fields) = value else {
            return None;
        };

        let key = match fields.remove(key_field)? {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            _ => return None,
        };

        Some(Self::with_fields(key, fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_key_blank() {
        assert!(DocumentKey::new("").is_blank());
        assert!(DocumentKey::new("  ").is_blank());
        assert!(!DocumentKey::new("a").is_blank());
    }

    #[test]
    fn test_document_key_serializes_as_string() {
        let key = DocumentKey::from("doc-7");
        assert_eq!(serde_json::to_value(&key).unwrap(), json!("doc-7"));
    }

    #[test]
    fn test_from_json_object() {
        let doc = IndexDocument::from_json_object(
            json!({"id": "abc", "title": "Hello", "size": 3}),
            "id",
        )
        .unwrap();

        assert_eq!(doc.key.as_str(), "abc");
        assert_eq!(doc.fields.len(), 2);
        assert!(!doc.fields.contains_key("id"));
        assert_eq!(doc.fields["title"], json!("Hello"));
    }

    #[test]
    fn test_from_json_object_numeric_key() {
        let doc = IndexDocument::from_json_object(json!({"id": 42}), "id").unwrap();
        assert_eq!(doc.key.as_str(), "42");
    }

    #[test]
    fn test_from_json_object_missing_key() {
        assert!(IndexDocument::from_json_object(json!({"title": "x"}), "id").is_none());
        assert!(IndexDocument::from_json_object(json!(["id"]), "id").is_none());
        assert!(IndexDocument::from_json_object(json!({"id": true}), "id").is_none());
    }
}
