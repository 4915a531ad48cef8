//! Common types for convo-docstore.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unique identifier for a document in a collection.
pub type DocumentId = String;

/// The JSON fields of a document.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// A document as returned by `get` and `search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Store-assigned identifier.
    pub id: DocumentId,
    /// Source fields.
    pub fields: Fields,
}

impl Document {
    /// Create a new document.
    pub fn new(id: impl Into<DocumentId>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Get a string field.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field)?.as_str()
    }

    /// Get an integer field.
    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.fields.get(field)?.as_i64()
    }
}

/// How a field is interpreted when sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Exact-match string.
    Keyword,
    /// Free text. Sorted lexically like a keyword.
    Text,
    /// RFC 3339 timestamp. Sorted chronologically.
    Date,
    /// Integer. Sorted numerically.
    Integer,
}

/// Field typing of a collection.
///
/// Fields that are not declared are still stored; they sort lexically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    /// Declared fields and their types.
    pub fields: BTreeMap<String, FieldType>,
}

impl CollectionSchema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field.
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.insert(name.into(), field_type);
        self
    }

    /// Look up the declared type of a field.
    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.fields.get(name).copied()
    }
}

/// Outcome of one item in a bulk delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum BulkStatus {
    /// The document was removed.
    Deleted,
    /// The document did not exist. Not a failure.
    NotFound,
    /// The item could not be processed.
    Failed(String),
}

/// One item of a bulk response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItem {
    /// Document the item refers to.
    pub id: DocumentId,
    /// What happened to it.
    pub status: BulkStatus,
}

/// Per-item results of a bulk delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkResponse {
    /// One entry per requested id, in request order.
    pub items: Vec<BulkItem>,
}

impl BulkResponse {
    /// Whether any item failed.
    pub fn has_failures(&self) -> bool {
        self.items
            .iter()
            .any(|item| matches!(item.status, BulkStatus::Failed(_)))
    }

    /// The failed items.
    pub fn failures(&self) -> impl Iterator<Item = &BulkItem> {
        self.items
            .iter()
            .filter(|item| matches!(item.status, BulkStatus::Failed(_)))
    }

    /// Number of documents actually removed.
    pub fn deleted_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.status == BulkStatus::Deleted)
            .count()
    }
}

/// Internal representation of a stored document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredDocument {
    /// External string ID.
    pub id: DocumentId,
    /// Insertion sequence, used as the sort tie-break.
    pub seq: u64,
    /// Source fields.
    pub fields: Fields,
}

impl StoredDocument {
    pub fn to_document(&self) -> Document {
        Document::new(self.id.clone(), self.fields.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_accessors() {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), json!("chat"));
        fields.insert("count".to_string(), json!(3));
        let doc = Document::new("doc1", fields);

        assert_eq!(doc.get_str("name"), Some("chat"));
        assert_eq!(doc.get_i64("count"), Some(3));
        assert_eq!(doc.get_str("count"), None);
        assert_eq!(doc.get_i64("missing"), None);
    }

    #[test]
    fn test_schema_builder() {
        let schema = CollectionSchema::new()
            .field("timestamp", FieldType::Date)
            .field("count", FieldType::Integer);

        assert_eq!(schema.field_type("timestamp"), Some(FieldType::Date));
        assert_eq!(schema.field_type("count"), Some(FieldType::Integer));
        assert_eq!(schema.field_type("other"), None);
    }

    #[test]
    fn test_bulk_response_failures() {
        let response = BulkResponse {
            items: vec![
                BulkItem {
                    id: "a".into(),
                    status: BulkStatus::Deleted,
                },
                BulkItem {
                    id: "b".into(),
                    status: BulkStatus::NotFound,
                },
            ],
        };
        assert!(!response.has_failures());
        assert_eq!(response.deleted_count(), 1);

        let mut failed = response.clone();
        failed.items.push(BulkItem {
            id: "c".into(),
            status: BulkStatus::Failed("shard unavailable".into()),
        });
        assert!(failed.has_failures());
        assert_eq!(failed.failures().count(), 1);
    }
}
