//! Document collection.
//!
//! A collection is a named container for JSON documents with a field schema.
//! It keeps two views of its contents: the live set, which `get` reads and
//! every write touches, and the searchable snapshot, which only changes on
//! `refresh`.

use crate::error::{Error, Result};
use crate::query::{compare_documents, SearchRequest};
use crate::types::{
    BulkItem, BulkResponse, BulkStatus, CollectionSchema, Document, DocumentId, Fields,
    StoredDocument,
};
use crate::CollectionStats;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// A named collection of documents.
pub struct Collection {
    /// Collection name.
    name: String,
    /// Field types used for sorting.
    schema: CollectionSchema,
    /// Publish each write to the searchable snapshot immediately.
    refresh_on_write: bool,
    state: RwLock<CollectionState>,
}

#[derive(Default)]
struct CollectionState {
    live: HashMap<DocumentId, StoredDocument>,
    visible: HashMap<DocumentId, StoredDocument>,
    next_seq: u64,
    /// Documents written since the last refresh.
    dirty: HashSet<DocumentId>,
}

impl CollectionState {
    fn mark(&mut self, id: &str) {
        self.dirty.insert(id.to_string());
    }

    /// Copy only the documents touched since the last refresh into the
    /// searchable view.
    fn publish(&mut self) {
        for id in std::mem::take(&mut self.dirty) {
            match self.live.get(&id) {
                Some(doc) => {
                    self.visible.insert(id, doc.clone());
                }
                None => {
                    self.visible.remove(&id);
                }
            }
        }
    }
}

impl Collection {
    /// Create an empty collection.
    pub fn new(name: String, schema: CollectionSchema, refresh_on_write: bool) -> Self {
        Self {
            name,
            schema,
            refresh_on_write,
            state: RwLock::new(CollectionState::default()),
        }
    }

    /// Rebuild a collection from persisted documents. Loaded documents are
    /// searchable straight away.
    pub(crate) fn from_stored(
        name: String,
        schema: CollectionSchema,
        refresh_on_write: bool,
        documents: Vec<StoredDocument>,
    ) -> Self {
        let next_seq = documents.iter().map(|d| d.seq + 1).max().unwrap_or(0);
        let live: HashMap<_, _> = documents.into_iter().map(|d| (d.id.clone(), d)).collect();
        let state = CollectionState {
            visible: live.clone(),
            live,
            next_seq,
            dirty: HashSet::new(),
        };

        Self {
            name,
            schema,
            refresh_on_write,
            state: RwLock::new(state),
        }
    }

    /// Get the collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the field schema.
    pub fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    /// Index a new document and return its generated id.
    pub fn index(&self, fields: Fields) -> DocumentId {
        let id = Uuid::new_v4().to_string();
        let mut state = self.state.write();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.live.insert(
            id.clone(),
            StoredDocument {
                id: id.clone(),
                seq,
                fields,
            },
        );
        self.after_write(&mut state, &id);
        id
    }

    /// Realtime read of a document, including unrefreshed writes.
    pub fn get(&self, id: &str) -> Option<Document> {
        self.state.read().live.get(id).map(StoredDocument::to_document)
    }

    /// Merge `fields` into an existing document.
    pub fn update(&self, id: &str, fields: Fields) -> Result<()> {
        let mut state = self.state.write();
        let doc = state
            .live
            .get_mut(id)
            .ok_or_else(|| Error::DocumentNotFound(id.to_string()))?;
        doc.fields.extend(fields);
        self.after_write(&mut state, id);
        Ok(())
    }

    /// Delete a document. Returns whether it existed.
    pub fn delete(&self, id: &str) -> bool {
        let mut state = self.state.write();
        let removed = state.live.remove(id).is_some();
        if removed {
            self.after_write(&mut state, id);
        }
        removed
    }

    /// Delete several documents, reporting the outcome of each.
    pub fn delete_batch(&self, ids: &[&str]) -> BulkResponse {
        let mut state = self.state.write();

        let items = ids
            .iter()
            .map(|&id| {
                let status = if id.is_empty() {
                    BulkStatus::Failed("document id must not be empty".to_string())
                } else if state.live.remove(id).is_some() {
                    state.mark(id);
                    BulkStatus::Deleted
                } else {
                    BulkStatus::NotFound
                };
                BulkItem {
                    id: id.to_string(),
                    status,
                }
            })
            .collect();

        if self.refresh_on_write {
            state.publish();
        }
        BulkResponse { items }
    }

    /// Search the last refreshed snapshot.
    pub fn search(&self, request: &SearchRequest, max_result_window: usize) -> Result<Vec<Document>> {
        let window = request.from.saturating_add(request.size);
        if window > max_result_window {
            return Err(Error::InvalidQuery(format!(
                "Result window is too large, from + size must be less than or equal to: [{}] but was [{}]",
                max_result_window, window
            )));
        }

        let state = self.state.read();
        let mut hits: Vec<&StoredDocument> = state
            .visible
            .values()
            .filter(|doc| request.filter.matches(&doc.fields))
            .collect();

        match &request.sort {
            Some(sort) => hits.sort_by(|a, b| compare_documents(&self.schema, sort, a, b)),
            None => hits.sort_by_key(|doc| doc.seq),
        }

        Ok(hits
            .into_iter()
            .skip(request.from)
            .take(request.size)
            .map(StoredDocument::to_document)
            .collect())
    }

    /// Publish all pending writes to the searchable snapshot. A no-op when
    /// nothing changed since the last refresh.
    pub fn refresh(&self) {
        if self.state.read().dirty.is_empty() {
            return;
        }
        self.state.write().publish();
    }

    /// Copy of every live document, for persistence.
    pub(crate) fn snapshot(&self) -> Vec<StoredDocument> {
        let state = self.state.read();
        let mut docs: Vec<_> = state.live.values().cloned().collect();
        docs.sort_by_key(|doc| doc.seq);
        docs
    }

    /// Get collection statistics.
    pub fn stats(&self) -> CollectionStats {
        let state = self.state.read();
        CollectionStats {
            name: self.name.clone(),
            document_count: state.live.len(),
            searchable_count: state.visible.len(),
            pending_writes: state.dirty.len(),
            declared_fields: self.schema.fields.len(),
        }
    }

    fn after_write(&self, state: &mut CollectionState, id: &str) {
        state.mark(id);
        if self.refresh_on_write {
            state.publish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Filter, SortOrder};
    use crate::types::FieldType;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    fn collection() -> Collection {
        Collection::new(
            "test".to_string(),
            CollectionSchema::new().field("n", FieldType::Integer),
            false,
        )
    }

    #[test]
    fn test_search_waits_for_refresh() {
        let col = collection();
        let id = col.index(fields(json!({"n": 1})));

        assert!(col.get(&id).is_some());
        assert!(col.search(&SearchRequest::default(), 100).unwrap().is_empty());
        assert_eq!(col.stats().pending_writes, 1);

        col.refresh();
        let hits = col.search(&SearchRequest::default(), 100).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, id);
        assert_eq!(col.stats().pending_writes, 0);
    }

    #[test]
    fn test_refresh_publishes_only_changes() {
        let col = collection();
        let kept = col.index(fields(json!({"n": 1})));
        let gone = col.index(fields(json!({"n": 2})));
        col.refresh();

        col.update(&kept, fields(json!({"n": 10}))).unwrap();
        col.update(&kept, fields(json!({"n": 11}))).unwrap();
        assert!(col.delete(&gone));
        let transient = col.index(fields(json!({"n": 3})));
        assert!(col.delete(&transient));
        // distinct documents, not individual writes
        assert_eq!(col.stats().pending_writes, 3);

        let before = col.search(&SearchRequest::default(), 100).unwrap();
        assert_eq!(before.len(), 2);

        col.refresh();
        let after = col.search(&SearchRequest::default(), 100).unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].id, kept);
        assert_eq!(after[0].get_i64("n"), Some(11));
        assert_eq!(col.stats().pending_writes, 0);

        // nothing pending: the view is left as is
        col.refresh();
        assert_eq!(col.stats().searchable_count, 1);
    }

    #[test]
    fn test_delete_batch_publishes_on_refresh() {
        let col = collection();
        let ids: Vec<_> = (0..3).map(|n| col.index(fields(json!({"n": n})))).collect();
        col.refresh();

        col.delete_batch(&[ids[0].as_str(), ids[2].as_str()]);
        assert_eq!(col.search(&SearchRequest::default(), 100).unwrap().len(), 3);

        col.refresh();
        let hits = col.search(&SearchRequest::default(), 100).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, ids[1]);
    }

    #[test]
    fn test_refresh_on_write() {
        let col = Collection::new("test".to_string(), CollectionSchema::new(), true);
        col.index(fields(json!({"n": 1})));
        assert_eq!(col.search(&SearchRequest::default(), 100).unwrap().len(), 1);
    }

    #[test]
    fn test_update_merges_fields() {
        let col = collection();
        let id = col.index(fields(json!({"n": 1, "name": "a"})));
        col.update(&id, fields(json!({"n": 2}))).unwrap();

        let doc = col.get(&id).unwrap();
        assert_eq!(doc.get_i64("n"), Some(2));
        assert_eq!(doc.get_str("name"), Some("a"));

        let missing = col.update("nope", Fields::new());
        assert!(matches!(missing, Err(Error::DocumentNotFound(_))));
    }

    #[test]
    fn test_delete_batch_statuses() {
        let col = collection();
        let id = col.index(fields(json!({"n": 1})));

        let response = col.delete_batch(&[id.as_str(), "missing", ""]);
        assert_eq!(response.items[0].status, BulkStatus::Deleted);
        assert_eq!(response.items[1].status, BulkStatus::NotFound);
        assert!(matches!(response.items[2].status, BulkStatus::Failed(_)));
        assert_eq!(col.stats().document_count, 0);
    }

    #[test]
    fn test_sorted_paging() {
        let col = collection();
        for n in 0..5 {
            col.index(fields(json!({"n": n})));
        }
        col.refresh();

        let request = SearchRequest::new(Filter::MatchAll)
            .sort_by("n", SortOrder::Desc)
            .from(1)
            .size(2);
        let page: Vec<_> = col
            .search(&request, 100)
            .unwrap()
            .iter()
            .filter_map(|d| d.get_i64("n"))
            .collect();
        assert_eq!(page, vec![3, 2]);
    }

    #[test]
    fn test_result_window_limit() {
        let col = collection();
        let request = SearchRequest::default().from(95).size(10);
        assert!(matches!(
            col.search(&request, 100),
            Err(Error::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_from_stored_is_searchable() {
        let docs = vec![StoredDocument {
            id: "a".to_string(),
            seq: 7,
            fields: fields(json!({"n": 1})),
        }];
        let col = Collection::from_stored("test".to_string(), CollectionSchema::new(), false, docs);
        assert_eq!(col.search(&SearchRequest::default(), 100).unwrap().len(), 1);

        col.index(Fields::new());
        let seqs: Vec<_> = col.snapshot().iter().map(|d| d.seq).collect();
        assert_eq!(seqs, vec![7, 8]);
    }
}
