//! Test doubles for the document store.
//!
//! - `MockDocumentStore`: a mockall mock for strict call expectations
//! - `FaultyStore`: a real embedded store with switchable failures, for
//!   end-to-end scenarios that need a single step to go wrong

use async_trait::async_trait;
use convo_memory::db::{
    BulkItem, BulkResponse, BulkStatus, CollectionSchema, DeleteOutcome, Document, DocumentStore,
    EmbeddedStore, EnsureOutcome, Fields, SearchRequest,
};
use convo_memory::memory::schema::META_COLLECTION;
use convo_memory::{MemoryError, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

mockall::mock! {
    pub DocumentStore {}

    #[async_trait]
    impl DocumentStore for DocumentStore {
        fn provider_name(&self) -> &'static str;
        async fn ensure_collection(&self, name: &str, schema: &CollectionSchema) -> Result<EnsureOutcome>;
        async fn collection_exists(&self, name: &str) -> Result<bool>;
        async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;
        async fn index_doc(&self, collection: &str, fields: Fields) -> Result<String>;
        async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<()>;
        async fn delete(&self, collection: &str, id: &str) -> Result<DeleteOutcome>;
        async fn bulk_delete(&self, collection: &str, ids: &[String]) -> Result<BulkResponse>;
        async fn search(&self, collection: &str, request: &SearchRequest) -> Result<Vec<Document>>;
        async fn refresh(&self, collection: &str) -> Result<()>;
        async fn persist(&self) -> Result<()>;
    }
}

/// Embedded store that can be told to fail specific operations.
pub struct FaultyStore {
    inner: Arc<EmbeddedStore>,
    fail_meta_updates: AtomicBool,
    /// Number of leading ids of the next bulk delete to report as failed
    /// without deleting them.
    failing_bulk_items: AtomicUsize,
    bulk_calls: AtomicUsize,
}

impl FaultyStore {
    pub fn new(inner: Arc<EmbeddedStore>) -> Self {
        Self {
            inner,
            fail_meta_updates: AtomicBool::new(false),
            failing_bulk_items: AtomicUsize::new(0),
            bulk_calls: AtomicUsize::new(0),
        }
    }

    /// Make every update of a conversation document fail.
    pub fn fail_meta_updates(&self, fail: bool) {
        self.fail_meta_updates.store(fail, Ordering::SeqCst);
    }

    /// Make the next bulk delete fail its first `n` items.
    pub fn fail_next_bulk_items(&self, n: usize) {
        self.failing_bulk_items.store(n, Ordering::SeqCst);
    }

    pub fn bulk_calls(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {
    fn provider_name(&self) -> &'static str {
        "faulty"
    }

    async fn ensure_collection(
        &self,
        name: &str,
        schema: &CollectionSchema,
    ) -> Result<EnsureOutcome> {
        self.inner.ensure_collection(name, schema).await
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        self.inner.collection_exists(name).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.inner.get(collection, id).await
    }

    async fn index_doc(&self, collection: &str, fields: Fields) -> Result<String> {
        self.inner.index_doc(collection, fields).await
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        if collection == META_COLLECTION && self.fail_meta_updates.load(Ordering::SeqCst) {
            return Err(MemoryError::Store("injected update failure".to_string()));
        }
        self.inner.update(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<DeleteOutcome> {
        self.inner.delete(collection, id).await
    }

    async fn bulk_delete(&self, collection: &str, ids: &[String]) -> Result<BulkResponse> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self.failing_bulk_items.swap(0, Ordering::SeqCst).min(ids.len());
        let (failed, passed) = ids.split_at(failing);

        let mut response = self.inner.bulk_delete(collection, passed).await?;
        let mut items: Vec<BulkItem> = failed
            .iter()
            .map(|id| BulkItem {
                id: id.clone(),
                status: BulkStatus::Failed("injected item failure".to_string()),
            })
            .collect();
        items.append(&mut response.items);
        Ok(BulkResponse { items })
    }

    async fn search(&self, collection: &str, request: &SearchRequest) -> Result<Vec<Document>> {
        self.inner.search(collection, request).await
    }

    async fn refresh(&self, collection: &str) -> Result<()> {
        self.inner.refresh(collection).await
    }
}
