//! Embedded document store backed by `convo-docstore`.
//!
//! No separate server process is required. Data lives in memory and is
//! optionally snapshotted to a directory on `persist`.
//!
//! # Example
//!
//! ```rust,ignore
//! let store = EmbeddedStore::open(convo_docstore::Config::memory()).await?;
//! store.ensure_collection(".conversational-meta", &schema).await?;
//! let id = store.index_doc(".conversational-meta", fields).await?;
//! ```

use crate::types::{MemoryError, Result};
use async_trait::async_trait;
use convo_docstore::{BulkResponse, CollectionSchema, DocStore, Document, Fields, SearchRequest};
use tracing::{debug, instrument};

use super::traits::{DeleteOutcome, DocumentStore, EnsureOutcome};

// ============================================================================
// Embedded Store Implementation
// ============================================================================

/// [`DocumentStore`] over an in-process [`DocStore`].
#[derive(Clone)]
pub struct EmbeddedStore {
    /// The underlying store (DocStore is Clone and uses Arc internally)
    db: DocStore,
}

impl EmbeddedStore {
    /// Open the embedded store, loading persisted collections if configured.
    pub async fn open(config: convo_docstore::Config) -> Result<Self> {
        let db = DocStore::open(config).await.map_err(|e| {
            MemoryError::Configuration(format!("Failed to open document store: {}", e))
        })?;
        Ok(Self { db })
    }

    /// Wrap an already opened store.
    pub fn from_store(db: DocStore) -> Self {
        Self { db }
    }

    /// Access the underlying store.
    pub fn inner(&self) -> &DocStore {
        &self.db
    }
}

impl From<convo_docstore::Error> for MemoryError {
    fn from(e: convo_docstore::Error) -> Self {
        match e {
            convo_docstore::Error::CollectionNotFound(name) => MemoryError::NotInitialized(name),
            other => MemoryError::Store(other.to_string()),
        }
    }
}

#[async_trait]
impl DocumentStore for EmbeddedStore {
    fn provider_name(&self) -> &'static str {
        "embedded"
    }

    #[instrument(skip(self, schema))]
    async fn ensure_collection(
        &self,
        name: &str,
        schema: &CollectionSchema,
    ) -> Result<EnsureOutcome> {
        match self.db.create_collection(name, schema.clone()).await {
            Ok(()) => Ok(EnsureOutcome::Created),
            Err(convo_docstore::Error::CollectionExists(_)) => {
                debug!(name, "Collection already exists");
                Ok(EnsureOutcome::AlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.db.collection_exists(name))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        Ok(self.db.get(collection, id).await?)
    }

    async fn index_doc(&self, collection: &str, fields: Fields) -> Result<String> {
        Ok(self.db.index(collection, fields).await?)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        Ok(self.db.update(collection, id, fields).await?)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<DeleteOutcome> {
        let deleted = self.db.delete(collection, id).await?;
        Ok(if deleted {
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::NotFound
        })
    }

    async fn bulk_delete(&self, collection: &str, ids: &[String]) -> Result<BulkResponse> {
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
        Ok(self.db.delete_batch(collection, &ids).await?)
    }

    async fn search(&self, collection: &str, request: &SearchRequest) -> Result<Vec<Document>> {
        Ok(self.db.search(collection, request).await?)
    }

    async fn refresh(&self, collection: &str) -> Result<()> {
        Ok(self.db.refresh(collection).await?)
    }

    async fn persist(&self) -> Result<()> {
        Ok(self.db.persist().await?)
    }
}
