//! # convo-docstore
//!
//! An embedded JSON document store with the visibility model of a search
//! cluster: writes are readable by id straight away but only become
//! searchable after an explicit `refresh`.
//!
//! ## Features
//!
//! - **Realtime get**: `get` always sees the latest write
//! - **Refresh-gated search**: `search` reads the last refreshed snapshot
//! - **Typed sorting**: date and integer fields sort by value, not by text
//! - **Bulk delete**: per-item outcomes, with not-found distinct from failure
//! - **Persistence**: optional JSON snapshots on disk
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use convo_docstore::{DocStore, Config, CollectionSchema, FieldType, Filter, SearchRequest, SortOrder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), convo_docstore::Error> {
//!     let store = DocStore::open(Config::memory()).await?;
//!
//!     let schema = CollectionSchema::new().field("timestamp", FieldType::Date);
//!     store.create_collection("turns", schema).await?;
//!
//!     let fields = serde_json::json!({"timestamp": "2024-01-01T00:00:00Z"});
//!     let id = store.index("turns", fields.as_object().cloned().unwrap_or_default()).await?;
//!
//!     store.refresh("turns").await?;
//!     let request = SearchRequest::new(Filter::MatchAll).sort_by("timestamp", SortOrder::Desc);
//!     let hits = store.search("turns", &request).await?;
//!     assert_eq!(hits[0].id, id);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod config;
pub mod error;
pub mod persistence;
pub mod query;
pub mod types;

// Re-exports for convenience
pub use collection::Collection;
pub use config::Config;
pub use error::{Error, Result};
pub use query::{Filter, SearchRequest, Sort, SortOrder};
pub use types::{
    BulkItem, BulkResponse, BulkStatus, CollectionSchema, Document, DocumentId, FieldType, Fields,
};

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// The main document store instance.
///
/// `DocStore` manages multiple named collections. It is cheap to clone and
/// all clones share the same data.
///
/// # Thread Safety
///
/// Uses `scc::HashMap` for the collection registry, which is safe across
/// `.await` points. Each collection guards its documents with a
/// `parking_lot::RwLock` that is never held across an `.await`.
#[derive(Clone)]
pub struct DocStore {
    inner: Arc<DocStoreInner>,
}

struct DocStoreInner {
    config: Config,
    collections: scc::HashMap<String, Arc<Collection>>,
}

impl DocStore {
    /// Open or create a document store with the given configuration.
    ///
    /// ```rust,ignore
    /// // In-memory store
    /// let store = DocStore::open(Config::memory()).await?;
    ///
    /// // Persistent store
    /// let store = DocStore::open(Config::persistent("./data/convo")).await?;
    /// ```
    #[instrument(skip(config), fields(persistent = config.data_path.is_some()))]
    pub async fn open(config: Config) -> Result<Self> {
        info!("Opening document store");

        let store = Self {
            inner: Arc::new(DocStoreInner {
                config: config.clone(),
                collections: scc::HashMap::new(),
            }),
        };

        if let Some(ref path) = config.data_path {
            store.load_collections(path).await?;
        }

        Ok(store)
    }

    /// The configuration this store was opened with.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Create a new collection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CollectionExists`] if the name is taken, including
    /// when a concurrent caller created it first.
    #[instrument(skip(self, schema))]
    pub async fn create_collection(&self, name: &str, schema: CollectionSchema) -> Result<()> {
        info!(name, fields = schema.fields.len(), "Creating collection");

        if self.inner.collections.contains(name) {
            return Err(Error::CollectionExists(name.to_string()));
        }

        let collection = Collection::new(
            name.to_string(),
            schema,
            self.inner.config.refresh_on_write,
        );

        // Insert fails if the key appeared since the check above
        if self
            .inner
            .collections
            .insert(name.to_string(), Arc::new(collection))
            .is_err()
        {
            return Err(Error::CollectionExists(name.to_string()));
        }

        if let Some(ref path) = self.inner.config.data_path {
            tokio::fs::create_dir_all(path).await?;
            persistence::save_collection_names(path, &self.list_collections()).await?;
        }

        Ok(())
    }

    /// Check if a collection exists.
    pub fn collection_exists(&self, name: &str) -> bool {
        self.inner.collections.contains(name)
    }

    /// List all collection names, sorted.
    pub fn list_collections(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.inner.collections.scan(|k, _| {
            names.push(k.clone());
        });
        names.sort();
        names
    }

    /// Get a reference to a collection.
    pub fn get_collection(&self, name: &str) -> Result<Arc<Collection>> {
        self.inner
            .collections
            .read(name, |_, v| v.clone())
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))
    }

    /// Index a new document and return its generated id.
    #[instrument(skip(self, fields), fields(collection))]
    pub async fn index(&self, collection: &str, fields: Fields) -> Result<DocumentId> {
        let col = self.get_collection(collection)?;
        let id = col.index(fields);
        debug!(id, "Indexed document");
        Ok(id)
    }

    /// Realtime read of a document by id.
    pub async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let col = self.get_collection(collection)?;
        Ok(col.get(id))
    }

    /// Merge fields into an existing document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DocumentNotFound`] if the document doesn't exist.
    #[instrument(skip(self, fields), fields(collection, id))]
    pub async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let col = self.get_collection(collection)?;
        col.update(id, fields)?;
        debug!("Updated document");
        Ok(())
    }

    /// Delete a document.
    ///
    /// Returns `true` if the document was found and deleted.
    #[instrument(skip(self), fields(collection, id))]
    pub async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let col = self.get_collection(collection)?;
        let deleted = col.delete(id);
        debug!(deleted, "Delete result");
        Ok(deleted)
    }

    /// Delete several documents, reporting each outcome.
    #[instrument(skip(self, ids), fields(collection, count = ids.len()))]
    pub async fn delete_batch(&self, collection: &str, ids: &[&str]) -> Result<BulkResponse> {
        let col = self.get_collection(collection)?;
        let response = col.delete_batch(ids);
        if response.has_failures() {
            warn!(
                failed = response.failures().count(),
                "Bulk delete had failures"
            );
        }
        debug!(deleted = response.deleted_count(), "Deleted batch");
        Ok(response)
    }

    /// Search the last refreshed snapshot of a collection.
    #[instrument(skip(self, request), fields(collection, from = request.from, size = request.size))]
    pub async fn search(&self, collection: &str, request: &SearchRequest) -> Result<Vec<Document>> {
        let col = self.get_collection(collection)?;
        let results = col.search(request, self.inner.config.max_result_window)?;
        debug!(count = results.len(), "Search completed");
        Ok(results)
    }

    /// Make all pending writes of a collection searchable.
    #[instrument(skip(self))]
    pub async fn refresh(&self, collection: &str) -> Result<()> {
        let col = self.get_collection(collection)?;
        let pending = col.stats().pending_writes;
        col.refresh();
        debug!(published = pending, "Refreshed collection");
        Ok(())
    }

    /// Persist the current state to disk.
    ///
    /// This is a no-op for in-memory stores.
    #[instrument(skip(self))]
    pub async fn persist(&self) -> Result<()> {
        let Some(ref path) = self.inner.config.data_path else {
            debug!("Skipping persist for in-memory store");
            return Ok(());
        };

        info!("Persisting document store to disk");

        let mut to_persist: Vec<(String, Arc<Collection>)> = Vec::new();
        self.inner.collections.scan(|name, collection| {
            to_persist.push((name.clone(), collection.clone()));
        });

        tokio::fs::create_dir_all(path).await?;
        for (name, collection) in &to_persist {
            persistence::save_collection(path, name, collection).await?;
        }
        persistence::save_collection_names(path, &self.list_collections()).await?;

        Ok(())
    }

    async fn load_collections(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            tokio::fs::create_dir_all(path).await?;
            return Ok(());
        }

        let names = persistence::load_collection_names(path).await?;
        for name in names {
            match persistence::load_collection(path, &name, self.inner.config.refresh_on_write)
                .await
            {
                Ok(collection) => {
                    let _ = self
                        .inner
                        .collections
                        .insert(name.clone(), Arc::new(collection));
                    info!(name, "Loaded collection");
                }
                Err(e) => {
                    warn!(name, error = %e, "Failed to load collection, skipping");
                }
            }
        }

        Ok(())
    }
}

/// Statistics about a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Name of the collection.
    pub name: String,
    /// Number of live documents.
    pub document_count: usize,
    /// Number of documents visible to search.
    pub searchable_count: usize,
    /// Documents written since the last refresh.
    pub pending_writes: usize,
    /// Number of fields declared in the schema.
    pub declared_fields: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_index_refresh_search() {
        let store = DocStore::open(Config::memory()).await.unwrap();
        let schema = CollectionSchema::new()
            .field("conversation_id", FieldType::Keyword)
            .field("timestamp", FieldType::Date);
        store.create_collection("turns", schema).await.unwrap();

        let first = store
            .index(
                "turns",
                fields(json!({"conversation_id": "c1", "timestamp": "2024-01-01T00:00:00Z"})),
            )
            .await
            .unwrap();
        let second = store
            .index(
                "turns",
                fields(json!({"conversation_id": "c1", "timestamp": "2024-01-01T00:00:01Z"})),
            )
            .await
            .unwrap();
        store
            .index(
                "turns",
                fields(json!({"conversation_id": "c2", "timestamp": "2024-01-01T00:00:02Z"})),
            )
            .await
            .unwrap();

        let request = SearchRequest::new(Filter::term("conversation_id", "c1"))
            .sort_by("timestamp", SortOrder::Desc);
        assert!(store.search("turns", &request).await.unwrap().is_empty());

        store.refresh("turns").await.unwrap();
        let ids: Vec<_> = store
            .search("turns", &request)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[tokio::test]
    async fn test_collection_lifecycle() {
        let store = DocStore::open(Config::memory()).await.unwrap();

        assert!(!store.collection_exists("test"));
        store
            .create_collection("test", CollectionSchema::new())
            .await
            .unwrap();
        assert!(store.collection_exists("test"));
        assert_eq!(store.list_collections(), vec!["test".to_string()]);

        assert!(matches!(
            store.get("other", "x").await,
            Err(Error::CollectionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_collection_error() {
        let store = DocStore::open(Config::memory()).await.unwrap();
        store
            .create_collection("test", CollectionSchema::new())
            .await
            .unwrap();

        let result = store.create_collection("test", CollectionSchema::new()).await;
        assert!(matches!(result, Err(Error::CollectionExists(_))));
    }

    #[tokio::test]
    async fn test_concurrent_create_has_one_winner() {
        let store = DocStore::open(Config::memory()).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .create_collection("race", CollectionSchema::new())
                        .await
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => created += 1,
                Err(Error::CollectionExists(_)) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn test_persist_and_reopen() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = Config::persistent(temp_dir.path());

        let id = {
            let store = DocStore::open(config.clone()).await.unwrap();
            store
                .create_collection("meta", CollectionSchema::new())
                .await
                .unwrap();
            let id = store
                .index("meta", fields(json!({"name": "chat"})))
                .await
                .unwrap();
            store.persist().await.unwrap();
            id
        };

        let reopened = DocStore::open(config).await.unwrap();
        assert!(reopened.collection_exists("meta"));
        let doc = reopened.get("meta", &id).await.unwrap().unwrap();
        assert_eq!(doc.get_str("name"), Some("chat"));
        let stats = reopened.get_collection("meta").unwrap().stats();
        assert_eq!(stats.searchable_count, 1);
        assert_eq!(stats.pending_writes, 0);
    }
}
