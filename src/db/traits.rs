//! Document store abstraction
//!
//! This module provides the `DocumentStore` trait that the memory layer talks
//! to. A store holds named collections of JSON documents, serves realtime
//! reads by id, and exposes searches that only see writes published by an
//! explicit `refresh`.
//!
//! # Example
//!
//! ```rust,ignore
//! use convo_memory::db::{DocumentStore, DocumentStoreProvider};
//!
//! // Ephemeral store (default for development/testing)
//! let store = DocumentStoreProvider::default().create_store().await?;
//!
//! // Embedded store persisted under a directory
//! let store = DocumentStoreProvider::embedded("./data/convo").create_store().await?;
//! ```

use crate::types::{MemoryError, Result};
use async_trait::async_trait;
use convo_docstore::{BulkResponse, CollectionSchema, Document, Fields, SearchRequest};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Result of asking for a collection to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// This call created it.
    Created,
    /// It was already there, possibly created by a concurrent caller.
    AlreadyExists,
}

/// Result of a single-document delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Document store provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum DocumentStoreProvider {
    /// Embedded store persisted to a directory
    Embedded {
        path: PathBuf,
        #[serde(default)]
        refresh_on_write: bool,
        #[serde(default = "default_max_result_window")]
        max_result_window: usize,
    },
    /// Embedded store kept in memory only (lost on exit)
    Memory {
        #[serde(default)]
        refresh_on_write: bool,
        #[serde(default = "default_max_result_window")]
        max_result_window: usize,
    },
}

fn default_max_result_window() -> usize {
    convo_docstore::config::DEFAULT_MAX_RESULT_WINDOW
}

impl Default for DocumentStoreProvider {
    fn default() -> Self {
        DocumentStoreProvider::Memory {
            refresh_on_write: false,
            max_result_window: default_max_result_window(),
        }
    }
}

impl DocumentStoreProvider {
    /// Embedded store at `path` with default settings.
    pub fn embedded(path: impl Into<PathBuf>) -> Self {
        DocumentStoreProvider::Embedded {
            path: path.into(),
            refresh_on_write: false,
            max_result_window: default_max_result_window(),
        }
    }

    /// Create a store from this provider configuration
    pub async fn create_store(&self) -> Result<Arc<dyn DocumentStore>> {
        let config = match self {
            DocumentStoreProvider::Embedded {
                path,
                refresh_on_write,
                max_result_window,
            } => convo_docstore::Config::persistent(path.clone())
                .with_refresh_on_write(*refresh_on_write)
                .with_max_result_window(*max_result_window),
            DocumentStoreProvider::Memory {
                refresh_on_write,
                max_result_window,
            } => convo_docstore::Config::memory()
                .with_refresh_on_write(*refresh_on_write)
                .with_max_result_window(*max_result_window),
        };

        if config.max_result_window == 0 {
            return Err(MemoryError::Configuration(
                "max_result_window must be greater than zero".into(),
            ));
        }

        let store = super::embedded::EmbeddedStore::open(config).await?;
        Ok(Arc::new(store))
    }
}

/// Abstract document store operations
///
/// Reads against a collection that does not exist fail with
/// [`MemoryError::NotInitialized`]; callers decide whether that means
/// "empty" or "create it first".
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Get the name of this store provider.
    fn provider_name(&self) -> &'static str;

    /// Create a collection if it is absent.
    ///
    /// Losing a creation race is reported as [`EnsureOutcome::AlreadyExists`],
    /// never as an error.
    async fn ensure_collection(
        &self,
        name: &str,
        schema: &CollectionSchema,
    ) -> Result<EnsureOutcome>;

    /// Check if a collection exists.
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Realtime read by id. `None` if the document does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Index a new document and return its store-assigned id.
    async fn index_doc(&self, collection: &str, fields: Fields) -> Result<String>;

    /// Merge fields into an existing document.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<()>;

    /// Delete one document.
    async fn delete(&self, collection: &str, id: &str) -> Result<DeleteOutcome>;

    /// Delete many documents in one request, with per-item outcomes.
    async fn bulk_delete(&self, collection: &str, ids: &[String]) -> Result<BulkResponse>;

    /// Search the refreshed view of a collection.
    async fn search(&self, collection: &str, request: &SearchRequest) -> Result<Vec<Document>>;

    /// Make all writes so far visible to search.
    async fn refresh(&self, collection: &str) -> Result<()>;

    /// Flush state to durable storage, if the store has any.
    async fn persist(&self) -> Result<()> {
        Ok(())
    }
}
