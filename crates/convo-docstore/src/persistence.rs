//! Persistence layer for convo-docstore.
//!
//! This module handles saving and loading collections to/from disk.

use crate::collection::Collection;
use crate::error::{Error, Result};
use crate::types::{CollectionSchema, StoredDocument};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Collection metadata stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CollectionMetadata {
    name: String,
    schema: CollectionSchema,
}

/// Save a collection to disk.
///
/// Creates the following files:
/// - `{base_path}/{name}/metadata.json` - Collection name and schema
/// - `{base_path}/{name}/documents.json` - Live documents in insertion order
pub async fn save_collection(base_path: &Path, name: &str, collection: &Collection) -> Result<()> {
    let collection_path = base_path.join(name);
    tokio::fs::create_dir_all(&collection_path).await?;

    let metadata = CollectionMetadata {
        name: name.to_string(),
        schema: collection.schema().clone(),
    };
    let metadata_json = serde_json::to_string_pretty(&metadata)
        .map_err(|e| Error::Persistence(format!("Failed to serialize metadata: {}", e)))?;
    tokio::fs::write(collection_path.join("metadata.json"), metadata_json).await?;

    let documents = collection.snapshot();
    let count = documents.len();
    let documents_json = serde_json::to_string(&documents)
        .map_err(|e| Error::Persistence(format!("Failed to serialize documents: {}", e)))?;
    tokio::fs::write(collection_path.join("documents.json"), documents_json).await?;

    info!(name, count, path = ?collection_path, "Saved collection");
    Ok(())
}

/// Load a collection from disk.
pub async fn load_collection(
    base_path: &Path,
    name: &str,
    refresh_on_write: bool,
) -> Result<Collection> {
    let collection_path = base_path.join(name);

    if !collection_path.exists() {
        return Err(Error::CollectionNotFound(name.to_string()));
    }

    let metadata_json = tokio::fs::read_to_string(collection_path.join("metadata.json")).await?;
    let metadata: CollectionMetadata = serde_json::from_str(&metadata_json)
        .map_err(|e| Error::Persistence(format!("Failed to parse metadata: {}", e)))?;

    let documents_path = collection_path.join("documents.json");
    let documents: Vec<StoredDocument> = if documents_path.exists() {
        let documents_json = tokio::fs::read_to_string(&documents_path).await?;
        serde_json::from_str(&documents_json)
            .map_err(|e| Error::Persistence(format!("Failed to parse documents: {}", e)))?
    } else {
        Vec::new()
    };

    debug!(name, count = documents.len(), "Loaded documents");
    Ok(Collection::from_stored(
        metadata.name,
        metadata.schema,
        refresh_on_write,
        documents,
    ))
}

/// Write the list of collection names.
pub async fn save_collection_names(base_path: &Path, names: &[String]) -> Result<()> {
    let data = serde_json::to_string_pretty(names)
        .map_err(|e| Error::Persistence(format!("Failed to serialize collections: {}", e)))?;
    tokio::fs::write(base_path.join("collections.json"), data).await?;
    Ok(())
}

/// Read the list of collection names. A missing file means no collections.
pub async fn load_collection_names(base_path: &Path) -> Result<Vec<String>> {
    let path = base_path.join("collections.json");
    if !path.exists() {
        return Ok(Vec::new());
    }
    let data = tokio::fs::read_to_string(&path).await?;
    serde_json::from_str(&data)
        .map_err(|e| Error::Persistence(format!("Failed to parse collections.json: {}", e)))
}
