//! Error types for convo-docstore.

use thiserror::Error;

/// Result type for convo-docstore operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in convo-docstore operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Collection already exists.
    #[error("Collection '{0}' already exists")]
    CollectionExists(String),

    /// Collection not found.
    #[error("Collection '{0}' not found")]
    CollectionNotFound(String),

    /// Document not found.
    #[error("Document '{0}' not found")]
    DocumentNotFound(String),

    /// Malformed search request (e.g., result window too large).
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Persistence error (I/O, serialization, etc.).
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
