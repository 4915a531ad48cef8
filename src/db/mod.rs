//! Document store seam.
//!
//! The memory layer only ever talks to [`DocumentStore`]. The default backend
//! is the embedded `convo-docstore` crate, in memory or persisted to a
//! directory:
//!
//! ```toml
//! [store]
//! provider = "embedded"
//! path = "./data/convo"
//! ```

#![allow(missing_docs)]

pub mod embedded;
pub mod traits;

// Re-exports
pub use embedded::EmbeddedStore;
pub use traits::{DeleteOutcome, DocumentStore, DocumentStoreProvider, EnsureOutcome};

pub use convo_docstore::{
    BulkItem, BulkResponse, BulkStatus, CollectionSchema, Document, FieldType, Fields, Filter,
    SearchRequest, SortOrder,
};
