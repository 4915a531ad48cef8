//! # convo-memory
//!
//! Conversational memory for chat agents: conversations, the interactions
//! (turns) that make them up, per-owner access checks and cascading
//! deletes, stored in a document store.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use convo_memory::{DocumentStoreProvider, InteractionInput, MemoryCoordinator, RequestContext};
//!
//! #[tokio::main]
//! async fn main() -> convo_memory::Result<()> {
//!     let store = DocumentStoreProvider::default().create_store().await?;
//!     let memory = MemoryCoordinator::with_defaults(store);
//!     let ctx = RequestContext::for_user("alice");
//!
//!     let cid = memory.create_conversation(&ctx, Some("support")).await?;
//!     memory
//!         .put_interaction(&ctx, &cid, InteractionInput::new("hi", "", "hello!", "bot", "{}"))
//!         .await?;
//!
//!     for turn in memory.get_interactions(&cid, 0, 10).await? {
//!         println!("{}", turn);
//!     }
//!
//!     memory.delete_conversation(&ctx, &cid).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`memory`] - Conversation and interaction collections and the coordinator
//! - [`db`] - Document store abstraction and the embedded backend
//! - [`types`] - Domain records and error handling
//! - [`utils`] - TOML configuration and small async helpers
//! - [`cli`] - Command-line front end
//!
//! ## Consistency
//!
//! Writes become searchable only after a refresh. Realtime reads by id
//! (`get_conversation`, access checks) always see the latest write, and the
//! list operations of [`MemoryCoordinator`] refresh before searching.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

/// Command-line parsing and output.
pub mod cli;
/// Document store abstraction.
pub mod db;
/// Conversations, interactions and the coordinator.
pub mod memory;
/// Core types (records, request context, errors).
pub mod types;
/// Configuration and future helpers.
pub mod utils;

// Re-export commonly used types
pub use db::{DocumentStore, DocumentStoreProvider, EmbeddedStore};
pub use memory::{AccessControl, MemoryCoordinator, Page, PageRequest};
pub use types::{ConvoMeta, Interaction, InteractionInput, MemoryError, RequestContext, Result};
pub use utils::config::{ConfigManager, MemoryConfig};
