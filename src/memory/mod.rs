//! Conversational memory.
//!
//! This module provides:
//! - [`ConversationCollection`]: conversation metadata (create, hit, list, delete)
//! - [`InteractionCollection`]: the turns of each conversation, with paged
//!   draining and cascading bulk delete
//! - [`MemoryCoordinator`]: the façade tying the two together
//! - [`AccessControl`]: per-owner visibility of conversations
//!
//! Everything is stored through a [`DocumentStore`](crate::db::DocumentStore).

pub mod access;
pub mod conversations;
pub mod coordinator;
pub mod interactions;
pub mod paging;
pub mod schema;

pub use access::AccessControl;
pub use conversations::ConversationCollection;
pub use coordinator::MemoryCoordinator;
pub use interactions::InteractionCollection;
pub use paging::{Page, PageRequest};
