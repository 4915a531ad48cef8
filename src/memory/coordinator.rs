//! Façade over the two collections.
//!
//! Keeps a conversation's aggregate in step with its interactions: adding an
//! interaction also hits the conversation, and deleting a conversation
//! cascades into its interactions.

use crate::db::DocumentStore;
use crate::memory::access::AccessControl;
use crate::memory::conversations::ConversationCollection;
use crate::memory::interactions::InteractionCollection;
use crate::memory::paging::{Page, PageRequest};
use crate::types::{ConvoMeta, Interaction, InteractionInput, MemoryError, RequestContext, Result};
use crate::utils::config::MemorySettings;
use crate::utils::future_ext::FinallyExt;
use chrono::Utc;
use futures::TryFutureExt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Entry point for conversational memory.
#[derive(Clone)]
pub struct MemoryCoordinator {
    conversations: ConversationCollection,
    interactions: InteractionCollection,
    default_max_results: usize,
}

impl MemoryCoordinator {
    pub fn new(store: Arc<dyn DocumentStore>, settings: &MemorySettings) -> Self {
        let access = if settings.access_control {
            AccessControl::enabled()
        } else {
            AccessControl::disabled()
        };

        Self {
            conversations: ConversationCollection::new(store.clone(), access),
            interactions: InteractionCollection::new(store)
                .with_drain_page_size(settings.drain_page_size),
            default_max_results: settings.default_max_results,
        }
    }

    /// Coordinator with access control on and default page sizes.
    pub fn with_defaults(store: Arc<dyn DocumentStore>) -> Self {
        Self::new(store, &MemorySettings::default())
    }

    pub fn conversations(&self) -> &ConversationCollection {
        &self.conversations
    }

    pub fn interactions(&self) -> &InteractionCollection {
        &self.interactions
    }

    /// Page request from an optional continuation token and page size.
    pub fn page_request(&self, next_token: Option<usize>, max_results: Option<usize>) -> PageRequest {
        PageRequest::from_token(next_token, max_results, self.default_max_results)
    }

    /// Start a new conversation owned by the requester.
    #[instrument(skip(self, ctx))]
    pub async fn create_conversation(
        &self,
        ctx: &RequestContext,
        name: Option<&str>,
    ) -> Result<String> {
        self.conversations
            .create(ctx, name.unwrap_or_default())
            .inspect_ok(|id| info!(conversation_id = %id, "Created conversation"))
            .await
    }

    /// Add an interaction to a conversation and return its id.
    ///
    /// Updating the conversation's aggregate is best effort: if it fails the
    /// interaction is still stored.
    #[instrument(skip(self, ctx, input))]
    pub async fn put_interaction(
        &self,
        ctx: &RequestContext,
        conversation_id: &str,
        input: InteractionInput,
    ) -> Result<String> {
        let timestamp = Utc::now();

        match self.conversations.hit(ctx, conversation_id, timestamp).await {
            Ok(true) => debug!("Conversation hit"),
            Ok(false) => debug!("Conversation not found, aggregate not updated"),
            Err(e) => warn!(error = %e, "Failed to update conversation aggregate"),
        }

        self.interactions
            .create(conversation_id, input, timestamp)
            .await
    }

    /// A page of a conversation's interactions, most recent first, including
    /// everything written so far.
    #[instrument(skip(self))]
    pub async fn get_interactions(
        &self,
        conversation_id: &str,
        from: usize,
        limit: usize,
    ) -> Result<Vec<Interaction>> {
        self.interactions.refresh().await?;
        self.interactions.list(conversation_id, from, limit).await
    }

    /// Every interaction of a conversation, most recent first, fetched page
    /// by page with the default page size.
    #[instrument(skip(self))]
    pub async fn get_all_interactions(&self, conversation_id: &str) -> Result<Vec<Interaction>> {
        self.interactions.refresh().await?;
        self.interactions
            .list_all(conversation_id, self.default_max_results)
            .await
    }

    /// The requester's conversations, most recently active first, including
    /// everything written so far.
    #[instrument(skip(self, ctx))]
    pub async fn list_conversations(
        &self,
        ctx: &RequestContext,
        from: usize,
        limit: usize,
    ) -> Result<Vec<ConvoMeta>> {
        self.conversations.refresh().await?;
        self.conversations.list(ctx, from, limit).await
    }

    /// Delete a conversation and then all of its interactions.
    ///
    /// Returns `true` only if both steps succeeded. If the cascade fails the
    /// conversation is gone but some interactions remain.
    #[instrument(skip(self, ctx))]
    pub async fn delete_conversation(&self, ctx: &RequestContext, id: &str) -> Result<bool> {
        let started = Instant::now();
        self.delete_cascading(ctx, id)
            .finally(|| {
                debug!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Delete conversation finished"
                )
            })
            .await
    }

    async fn delete_cascading(&self, ctx: &RequestContext, id: &str) -> Result<bool> {
        if !self.conversations.check_access(ctx, id).await? {
            return Err(MemoryError::access_denied(ctx, id));
        }

        if !self.conversations.delete(ctx, id).await? {
            return Ok(false);
        }

        let cascaded = self.interactions.delete_all_for_conversation(id).await?;
        if !cascaded {
            warn!("Conversation deleted but some interactions could not be removed");
        }
        Ok(cascaded)
    }

    /// Realtime read of one conversation.
    pub async fn get_conversation(
        &self,
        ctx: &RequestContext,
        id: &str,
    ) -> Result<Option<ConvoMeta>> {
        self.conversations.get(ctx, id).await
    }

    /// [`list_conversations`](Self::list_conversations) with a continuation token.
    pub async fn list_conversations_page(
        &self,
        ctx: &RequestContext,
        request: PageRequest,
    ) -> Result<Page<ConvoMeta>> {
        request.validate()?;
        let items = self
            .list_conversations(ctx, request.from, request.max_results)
            .await?;
        Ok(Page::from_items(items, &request))
    }

    /// [`get_interactions`](Self::get_interactions) with a continuation token.
    pub async fn get_interactions_page(
        &self,
        conversation_id: &str,
        request: PageRequest,
    ) -> Result<Page<Interaction>> {
        request.validate()?;
        let items = self
            .get_interactions(conversation_id, request.from, request.max_results)
            .await?;
        Ok(Page::from_items(items, &request))
    }
}
