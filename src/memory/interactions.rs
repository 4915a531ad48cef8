//! Interaction records: the turns of every conversation.

use crate::db::{DocumentStore, EnsureOutcome, Filter, SearchRequest, SortOrder};
use crate::memory::schema::{
    interaction_fields, interactions_schema, DEFAULT_DRAIN_PAGE_SIZE, INTERACTIONS_COLLECTION,
};
use crate::types::{Interaction, InteractionInput, MemoryError, Result};
use async_stream::stream;
use chrono::{DateTime, Utc};
use futures::{Stream, TryFutureExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Owns the lifecycle of interaction documents.
#[derive(Clone)]
pub struct InteractionCollection {
    store: Arc<dyn DocumentStore>,
    drain_page_size: usize,
}

impl InteractionCollection {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            drain_page_size: DEFAULT_DRAIN_PAGE_SIZE,
        }
    }

    /// Page size used by [`delete_all_for_conversation`](Self::delete_all_for_conversation).
    pub fn with_drain_page_size(mut self, page_size: usize) -> Self {
        self.drain_page_size = page_size;
        self
    }

    /// Create the backing collection if it is absent. Safe to race.
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> Result<()> {
        if self.store.collection_exists(INTERACTIONS_COLLECTION).await? {
            return Ok(());
        }

        debug!("No interactions collection found, adding it");
        match self
            .store
            .ensure_collection(INTERACTIONS_COLLECTION, &interactions_schema())
            .inspect_err(|e| error!(error = %e, "Failed to create interactions collection"))
            .await?
        {
            EnsureOutcome::Created => {
                info!(collection = INTERACTIONS_COLLECTION, "Created collection")
            }
            EnsureOutcome::AlreadyExists => {
                debug!(collection = INTERACTIONS_COLLECTION, "Collection created concurrently")
            }
        }
        Ok(())
    }

    /// Store a new interaction and return its id.
    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        conversation_id: &str,
        input: InteractionInput,
        timestamp: DateTime<Utc>,
    ) -> Result<String> {
        self.ensure_schema().await?;

        let interaction = input.into_interaction(conversation_id, timestamp);
        self.store
            .index_doc(INTERACTIONS_COLLECTION, interaction.to_fields())
            .inspect_ok(|id| debug!(id = %id, "Created interaction"))
            .inspect_err(|e| error!(error = %e, "Failed to create interaction"))
            .await
    }

    /// One page of a conversation's interactions, most recent first.
    ///
    /// Reads the searchable view; call [`refresh`](Self::refresh) first to see
    /// recent writes.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        conversation_id: &str,
        from: usize,
        limit: usize,
    ) -> Result<Vec<Interaction>> {
        if !self.store.collection_exists(INTERACTIONS_COLLECTION).await? {
            return Ok(Vec::new());
        }

        let request = SearchRequest::new(Filter::term(
            interaction_fields::CONVERSATION_ID,
            conversation_id,
        ))
        .sort_by(interaction_fields::TIMESTAMP, SortOrder::Desc)
        .from(from)
        .size(limit);

        let docs = match self.store.search(INTERACTIONS_COLLECTION, &request).await {
            Err(MemoryError::NotInitialized(_)) => return Ok(Vec::new()),
            other => other?,
        };

        docs.iter()
            .map(|doc| Interaction::from_document(&doc.id, &doc.fields))
            .collect()
    }

    /// Walk a conversation page by page starting at offset `from`.
    ///
    /// Each page is fetched only after the previous one arrived. The stream
    /// ends after the first page shorter than `page_size`, or after the
    /// first error.
    pub fn pages<'a>(
        &'a self,
        conversation_id: &'a str,
        from: usize,
        page_size: usize,
    ) -> impl Stream<Item = Result<Vec<Interaction>>> + Send + 'a {
        stream! {
            if page_size == 0 {
                yield Err(MemoryError::InvalidArgument("maxResults must be positive".to_string()));
            } else {
                let mut offset = from;
                loop {
                    match self.list(conversation_id, offset, page_size).await {
                        Ok(page) => {
                            let last = page.len() < page_size;
                            offset += page_size;
                            yield Ok(page);
                            if last {
                                break;
                            }
                        }
                        Err(e) => {
                            yield Err(e);
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Every interaction of a conversation, most recent first.
    #[instrument(skip(self))]
    pub async fn list_all(
        &self,
        conversation_id: &str,
        page_size: usize,
    ) -> Result<Vec<Interaction>> {
        if page_size == 0 {
            return Err(MemoryError::InvalidArgument(
                "maxResults must be positive".to_string(),
            ));
        }
        self.pages(conversation_id, 0, page_size).try_concat().await
    }

    /// Delete every interaction of a conversation.
    ///
    /// Drains in rounds: refresh, read the first `drain_page_size`
    /// interactions, bulk delete them, repeat. Reads never go past the first
    /// page, so the store's result window does not bound how many
    /// interactions can be removed.
    ///
    /// Returns `false` as soon as a bulk request reports a failed item.
    /// Calling it again after a partial failure is safe.
    #[instrument(skip(self))]
    pub async fn delete_all_for_conversation(&self, conversation_id: &str) -> Result<bool> {
        if !self.store.collection_exists(INTERACTIONS_COLLECTION).await? {
            return Ok(true);
        }

        let mut deleted = 0;
        loop {
            self.refresh().await?;
            let batch = self
                .list(conversation_id, 0, self.drain_page_size)
                .inspect_err(|e| {
                    error!(error = %e, "Failure while listing interactions to delete")
                })
                .await?;
            if batch.is_empty() {
                break;
            }

            let last = batch.len() < self.drain_page_size;
            let ids: Vec<String> = batch.into_iter().map(|i| i.id).collect();
            let response = self.store.bulk_delete(INTERACTIONS_COLLECTION, &ids).await?;

            if response.has_failures() {
                warn!(
                    requested = ids.len(),
                    failed = response.failures().count(),
                    deleted,
                    "Bulk delete of interactions had failures"
                );
                return Ok(false);
            }
            let removed = response.deleted_count();
            deleted += removed;

            // a round that removed nothing means another drain got there first
            if last || removed == 0 {
                break;
            }
        }

        if deleted == 0 {
            debug!("No interactions to delete");
        } else {
            info!(deleted, "Deleted interactions");
        }
        Ok(true)
    }

    /// Make recent writes visible to [`list`](Self::list). Skipped while the
    /// collection does not exist.
    pub async fn refresh(&self) -> Result<()> {
        if !self.store.collection_exists(INTERACTIONS_COLLECTION).await? {
            return Ok(());
        }
        self.store.refresh(INTERACTIONS_COLLECTION).await
    }
}
