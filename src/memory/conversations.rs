//! Conversation metadata: one `ConvoMeta` document per conversation.

use crate::db::{DocumentStore, EnsureOutcome, Fields, Filter, SearchRequest, SortOrder};
use crate::memory::access::AccessControl;
use crate::memory::schema::{meta_fields, meta_schema, META_COLLECTION};
use crate::types::{ConvoMeta, MemoryError, RequestContext, Result};
use chrono::{DateTime, Utc};
use futures::TryFutureExt;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Owns the lifecycle of conversation metadata documents.
#[derive(Clone)]
pub struct ConversationCollection {
    store: Arc<dyn DocumentStore>,
    access: AccessControl,
}

impl ConversationCollection {
    pub fn new(store: Arc<dyn DocumentStore>, access: AccessControl) -> Self {
        Self { store, access }
    }

    pub fn access(&self) -> AccessControl {
        self.access
    }

    /// Create the backing collection if it is absent. Safe to race.
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> Result<()> {
        if self.store.collection_exists(META_COLLECTION).await? {
            return Ok(());
        }

        debug!("No conversation meta collection found, adding it");
        match self
            .store
            .ensure_collection(META_COLLECTION, &meta_schema())
            .inspect_err(|e| error!(error = %e, "Failed to create conversation meta collection"))
            .await?
        {
            EnsureOutcome::Created => info!(collection = META_COLLECTION, "Created collection"),
            EnsureOutcome::AlreadyExists => {
                debug!(collection = META_COLLECTION, "Collection created concurrently")
            }
        }
        Ok(())
    }

    /// Add a new conversation and return its id.
    #[instrument(skip(self, ctx))]
    pub async fn create(&self, ctx: &RequestContext, name: &str) -> Result<String> {
        self.ensure_schema().await?;

        let meta = ConvoMeta::new(name, self.access.owner_for_new(ctx), Utc::now());
        self.store
            .index_doc(META_COLLECTION, meta.to_fields())
            .inspect_ok(|id| debug!(id = %id, "Created conversation"))
            .inspect_err(|e| error!(error = %e, "Failed to create conversation"))
            .await
    }

    /// Conversations visible to the requester, most recently active first.
    ///
    /// Reads the searchable view; call [`refresh`](Self::refresh) first to see
    /// recent writes.
    #[instrument(skip(self, ctx))]
    pub async fn list(
        &self,
        ctx: &RequestContext,
        from: usize,
        limit: usize,
    ) -> Result<Vec<ConvoMeta>> {
        if !self.store.collection_exists(META_COLLECTION).await? {
            return Ok(Vec::new());
        }

        let filter = match self.access.effective_requester(ctx) {
            Some(user) => Filter::term(meta_fields::USER, user),
            None => Filter::MatchAll,
        };
        let request = SearchRequest::new(filter)
            .sort_by(meta_fields::LAST_INTERACTION_TIME, SortOrder::Desc)
            .from(from)
            .size(limit);

        let docs = match self.store.search(META_COLLECTION, &request).await {
            Err(MemoryError::NotInitialized(_)) => return Ok(Vec::new()),
            other => other.inspect_err(|e| error!(error = %e, "Failed to list conversations"))?,
        };

        docs.iter()
            .map(|doc| ConvoMeta::from_document(&doc.id, &doc.fields))
            .collect()
    }

    /// Record one interaction on a conversation.
    ///
    /// Returns `false` without writing if the conversation does not exist.
    /// The read and the write are not guarded against concurrent hits.
    #[instrument(skip(self, ctx))]
    pub async fn hit(
        &self,
        ctx: &RequestContext,
        id: &str,
        hit_time: DateTime<Utc>,
    ) -> Result<bool> {
        let Some(meta) = self.fetch(id).await? else {
            debug!("Conversation not found, nothing to hit");
            return Ok(false);
        };
        self.access.authorize(ctx, id, meta.owner.as_deref())?;

        let mut fields = Fields::new();
        fields.insert(
            meta_fields::NUM_INTERACTIONS.into(),
            Value::from(meta.interaction_count + 1),
        );
        fields.insert(
            meta_fields::LAST_INTERACTION_TIME.into(),
            Value::String(hit_time.to_rfc3339()),
        );

        self.store
            .update(META_COLLECTION, id, fields)
            .inspect_err(|e| error!(error = %e, "Failure touching conversation"))
            .await?;
        Ok(true)
    }

    /// Delete a conversation's metadata. Deleting something already gone
    /// succeeds.
    #[instrument(skip(self, ctx))]
    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> Result<bool> {
        if !self.check_access(ctx, id).await? {
            return Err(MemoryError::access_denied(ctx, id));
        }

        match self.store.delete(META_COLLECTION, id).await {
            Ok(outcome) => {
                debug!(?outcome, "Deleted conversation");
                Ok(true)
            }
            Err(MemoryError::NotInitialized(_)) => Ok(true),
            Err(e) => {
                error!(error = %e, "Failure deleting conversation");
                Err(e)
            }
        }
    }

    /// Whether the requester may see this conversation. Missing
    /// conversations are accessible.
    #[instrument(skip(self, ctx))]
    pub async fn check_access(&self, ctx: &RequestContext, id: &str) -> Result<bool> {
        if self.access.effective_requester(ctx).is_none() {
            return Ok(true);
        }
        Ok(match self.fetch(id).await? {
            None => true,
            Some(meta) => self.access.permits(ctx, meta.owner.as_deref()),
        })
    }

    /// Realtime read of one conversation.
    #[instrument(skip(self, ctx))]
    pub async fn get(&self, ctx: &RequestContext, id: &str) -> Result<Option<ConvoMeta>> {
        let meta = self.fetch(id).await?;
        if let Some(ref meta) = meta {
            self.access.authorize(ctx, id, meta.owner.as_deref())?;
        }
        Ok(meta)
    }

    /// Make recent writes visible to [`list`](Self::list). Skipped while the
    /// collection does not exist.
    pub async fn refresh(&self) -> Result<()> {
        if !self.store.collection_exists(META_COLLECTION).await? {
            return Ok(());
        }
        self.store.refresh(META_COLLECTION).await
    }

    async fn fetch(&self, id: &str) -> Result<Option<ConvoMeta>> {
        let doc = match self.store.get(META_COLLECTION, id).await {
            Err(MemoryError::NotInitialized(_)) => return Ok(None),
            other => other?,
        };
        doc.map(|doc| ConvoMeta::from_document(&doc.id, &doc.fields))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::EmbeddedStore;

    async fn collection(access: AccessControl) -> ConversationCollection {
        let store = EmbeddedStore::open(convo_docstore::Config::memory())
            .await
            .unwrap();
        ConversationCollection::new(Arc::new(store), access)
    }

    #[tokio::test]
    async fn test_create_records_owner() {
        let convos = collection(AccessControl::enabled()).await;
        let alice = RequestContext::for_user("alice");

        let id = convos.create(&alice, "chat").await.unwrap();
        let meta = convos.get(&alice, &id).await.unwrap().unwrap();

        assert_eq!(meta.name, "chat");
        assert_eq!(meta.owner.as_deref(), Some("alice"));
        assert_eq!(meta.interaction_count, 0);
        assert_eq!(meta.created_at, meta.last_hit_at);
    }

    #[tokio::test]
    async fn test_no_owner_when_disabled() {
        let convos = collection(AccessControl::disabled()).await;
        let id = convos
            .create(&RequestContext::for_user("alice"), "")
            .await
            .unwrap();
        let meta = convos
            .get(&RequestContext::anonymous(), &id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(meta.owner, None);
    }

    #[tokio::test]
    async fn test_hit_updates_aggregate() {
        let convos = collection(AccessControl::enabled()).await;
        let ctx = RequestContext::anonymous();
        let id = convos.create(&ctx, "chat").await.unwrap();

        let hit_time = Utc::now();
        assert!(convos.hit(&ctx, &id, hit_time).await.unwrap());

        let meta = convos.get(&ctx, &id).await.unwrap().unwrap();
        assert_eq!(meta.interaction_count, 1);
        assert_eq!(meta.last_hit_at, hit_time);
    }

    #[tokio::test]
    async fn test_hit_missing_is_false() {
        let convos = collection(AccessControl::enabled()).await;
        let ctx = RequestContext::anonymous();

        // Collection absent
        assert!(!convos.hit(&ctx, "nope", Utc::now()).await.unwrap());

        convos.ensure_schema().await.unwrap();
        assert!(!convos.hit(&ctx, "nope", Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_missing_collection_is_empty() {
        let convos = collection(AccessControl::enabled()).await;
        let listed = convos
            .list(&RequestContext::anonymous(), 0, 10)
            .await
            .unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_by_owner() {
        let convos = collection(AccessControl::enabled()).await;
        let alice = RequestContext::for_user("alice");
        let bob = RequestContext::for_user("bob");

        let mine = convos.create(&alice, "a").await.unwrap();
        convos.create(&bob, "b").await.unwrap();
        convos.refresh().await.unwrap();

        let listed = convos.list(&alice, 0, 10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, mine);

        let everyone = convos
            .list(&RequestContext::anonymous(), 0, 10)
            .await
            .unwrap();
        assert_eq!(everyone.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let convos = collection(AccessControl::enabled()).await;
        let ctx = RequestContext::anonymous();

        assert!(convos.delete(&ctx, "never-existed").await.unwrap());

        let id = convos.create(&ctx, "").await.unwrap();
        assert!(convos.delete(&ctx, &id).await.unwrap());
        assert!(convos.delete(&ctx, &id).await.unwrap());
        assert!(convos.get(&ctx, &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_check_access() {
        let convos = collection(AccessControl::enabled()).await;
        let alice = RequestContext::for_user("alice");
        let bob = RequestContext::for_user("bob");

        assert!(convos.check_access(&bob, "missing").await.unwrap());

        let id = convos.create(&alice, "").await.unwrap();
        assert!(convos.check_access(&alice, &id).await.unwrap());
        assert!(!convos.check_access(&bob, &id).await.unwrap());
        assert!(convos
            .check_access(&RequestContext::anonymous(), &id)
            .await
            .unwrap());
    }
}
