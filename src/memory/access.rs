//! Per-owner access control for conversations.
//!
//! Ownership only applies when access control is switched on *and* the call
//! carries a requester. Otherwise every conversation is visible to everyone
//! and new conversations are created without an owner.

use crate::types::{MemoryError, RequestContext, Result};
use tracing::debug;

/// Decides who may see or change a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessControl {
    enabled: bool,
}

impl Default for AccessControl {
    fn default() -> Self {
        Self::enabled()
    }
}

impl AccessControl {
    pub fn enabled() -> Self {
        Self { enabled: true }
    }

    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The identity ownership is checked against, if any.
    pub fn effective_requester<'a>(&self, ctx: &'a RequestContext) -> Option<&'a str> {
        if self.enabled {
            ctx.requester()
        } else {
            None
        }
    }

    /// Owner to record on a new conversation.
    pub fn owner_for_new(&self, ctx: &RequestContext) -> Option<String> {
        self.effective_requester(ctx).map(str::to_string)
    }

    /// Whether the requester may touch a conversation owned by `owner`.
    ///
    /// A conversation without an owner is only visible when no requester is
    /// in effect.
    pub fn permits(&self, ctx: &RequestContext, owner: Option<&str>) -> bool {
        match self.effective_requester(ctx) {
            None => true,
            Some(requester) => owner == Some(requester),
        }
    }

    /// Like [`permits`](Self::permits) but fails with `AccessDenied`.
    pub fn authorize(
        &self,
        ctx: &RequestContext,
        conversation_id: &str,
        owner: Option<&str>,
    ) -> Result<()> {
        if self.permits(ctx, owner) {
            Ok(())
        } else {
            debug!(conversation_id, "Access denied");
            Err(MemoryError::access_denied(ctx, conversation_id))
        }
    }
}
