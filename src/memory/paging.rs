//! Offset paging with continuation tokens.
//!
//! A caller asks for `max_results` items starting at offset `from`. The
//! response carries a `next_token` (the next offset) when the page came back
//! full, which is the only signal the store gives that more may exist.

use crate::memory::schema::DEFAULT_MAX_RESULTS;
use crate::types::{MemoryError, Result};
use serde::{Deserialize, Serialize};

/// Which slice of a result set to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub from: usize,
    pub max_results: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            from: 0,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl PageRequest {
    pub fn new(from: usize, max_results: usize) -> Self {
        Self { from, max_results }
    }

    /// Build a request from an optional continuation token and page size.
    pub fn from_token(
        next_token: Option<usize>,
        max_results: Option<usize>,
        default_max_results: usize,
    ) -> Self {
        Self {
            from: next_token.unwrap_or(0),
            max_results: max_results.unwrap_or(default_max_results),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_results == 0 {
            return Err(MemoryError::InvalidArgument(
                "maxResults must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Offset of the next page, or `None` if this page was short.
    pub next_token: Option<usize>,
}

impl<T> Page<T> {
    pub fn from_items(items: Vec<T>, request: &PageRequest) -> Self {
        let next_token = if items.len() < request.max_results {
            None
        } else {
            Some(request.from + request.max_results)
        };
        Self { items, next_token }
    }

    pub fn has_more(&self) -> bool {
        self.next_token.is_some()
    }
}
