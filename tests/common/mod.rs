//! Shared helpers for the integration tests.

#![allow(dead_code)]

pub mod mocks;

use chrono::{DateTime, Duration, Utc};
use convo_memory::db::{DocumentStore, EmbeddedStore};
use convo_memory::utils::config::MemorySettings;
use convo_memory::{InteractionInput, MemoryCoordinator};
use std::sync::Arc;

/// A fresh in-memory embedded store.
pub async fn memory_store() -> Arc<EmbeddedStore> {
    Arc::new(
        EmbeddedStore::open(convo_docstore::Config::memory())
            .await
            .expect("in-memory store"),
    )
}

/// Coordinator over a fresh in-memory store with default settings.
pub async fn coordinator() -> MemoryCoordinator {
    MemoryCoordinator::with_defaults(memory_store().await)
}

/// Coordinator over `store` with access control switched on or off.
pub fn coordinator_with(store: Arc<dyn DocumentStore>, access_control: bool) -> MemoryCoordinator {
    let settings = MemorySettings {
        access_control,
        ..MemorySettings::default()
    };
    MemoryCoordinator::new(store, &settings)
}

/// A minimal interaction with the given user input.
pub fn turn(input: &str) -> InteractionInput {
    InteractionInput::new(input, "p", "r", "a", "{}")
}

/// `n` distinct timestamps, one millisecond apart, oldest first.
pub fn timestamps(n: usize) -> Vec<DateTime<Utc>> {
    let base = Utc::now();
    (0..n)
        .map(|i| base + Duration::milliseconds(i as i64))
        .collect()
}
