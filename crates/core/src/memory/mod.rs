//! # Memory Module
//!
//! Per-thread conversation memory.
//!
//! ## Architecture
//!
//! ```text
//! Orchestrator ──▶ dyn ThreadStore
//!                      ├── InMemoryThreadStore (process lifetime)
//!                      └── SqliteThreadStore   (shared StylistDb)
//! ```

pub mod sqlite_threads;
pub mod thread_store;

pub use sqlite_threads::SqliteThreadStore;
pub use thread_store::{InMemoryThreadStore, ThreadStore};

use crate::state::StylistDb;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Memory provider selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryProvider {
    /// Non-persistent, lost on restart
    #[default]
    InMemory,
    /// Stored in the stylist database
    Sqlite,
}

/// Build the configured thread store
pub fn build_thread_store(
    provider: MemoryProvider,
    db: &StylistDb,
    max_turns: usize,
) -> Arc<dyn ThreadStore> {
    match provider {
        MemoryProvider::InMemory => Arc::new(InMemoryThreadStore::new(max_turns)),
        MemoryProvider::Sqlite => Arc::new(SqliteThreadStore::new(db, max_turns)),
    }
}
