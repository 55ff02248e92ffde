//! # Thread Store
//!
//! Conversation memory keyed by `thread_id`. Appends to one thread are
//! serialized; appends to different threads proceed independently.

use crate::error::StoreError;
use crate::state::{ConversationThread, Turn};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Storage for conversation threads
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Snapshot of the thread, creating an empty one on first reference
    async fn get_or_create(&self, thread_id: &str) -> Result<ConversationThread, StoreError>;

    /// Snapshot of the thread if it exists
    async fn history(&self, thread_id: &str) -> Result<Option<ConversationThread>, StoreError>;

    /// Append turns as one unit; no other append to the same thread interleaves
    async fn append(&self, thread_id: &str, turns: Vec<Turn>) -> Result<(), StoreError>;

    /// Drop a thread. Returns whether it existed.
    async fn clear(&self, thread_id: &str) -> Result<bool, StoreError>;
}

/// Process-lifetime store with one mutex per thread
pub struct InMemoryThreadStore {
    threads: RwLock<HashMap<String, Arc<Mutex<ConversationThread>>>>,
    max_turns: usize,
}

impl InMemoryThreadStore {
    pub fn new(max_turns: usize) -> Self {
        Self {
            threads: RwLock::new(HashMap::new()),
            max_turns,
        }
    }

    async fn handle(&self, thread_id: &str) -> Arc<Mutex<ConversationThread>> {
        {
            let threads = self.threads.read().await;
            if let Some(handle) = threads.get(thread_id) {
                return Arc::clone(handle);
            }
        }

        let mut threads = self.threads.write().await;
        let handle = threads.entry(thread_id.to_string()).or_insert_with(|| {
            tracing::debug!(thread_id, "Creating conversation thread");
            Arc::new(Mutex::new(ConversationThread::new(thread_id)))
        });
        Arc::clone(handle)
    }
}

#[async_trait]
impl ThreadStore for InMemoryThreadStore {
    async fn get_or_create(&self, thread_id: &str) -> Result<ConversationThread, StoreError> {
        let handle = self.handle(thread_id).await;
        let thread = handle.lock().await;
        Ok(thread.clone())
    }

    async fn history(&self, thread_id: &str) -> Result<Option<ConversationThread>, StoreError> {
        let handle = {
            let threads = self.threads.read().await;
            threads.get(thread_id).cloned()
        };
        match handle {
            Some(handle) => Ok(Some(handle.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn append(&self, thread_id: &str, turns: Vec<Turn>) -> Result<(), StoreError> {
        // The map guard is held until the turns land, so a concurrent
        // `clear` never orphans the handle mid-append.
        {
            let threads = self.threads.read().await;
            if let Some(handle) = threads.get(thread_id) {
                handle.lock().await.append_bounded(turns, self.max_turns);
                return Ok(());
            }
        }

        let mut threads = self.threads.write().await;
        let handle = threads
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ConversationThread::new(thread_id))));
        handle.lock().await.append_bounded(turns, self.max_turns);
        Ok(())
    }

    async fn clear(&self, thread_id: &str) -> Result<bool, StoreError> {
        let mut threads = self.threads.write().await;
        Ok(threads.remove(thread_id).is_some())
    }
}
