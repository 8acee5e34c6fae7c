//! Bounded cache of per-user snippet indexes.
//!
//! Indexes are created lazily on first touch and evicted least-recently-used
//! once `capacity` users are resident, so a long-running process cannot
//! accumulate one index per user forever. A server can also drop a user's
//! index explicitly via [`IndexCache::reset`].

use crate::index::SnippetIndex;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use switchboard_core::error::MemoryError;
use tracing::debug;

pub struct IndexCache {
    indexes: Mutex<LruCache<String, SnippetIndex>>,
    dim: usize,
}

impl IndexCache {
    /// `capacity` is how many users keep a resident index; `dim` is the
    /// embedding dimension for new indexes. Capacity is clamped to at least 1.
    pub fn new(capacity: usize, dim: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            indexes: Mutex::new(LruCache::new(capacity)),
            dim,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<String, SnippetIndex>> {
        self.indexes.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add texts to the user's index, creating it if absent.
    pub fn add<S: Into<String>>(&self, user_id: &str, texts: impl IntoIterator<Item = S>) {
        let mut indexes = self.lock();
        let index = indexes
            .get_or_insert_mut(user_id.to_string(), || SnippetIndex::new(self.dim));
        index.add(texts);
    }

    /// Search the user's index. A user with no index yet gets an empty result.
    pub fn search(&self, user_id: &str, query: &str, k: usize) -> Result<Vec<String>, MemoryError> {
        let mut indexes = self.lock();
        match indexes.get_mut(user_id) {
            Some(index) => index.search(query, k),
            None => Ok(Vec::new()),
        }
    }

    /// Drop the user's index, if any. The next add starts fresh.
    pub fn reset(&self, user_id: &str) {
        let mut indexes = self.lock();
        if indexes.pop(user_id).is_some() {
            debug!(user_id, "Dropped snippet index");
        }
    }

    /// Number of resident indexes.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
