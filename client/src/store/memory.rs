//! # In-Memory Store
//!
//! A HashMap behind a mutex. No filesystem side effects, no cleanup --
//! ideal for unit tests, the mock PSP, and throwaway demo sessions.
//! Secrets stored here die with the process, which is precisely why
//! production devices use [`SledStore`](super::SledStore) instead.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use super::{Store, StoreBucket, StoreError};

/// Bucket name -> (key -> value).
type Buckets = HashMap<String, HashMap<String, String>>;

/// A process-local store with no persistence.
///
/// Cloning is cheap and every clone shares the same underlying buckets,
/// so two handles to the "same" store really do race against each other --
/// which is what the concurrency tests need them to do.
#[derive(Clone, Default)]
pub struct MemoryStore {
    buckets: Arc<Mutex<Buckets>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn bucket(&self, name: &str) -> Result<Arc<dyn StoreBucket>, StoreError> {
        Ok(Arc::new(MemoryBucket {
            buckets: Arc::clone(&self.buckets),
            name: name.to_string(),
        }))
    }
}

/// A named view into a [`MemoryStore`]. Holds a handle to the parent
/// store's map, so every bucket object for the same name sees the same
/// data.
pub struct MemoryBucket {
    buckets: Arc<Mutex<Buckets>>,
    name: String,
}

#[async_trait]
impl StoreBucket for MemoryBucket {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let buckets = self.buckets.lock();
        Ok(buckets
            .get(&self.name)
            .and_then(|bucket| bucket.get(key))
            .cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut buckets = self.buckets.lock();
        buckets
            .entry(self.name.clone())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<String, StoreError> {
        // One lock covers the whole check-then-set; the entry API makes
        // the vacancy test and the insert a single step.
        let mut buckets = self.buckets.lock();
        let winner = buckets
            .entry(self.name.clone())
            .or_default()
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
        Ok(winner.clone())
    }
}
