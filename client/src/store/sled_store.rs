//! # Sled-Backed Store
//!
//! The persistent backing store for real devices, built on sled's
//! embedded key-value engine. Each bucket maps to a named sled tree --
//! an independent keyspace inside one database file -- so the engine's
//! secrets and each provider's state never share keys.
//!
//! sled supports lock-free concurrent reads and atomic compare-and-swap,
//! which is exactly the primitive `set_if_absent` needs: the vacancy
//! check and the insert are one operation inside the engine, not a
//! read-modify-write we'd have to fence ourselves.
//!
//! Writes that matter (and for this store, every write is a device
//! secret or provider state) are flushed before the call returns. The
//! secrets are written once per device lifetime; durability is worth
//! more here than write throughput.

use async_trait::async_trait;
use sled::{Config, Db, IVec, Tree};
use std::path::Path;
use std::sync::Arc;

use super::{Store, StoreBucket, StoreError};

/// Persistent store at a filesystem path, one sled tree per bucket.
#[derive(Clone)]
pub struct SledStore {
    db: Db,
}

impl SledStore {
    /// Open or create a store at the given path.
    ///
    /// If the directory doesn't exist, sled creates it. If the database
    /// already exists, all previously persisted buckets are available
    /// immediately.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Create a temporary store that lives in memory-backed scratch space
    /// and is cleaned up when dropped. Ideal for tests -- no filesystem
    /// residue, no cleanup needed.
    pub fn open_temporary() -> Result<Self, StoreError> {
        let db = Config::new().temporary(true).open()?;
        Ok(Self { db })
    }
}

#[async_trait]
impl Store for SledStore {
    async fn bucket(&self, name: &str) -> Result<Arc<dyn StoreBucket>, StoreError> {
        let tree = self.db.open_tree(name)?;
        Ok(Arc::new(SledBucket { tree }))
    }
}

/// One named tree of a [`SledStore`].
pub struct SledBucket {
    tree: Tree,
}

impl SledBucket {
    fn decode(key: &str, value: IVec) -> Result<String, StoreError> {
        String::from_utf8(value.to_vec()).map_err(|_| StoreError::Corrupt {
            key: key.to_string(),
        })
    }
}

#[async_trait]
impl StoreBucket for SledBucket {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.tree.get(key)? {
            Some(value) => Ok(Some(Self::decode(key, value)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.tree.insert(key, value.as_bytes())?;
        self.tree.flush()?;
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<String, StoreError> {
        loop {
            match self
                .tree
                .compare_and_swap(key, None as Option<&[u8]>, Some(value.as_bytes()))?
            {
                Ok(()) => {
                    self.tree.flush()?;
                    return Ok(value.to_string());
                }
                Err(cas) => match cas.current {
                    Some(current) => return Self::decode(key, current),
                    // The slot was occupied a moment ago and is vacant
                    // again; contend for it once more.
                    None => continue,
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_temporary_starts_empty() {
        let store = SledStore::open_temporary().unwrap();
        let bucket = store.bucket("secrets").await.unwrap();
        assert_eq!(bucket.get("token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_then_get_roundtrip() {
        let store = SledStore::open_temporary().unwrap();
        let bucket = store.bucket("secrets").await.unwrap();
        bucket.set("token", "aabb").await.unwrap();
        assert_eq!(bucket.get("token").await.unwrap().as_deref(), Some("aabb"));
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SledStore::open(dir.path()).unwrap();
            let bucket = store.bucket("secrets").await.unwrap();
            bucket.set("token", "persisted").await.unwrap();
        }

        let store = SledStore::open(dir.path()).unwrap();
        let bucket = store.bucket("secrets").await.unwrap();
        assert_eq!(
            bucket.get("token").await.unwrap().as_deref(),
            Some("persisted")
        );
    }

    #[tokio::test]
    async fn trees_isolate_buckets() {
        let store = SledStore::open_temporary().unwrap();
        let engine = store.bucket("secrets").await.unwrap();
        let psp = store.bucket("psp/mock").await.unwrap();
        engine.set("token", "engine-owned").await.unwrap();
        assert_eq!(psp.get("token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_if_absent_respects_existing_value() {
        let store = SledStore::open_temporary().unwrap();
        let bucket = store.bucket("secrets").await.unwrap();

        assert_eq!(bucket.set_if_absent("k0", "first").await.unwrap(), "first");
        assert_eq!(bucket.set_if_absent("k0", "second").await.unwrap(), "first");
        assert_eq!(bucket.get("k0").await.unwrap().as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn concurrent_set_if_absent_single_winner() {
        let store = SledStore::open_temporary().unwrap();
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let bucket = store.bucket("race").await.unwrap();
                bucket
                    .set_if_absent("k", &format!("writer-{i}"))
                    .await
                    .unwrap()
            }));
        }

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap());
        }

        let stored = store
            .bucket("race")
            .await
            .unwrap()
            .get("k")
            .await
            .unwrap()
            .unwrap();
        assert!(outcomes.iter().all(|v| *v == stored));
    }
}
