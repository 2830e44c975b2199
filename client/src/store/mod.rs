//! # Backing Store Abstraction
//!
//! The engine persists exactly two things -- the device Token and K0 --
//! and it does so through the narrowest contract that can carry them: a
//! bucketed string key-value store. Buckets are independent namespaces;
//! the engine owns one, each payment-service provider gets its own, and
//! nobody enumerates or deletes anything.
//!
//! ## The `set_if_absent` contract
//!
//! Plain `get`/`set` cannot make lazy secret generation safe: two callers
//! racing through "get, see nothing, generate, set" each persist their own
//! secret and the loser's value silently replaces a Token the verifier has
//! already bound. [`StoreBucket::set_if_absent`] is the compare-and-set
//! that closes the race: it publishes the proposed value only if the key
//! is vacant and returns the winning value either way, so a losing writer
//! adopts what the winner stored. Implementations must make this atomic
//! with respect to every other handle on the same bucket.
//!
//! Two implementations ship: [`MemoryStore`](memory::MemoryStore) for
//! tests and ephemeral sessions, and [`SledStore`](sled_store::SledStore)
//! on sled for real devices.

pub mod memory;
pub mod sled_store;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub use memory::MemoryStore;
pub use sled_store::SledStore;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors surfaced by a backing store.
///
/// Store unavailability is fatal to engine initialization; there is no
/// silent fallback to ephemeral secrets.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The sled backend failed.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// A persisted value is not valid UTF-8. Something else wrote to our
    /// keyspace, or the disk is lying to us.
    #[error("stored value for '{key}' is not valid UTF-8")]
    Corrupt {
        /// The key whose value failed to decode.
        key: String,
    },

    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

// ---------------------------------------------------------------------------
// Contracts
// ---------------------------------------------------------------------------

/// A store that hands out named buckets.
///
/// Opening the store itself (paths, files, caches) belongs to the
/// concrete type's constructor; by the time a `Store` exists it is ready
/// to serve buckets.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open (creating if needed) the named bucket.
    async fn bucket(&self, name: &str) -> Result<Arc<dyn StoreBucket>, StoreError>;
}

/// One independent key-value namespace within a store.
///
/// All methods may suspend on I/O. None of them holds any engine lock.
#[async_trait]
pub trait StoreBucket: Send + Sync {
    /// Read a value. `Ok(None)` means the key was never set.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value unconditionally, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Publish `value` only if `key` is vacant; return the value that
    /// ended up stored -- `value` itself when this call won, the existing
    /// occupant when it lost. Atomic against every other handle on the
    /// same bucket.
    async fn set_if_absent(&self, key: &str, value: &str) -> Result<String, StoreError>;
}
