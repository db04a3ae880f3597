//! Cache store trait definition.

use async_trait::async_trait;

use crate::errors::CacheStoreError;

/// A generic key/value store with TTL semantics, backing the search result
/// cache.
///
/// Values are opaque strings (the caller serializes). The store is assumed
/// to be externally concurrency-safe; implementations do not need in-process
/// locking on the read/write path.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a key. `Ok(None)` is a miss.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError>;

    /// Store a value under a key with an expiry in seconds.
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheStoreError>;

    /// Delete a single key. Deleting an absent key is not an error.
    async fn del(&self, key: &str) -> Result<(), CacheStoreError>;

    /// Delete all keys matching a glob-style pattern, returning how many
    /// were removed.
    async fn del_pattern(&self, pattern: &str) -> Result<u64, CacheStoreError>;
}
