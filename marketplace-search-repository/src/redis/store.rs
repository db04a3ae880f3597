//! Redis cache store implementation.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info};

use crate::errors::CacheStoreError;
use crate::interfaces::CacheStore;

/// Batch size for SCAN during pattern invalidation.
const SCAN_COUNT: usize = 100;

/// Redis-backed implementation of [`CacheStore`].
///
/// Uses a [`ConnectionManager`] so a dropped connection is re-established
/// transparently between commands.
pub struct RedisCacheStore {
    manager: ConnectionManager,
}

impl RedisCacheStore {
    /// Connect to Redis at the given URL (e.g. "redis://localhost:6379").
    ///
    /// # Returns
    ///
    /// * `Ok(RedisCacheStore)` - A connected store
    /// * `Err(CacheStoreError)` - If the URL is invalid or the connection
    ///   cannot be established
    pub async fn new(url: &str) -> Result<Self, CacheStoreError> {
        let client =
            redis::Client::open(url).map_err(|e| CacheStoreError::connection(e.to_string()))?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheStoreError::connection(e.to_string()))?;

        info!(url = %url, "Connected Redis cache store");

        Ok(Self { manager })
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| CacheStoreError::read(e.to_string()))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheStoreError> {
        let mut conn = self.manager.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds)
            .await
            .map_err(|e| CacheStoreError::write(e.to_string()))?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheStoreError> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| CacheStoreError::delete(e.to_string()))?;
        Ok(())
    }

    async fn del_pattern(&self, pattern: &str) -> Result<u64, CacheStoreError> {
        let mut conn = self.manager.clone();
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await
                .map_err(|e| CacheStoreError::delete(e.to_string()))?;

            if !keys.is_empty() {
                let removed: u64 = conn
                    .del(&keys)
                    .await
                    .map_err(|e| CacheStoreError::delete(e.to_string()))?;
                deleted += removed;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!(pattern = %pattern, deleted = deleted, "Invalidated cache keys");
        Ok(deleted)
    }
}
