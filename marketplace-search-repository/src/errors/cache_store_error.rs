//! Cache store error types.

use thiserror::Error;

/// Errors from cache store operations.
///
/// Used by the [`crate::CacheStore`] trait. Callers on the search hot path
/// are expected to treat read/write failures as cache misses; only explicit
/// invalidation surfaces these errors.
#[derive(Debug, Clone, Error)]
pub enum CacheStoreError {
    /// Failed to connect to the cache store.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A read operation failed.
    #[error("Read error: {0}")]
    ReadError(String),

    /// A write operation failed.
    #[error("Write error: {0}")]
    WriteError(String),

    /// A delete or pattern-invalidation operation failed.
    #[error("Delete error: {0}")]
    DeleteError(String),
}

impl CacheStoreError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a read error.
    pub fn read(msg: impl Into<String>) -> Self {
        Self::ReadError(msg.into())
    }

    /// Create a write error.
    pub fn write(msg: impl Into<String>) -> Self {
        Self::WriteError(msg.into())
    }

    /// Create a delete error.
    pub fn delete(msg: impl Into<String>) -> Self {
        Self::DeleteError(msg.into())
    }
}
