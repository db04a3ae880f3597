//! Search backend error types.

use thiserror::Error;

/// Errors from search backend operations.
///
/// Used by the [`crate::SearchBackend`] trait for all query and index
/// lifecycle operations, regardless of the concrete backend implementation.
#[derive(Debug, Clone, Error)]
pub enum SearchBackendError {
    /// Failed to establish a connection to the backend.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A search query failed.
    #[error("Query error: {0}")]
    QueryError(String),

    /// Failed to parse a backend response.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to create an index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// A bulk indexing operation had failures.
    #[error("Bulk index error: {0}")]
    BulkIndexError(String),

    /// Failed to update index aliases.
    #[error("Alias error: {0}")]
    AliasError(String),

    /// Failed to refresh an index.
    #[error("Refresh error: {0}")]
    RefreshError(String),
}

impl SearchBackendError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create a bulk index error.
    pub fn bulk_index(msg: impl Into<String>) -> Self {
        Self::BulkIndexError(msg.into())
    }

    /// Create an alias error.
    pub fn alias(msg: impl Into<String>) -> Self {
        Self::AliasError(msg.into())
    }

    /// Create a refresh error.
    pub fn refresh(msg: impl Into<String>) -> Self {
        Self::RefreshError(msg.into())
    }
}
