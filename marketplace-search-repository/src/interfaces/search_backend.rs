//! Search backend trait definition.
//!
//! This module defines the abstract interface over the full-text search
//! backend, allowing for different implementations (OpenSearch,
//! Elasticsearch, in-memory mocks for tests).

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchBackendError;
use crate::types::BackendSearchResults;

/// Abstracts the underlying full-text search backend.
///
/// The relevance core only issues `search` calls; the index lifecycle
/// operations (`bulk_index`, `create_index`, `update_aliases`,
/// `refresh_index`) exist for the separate indexing pipeline and admin
/// tooling. Implementations are injected into the orchestrator to enable
/// testing with mock backends.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Execute a search against one index.
    ///
    /// # Arguments
    ///
    /// * `index` - The index or alias to query
    /// * `body` - The full query body (query, sort, aggs, highlight,
    ///   from/size)
    ///
    /// # Returns
    ///
    /// * `Ok(BackendSearchResults)` - Hits, total, and raw aggregations
    /// * `Err(SearchBackendError)` - If the query fails or the response
    ///   cannot be parsed
    async fn search(
        &self,
        index: &str,
        body: &Value,
    ) -> Result<BackendSearchResults, SearchBackendError>;

    /// Index a batch of documents.
    ///
    /// # Arguments
    ///
    /// * `index` - The target index
    /// * `documents` - (document id, source body) pairs
    async fn bulk_index(
        &self,
        index: &str,
        documents: &[(String, Value)],
    ) -> Result<(), SearchBackendError>;

    /// Create an index with the given settings and mappings.
    ///
    /// Creating an index that already exists is an error.
    async fn create_index(&self, index: &str, settings: &Value)
        -> Result<(), SearchBackendError>;

    /// Atomically repoint an alias at a new index.
    ///
    /// When `old_index` is given the alias is removed from it in the same
    /// operation, so readers never observe the alias pointing at both.
    async fn update_aliases(
        &self,
        alias: &str,
        old_index: Option<&str>,
        new_index: &str,
    ) -> Result<(), SearchBackendError>;

    /// Make recent writes to an index visible to search.
    async fn refresh_index(&self, index: &str) -> Result<(), SearchBackendError>;
}
