//! Error types for the search engine.
//!
//! Only two failures surface to callers: a backend query failure
//! ([`SearchError::BackendUnavailable`]) and an explicit cache invalidation
//! failure ([`SearchError::Cache`]). Everything else degrades with a logged
//! warning, because search must stay available when auxiliary subsystems are
//! impaired.

use thiserror::Error;

use marketplace_search_repository::{CacheStoreError, SearchBackendError};

/// Errors that can occur while serving a search.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Malformed filter, sort, or pagination input.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The search backend call failed or timed out.
    #[error("Search backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A cache operation failed. Only explicit invalidation surfaces this.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheStoreError),

    /// Unknown experiment, unknown variant, or an invalid status change.
    #[error("Experiment configuration error: {0}")]
    ExperimentConfig(String),
}

impl SearchError {
    /// Create an invalid query error.
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }

    /// Create a backend unavailable error.
    pub fn backend_unavailable(msg: impl Into<String>) -> Self {
        Self::BackendUnavailable(msg.into())
    }

    /// Create an experiment configuration error.
    pub fn experiment_config(msg: impl Into<String>) -> Self {
        Self::ExperimentConfig(msg.into())
    }
}

impl From<SearchBackendError> for SearchError {
    fn from(err: SearchBackendError) -> Self {
        Self::BackendUnavailable(err.to_string())
    }
}
