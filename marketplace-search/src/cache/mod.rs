//! Search result cache.
//!
//! Content-addressed cache keyed by a canonical serialization of the
//! request. Personalized and experiment-tagged requests bypass the cache,
//! zero-result responses are never written, and every read/write failure
//! degrades to a miss with a logged warning. Only explicit pattern
//! invalidation surfaces errors to its caller.

use std::sync::Arc;

use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

use marketplace_search_repository::CacheStore;
use marketplace_search_shared::{SearchOptions, SearchResponse};

use crate::config::SearchConfig;
use crate::errors::SearchError;

/// Caches full search responses in an external key/value store.
pub struct SearchResultCache {
    store: Arc<dyn CacheStore>,
    config: Arc<SearchConfig>,
}

impl SearchResultCache {
    /// Create a cache over a store.
    pub fn new(store: Arc<dyn CacheStore>, config: Arc<SearchConfig>) -> Self {
        Self { store, config }
    }

    /// Build the deterministic cache key for a request.
    ///
    /// The key covers query, entity type, page window, filters, sort, and
    /// the NLP flag. Filters and array values are sorted first so the key
    /// never depends on caller-supplied ordering. If the key cannot be
    /// constructed (non-finite range bounds), a unique non-cacheable key is
    /// returned instead of an error, forcing a miss.
    pub fn generate_cache_key(&self, options: &SearchOptions) -> String {
        match Self::try_generate_key(options) {
            Ok(key) => key,
            Err(reason) => {
                warn!(reason = %reason, "Failed to build cache key, forcing a cache miss");
                format!("search:nocache:{}", Uuid::new_v4())
            }
        }
    }

    fn try_generate_key(options: &SearchOptions) -> Result<String, String> {
        let mut filters: Vec<String> = options
            .filters
            .iter()
            .map(|filter| {
                let mut values = filter.values.clone();
                values.sort();
                format!(
                    "{}{}={}",
                    filter.field,
                    if filter.exact { "!" } else { "" },
                    values.join("|")
                )
            })
            .collect();
        filters.sort();

        let mut ranges: Vec<String> = Vec::with_capacity(options.range_filters.len());
        for range in &options.range_filters {
            for bound in [range.min, range.max].into_iter().flatten() {
                if !bound.is_finite() {
                    return Err(format!(
                        "range filter on '{}' has a non-finite bound",
                        range.field
                    ));
                }
            }
            ranges.push(format!(
                "{}={}..{}",
                range.field,
                range.min.map(|v| v.to_string()).unwrap_or_default(),
                range.max.map(|v| v.to_string()).unwrap_or_default()
            ));
        }
        ranges.sort();

        // Sort order is semantic, so sort specs keep their caller order.
        let sorts: Vec<String> = options
            .sort
            .iter()
            .map(|spec| {
                format!(
                    "{}:{}",
                    spec.field,
                    match spec.direction {
                        marketplace_search_shared::SortDirection::Asc => "asc",
                        marketplace_search_shared::SortDirection::Desc => "desc",
                    }
                )
            })
            .collect();

        Ok(format!(
            "search:{}:q={}:p={}:l={}:f=[{}]:r=[{}]:s=[{}]:nlp={}",
            options.entity_type,
            options.query.trim().to_lowercase(),
            options.page,
            options.limit,
            filters.join(","),
            ranges.join(","),
            sorts.join(","),
            u8::from(options.enable_nlp)
        ))
    }

    /// Whether a request is eligible for caching at all.
    ///
    /// False when caching is disabled, the request is personalized, an
    /// experiment tag is present, or a non-empty query is shorter than the
    /// minimum cacheable length.
    pub fn should_cache(&self, options: &SearchOptions) -> bool {
        if !self.config.cache_enabled {
            return false;
        }
        if options.personalized {
            return false;
        }
        if options.experiment_id.is_some() {
            return false;
        }

        let query = options.query.trim();
        if !query.is_empty() && query.chars().count() < self.config.min_cacheable_query_len {
            return false;
        }

        true
    }

    /// Look up a cached response for a request. Any store or decode failure
    /// degrades to a miss.
    pub async fn get_cached_results(&self, options: &SearchOptions) -> Option<SearchResponse> {
        if !self.should_cache(options) {
            return None;
        }

        let key = self.generate_cache_key(options);
        let raw = match timeout(self.config.cache_timeout, self.store.get(&key)).await {
            Ok(Ok(raw)) => raw?,
            Ok(Err(e)) => {
                warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
            Err(_) => {
                warn!(key = %key, "Cache read timed out, treating as miss");
                return None;
            }
        };

        match serde_json::from_str::<SearchResponse>(&raw) {
            Ok(response) => {
                debug!(key = %key, "Cache hit");
                Some(response)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cached value failed to decode, treating as miss");
                None
            }
        }
    }

    /// Write a response through to the cache. Zero-result responses are
    /// skipped, and write failures are logged without failing the search.
    pub async fn cache_results(&self, options: &SearchOptions, response: &SearchResponse) {
        if !self.should_cache(options) {
            return;
        }

        if response.pagination.total == 0 {
            debug!("Skipping cache write for zero-result response");
            return;
        }

        let key = self.generate_cache_key(options);
        let serialized = match serde_json::to_string(response) {
            Ok(serialized) => serialized,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to serialize response for caching");
                return;
            }
        };

        match timeout(
            self.config.cache_timeout,
            self.store.set(&key, &serialized, self.config.cache_ttl_seconds),
        )
        .await
        {
            Ok(Ok(())) => {
                debug!(key = %key, ttl = self.config.cache_ttl_seconds, "Cached search response");
            }
            Ok(Err(e)) => {
                warn!(key = %key, error = %e, "Cache write failed");
            }
            Err(_) => {
                warn!(key = %key, "Cache write timed out");
            }
        }
    }

    /// Delete all cached entries matching a glob pattern (used on reindex).
    ///
    /// Unlike the read/write path this propagates failures, so callers can
    /// tell an invalidation did not happen.
    pub async fn invalidate_cache(&self, pattern: &str) -> Result<u64, SearchError> {
        let deleted = self.store.del_pattern(pattern).await?;
        debug!(pattern = %pattern, deleted = deleted, "Invalidated cached searches");
        Ok(deleted)
    }
}
