//! Configuration for the search engine.

mod dependencies;

pub use dependencies::{ConnectionMode, Dependencies};

use std::env;
use std::time::Duration;

use marketplace_search_shared::SearchEntityType;

/// Default TTL for cached search responses, in seconds.
const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

/// Default deadline for a single backend search call, in milliseconds.
const DEFAULT_BACKEND_TIMEOUT_MS: u64 = 5_000;

/// Default deadline for a single cache store call, in milliseconds.
const DEFAULT_CACHE_TIMEOUT_MS: u64 = 500;

/// Tuning and wiring configuration for the search engine.
///
/// All values come from environment variables with defaults. The boost and
/// ceiling values are empirically tuned defaults carried over from production
/// traffic, not derived constants.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Master switch for the result cache.
    pub cache_enabled: bool,
    /// TTL for cached responses in seconds.
    pub cache_ttl_seconds: u64,
    /// Queries shorter than this (but non-empty) are never cached.
    pub min_cacheable_query_len: usize,

    /// Default score multiplier for product hits in federated searches.
    pub default_product_boost: f64,
    /// Default score multiplier for merchant hits in federated searches.
    pub default_merchant_boost: f64,
    /// Default score multiplier for brand hits in federated searches.
    pub default_brand_boost: f64,
    /// Scale applied to boosts derived from user browsing history.
    pub user_history_boost_factor: f64,
    /// Scale applied to boosts derived from explicit user preferences.
    pub user_preferences_boost_factor: f64,
    /// Normalization ceiling for the field-match relevance score.
    pub relevance_ceiling: f64,

    /// Master switch for the experiment engine.
    pub experiments_enabled: bool,
    /// Apply entity boosting inside the backend query (function_score)
    /// instead of post-hoc on returned hits.
    pub boost_at_query_time: bool,

    /// Deadline for each backend search call.
    pub backend_timeout: Duration,
    /// Deadline for each cache store call. An elapsed deadline on the
    /// read/write path counts as a miss.
    pub cache_timeout: Duration,

    /// Index (or alias) name for the product collection.
    pub product_index: String,
    /// Index (or alias) name for the merchant collection.
    pub merchant_index: String,
    /// Index (or alias) name for the brand collection.
    pub brand_index: String,

    /// Markup inserted before a highlighted term.
    pub highlight_pre_tag: String,
    /// Markup inserted after a highlighted term.
    pub highlight_post_tag: String,
    /// Highlight snippet length in characters.
    pub highlight_fragment_size: u32,
    /// Maximum highlight snippets per field.
    pub highlight_fragment_count: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            min_cacheable_query_len: 2,
            default_product_boost: 1.0,
            default_merchant_boost: 0.8,
            default_brand_boost: 0.8,
            user_history_boost_factor: 1.2,
            user_preferences_boost_factor: 1.5,
            relevance_ceiling: 10.0,
            experiments_enabled: true,
            boost_at_query_time: false,
            backend_timeout: Duration::from_millis(DEFAULT_BACKEND_TIMEOUT_MS),
            cache_timeout: Duration::from_millis(DEFAULT_CACHE_TIMEOUT_MS),
            product_index: "products".to_string(),
            merchant_index: "merchants".to_string(),
            brand_index: "brands".to_string(),
            highlight_pre_tag: "<em>".to_string(),
            highlight_post_tag: "</em>".to_string(),
            highlight_fragment_size: 150,
            highlight_fragment_count: 3,
        }
    }
}

impl SearchConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    ///
    /// # Environment Variables
    ///
    /// - `SEARCH_CACHE_ENABLED` (default: true)
    /// - `SEARCH_CACHE_TTL_SECONDS` (default: 300)
    /// - `SEARCH_DEFAULT_PRODUCT_BOOST` (default: 1.0)
    /// - `SEARCH_DEFAULT_MERCHANT_BOOST` (default: 0.8)
    /// - `SEARCH_DEFAULT_BRAND_BOOST` (default: 0.8)
    /// - `SEARCH_USER_HISTORY_BOOST_FACTOR` (default: 1.2)
    /// - `SEARCH_USER_PREFERENCES_BOOST_FACTOR` (default: 1.5)
    /// - `SEARCH_RELEVANCE_CEILING` (default: 10.0)
    /// - `SEARCH_EXPERIMENTS_ENABLED` (default: true)
    /// - `SEARCH_BOOST_AT_QUERY_TIME` (default: false)
    /// - `SEARCH_BACKEND_TIMEOUT_MS` (default: 5000)
    /// - `SEARCH_CACHE_TIMEOUT_MS` (default: 500)
    /// - `SEARCH_PRODUCT_INDEX` / `SEARCH_MERCHANT_INDEX` /
    ///   `SEARCH_BRAND_INDEX` (defaults: products / merchants / brands)
    /// - `SEARCH_HIGHLIGHT_PRE_TAG` / `SEARCH_HIGHLIGHT_POST_TAG`
    ///   (defaults: `<em>` / `</em>`)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            cache_enabled: env_bool("SEARCH_CACHE_ENABLED", defaults.cache_enabled),
            cache_ttl_seconds: env_u64("SEARCH_CACHE_TTL_SECONDS", defaults.cache_ttl_seconds),
            min_cacheable_query_len: defaults.min_cacheable_query_len,
            default_product_boost: env_f64(
                "SEARCH_DEFAULT_PRODUCT_BOOST",
                defaults.default_product_boost,
            ),
            default_merchant_boost: env_f64(
                "SEARCH_DEFAULT_MERCHANT_BOOST",
                defaults.default_merchant_boost,
            ),
            default_brand_boost: env_f64(
                "SEARCH_DEFAULT_BRAND_BOOST",
                defaults.default_brand_boost,
            ),
            user_history_boost_factor: env_f64(
                "SEARCH_USER_HISTORY_BOOST_FACTOR",
                defaults.user_history_boost_factor,
            ),
            user_preferences_boost_factor: env_f64(
                "SEARCH_USER_PREFERENCES_BOOST_FACTOR",
                defaults.user_preferences_boost_factor,
            ),
            relevance_ceiling: env_f64("SEARCH_RELEVANCE_CEILING", defaults.relevance_ceiling),
            experiments_enabled: env_bool(
                "SEARCH_EXPERIMENTS_ENABLED",
                defaults.experiments_enabled,
            ),
            boost_at_query_time: env_bool(
                "SEARCH_BOOST_AT_QUERY_TIME",
                defaults.boost_at_query_time,
            ),
            backend_timeout: Duration::from_millis(env_u64(
                "SEARCH_BACKEND_TIMEOUT_MS",
                DEFAULT_BACKEND_TIMEOUT_MS,
            )),
            cache_timeout: Duration::from_millis(env_u64(
                "SEARCH_CACHE_TIMEOUT_MS",
                DEFAULT_CACHE_TIMEOUT_MS,
            )),
            product_index: env_string("SEARCH_PRODUCT_INDEX", &defaults.product_index),
            merchant_index: env_string("SEARCH_MERCHANT_INDEX", &defaults.merchant_index),
            brand_index: env_string("SEARCH_BRAND_INDEX", &defaults.brand_index),
            highlight_pre_tag: env_string("SEARCH_HIGHLIGHT_PRE_TAG", &defaults.highlight_pre_tag),
            highlight_post_tag: env_string(
                "SEARCH_HIGHLIGHT_POST_TAG",
                &defaults.highlight_post_tag,
            ),
            highlight_fragment_size: defaults.highlight_fragment_size,
            highlight_fragment_count: defaults.highlight_fragment_count,
        }
    }

    /// The index to query for a given entity type.
    ///
    /// The federated type has no index of its own; it falls back to the
    /// product index, matching the behavior for unknown types upstream.
    pub fn index_for(&self, entity_type: SearchEntityType) -> &str {
        match entity_type {
            SearchEntityType::Product => &self.product_index,
            SearchEntityType::Merchant => &self.merchant_index,
            SearchEntityType::Brand => &self.brand_index,
            SearchEntityType::All => {
                tracing::warn!("No dedicated index for federated searches, using product index");
                &self.product_index
            }
        }
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_boost_weights() {
        let config = SearchConfig::default();
        assert_eq!(config.default_product_boost, 1.0);
        assert_eq!(config.default_merchant_boost, 0.8);
        assert_eq!(config.default_brand_boost, 0.8);
        assert_eq!(config.relevance_ceiling, 10.0);
        assert_eq!(config.cache_ttl_seconds, 300);
        assert_eq!(config.min_cacheable_query_len, 2);
    }

    #[test]
    fn test_index_for_single_types() {
        let config = SearchConfig::default();
        assert_eq!(config.index_for(SearchEntityType::Product), "products");
        assert_eq!(config.index_for(SearchEntityType::Merchant), "merchants");
        assert_eq!(config.index_for(SearchEntityType::Brand), "brands");
    }
}
