//! Dependency initialization and wiring for the search engine.
//!
//! Every component takes its collaborators as explicit constructor
//! arguments; this module is the single place where the concrete backend,
//! cache store, experiment registry, and default collaborators are built
//! from the environment and assembled into an orchestrator.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use marketplace_search_repository::{OpenSearchBackend, RedisCacheStore};

use crate::analytics::TracingAnalyticsSink;
use crate::config::SearchConfig;
use crate::errors::SearchError;
use crate::experiments::ExperimentRegistry;
use crate::nlp::PassthroughQueryProcessor;
use crate::orchestrator::SearchOrchestrator;
use crate::personalization::NoopPersonalizationProvider;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default Redis URL.
const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Connection mode for external stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if a connection fails.
    FailFast,
    /// Retry the connection every interval until successful.
    Retry,
}

impl ConnectionMode {
    /// Parse connection mode from environment variable.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive).
    /// Defaults to "retry" if not set or invalid.
    fn from_env() -> Self {
        match env::var("SEARCH_CONNECTION_MODE")
            .unwrap_or_else(|_| "retry".to_string())
            .to_lowercase()
            .as_str()
        {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!("Invalid SEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The fully wired orchestrator, ready to serve searches.
    pub orchestrator: SearchOrchestrator,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: Search backend URL (default: http://localhost:9200)
    /// - `REDIS_URL`: Cache store URL (default: redis://localhost:6379)
    /// - `SEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `SEARCH_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    /// - Plus everything [`SearchConfig::from_env`] reads.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(SearchError)` - If initialization fails (only in fail-fast mode)
    pub async fn new() -> Result<Self, SearchError> {
        let opensearch_url =
            env::var("OPENSEARCH_URL").unwrap_or_else(|_| DEFAULT_OPENSEARCH_URL.to_string());
        let redis_url = env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string());
        let connection_mode = ConnectionMode::from_env();
        let retry_interval = env::var("SEARCH_RETRY_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_INTERVAL_SECS);

        let config = SearchConfig::from_env();

        info!(
            opensearch_url = %opensearch_url,
            redis_url = %redis_url,
            connection_mode = ?connection_mode,
            retry_interval_secs = retry_interval,
            cache_enabled = config.cache_enabled,
            experiments_enabled = config.experiments_enabled,
            "Initializing search engine dependencies"
        );

        let backend = OpenSearchBackend::new(&opensearch_url).map_err(|e| {
            SearchError::backend_unavailable(format!("Failed to create search backend: {}", e))
        })?;

        let cache_store = Self::connect_to_redis(
            &redis_url,
            connection_mode,
            Duration::from_secs(retry_interval),
        )
        .await?;

        info!("Cache store connection established");

        let registry = Arc::new(ExperimentRegistry::with_stock_experiments());

        let orchestrator = SearchOrchestrator::new(
            Arc::new(backend),
            Arc::new(cache_store),
            registry,
            Arc::new(PassthroughQueryProcessor),
            Arc::new(NoopPersonalizationProvider),
            Arc::new(TracingAnalyticsSink),
            config,
        );

        Ok(Self { orchestrator })
    }

    /// Connect to Redis with retry logic based on connection mode.
    async fn connect_to_redis(
        url: &str,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<RedisCacheStore, SearchError> {
        loop {
            match RedisCacheStore::new(url).await {
                Ok(store) => return Ok(store),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(SearchError::Cache(e));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            redis_url = %url,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to Redis, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }
}
