//! Search orchestrator.
//!
//! The top-level coordinator for one search request: experiment
//! assignment, NLP processing, cache check, backend query fan-out, entity
//! boosting, score normalization, facet generation, response assembly,
//! write-through caching, and the analytics event. Stateless per request.
//!
//! Failure policy: the backend retrieval step is fail-loud (a wrong or
//! empty result set is worse than an explicit error), while cache,
//! experiment, NLP, and personalization failures degrade silently with a
//! logged warning.

pub mod results;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument};

use marketplace_search_repository::{CacheStore, SearchBackend};
use marketplace_search_shared::{
    EntityDistribution, PaginationInfo, ScoreSummary, SearchEntityType, SearchHit,
    SearchOptions, SearchResponse,
};

use crate::analytics::{AnalyticsSink, SearchEvent};
use crate::cache::SearchResultCache;
use crate::config::SearchConfig;
use crate::errors::SearchError;
use crate::experiments::{ExperimentEngine, ExperimentRegistry};
use crate::facets::FacetGenerator;
use crate::nlp::QueryProcessor;
use crate::personalization::{PersonalizationProvider, PersonalizedBoosts};
use crate::query::QueryBuilder;
use crate::scoring::{normalize_scores, EntityRelevanceScorer};

/// Coordinates the full search pipeline.
pub struct SearchOrchestrator {
    backend: Arc<dyn SearchBackend>,
    query_builder: QueryBuilder,
    scorer: EntityRelevanceScorer,
    facet_generator: FacetGenerator,
    experiment_engine: ExperimentEngine,
    cache: SearchResultCache,
    query_processor: Arc<dyn QueryProcessor>,
    personalization: Arc<dyn PersonalizationProvider>,
    analytics: Arc<dyn AnalyticsSink>,
    config: Arc<SearchConfig>,
}

impl SearchOrchestrator {
    /// Wire an orchestrator from its collaborators.
    ///
    /// Every external dependency is passed in explicitly; the internal
    /// components (query builder, scorer, facet generator, experiment
    /// engine, cache) are constructed here over the shared configuration.
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        cache_store: Arc<dyn CacheStore>,
        experiment_registry: Arc<ExperimentRegistry>,
        query_processor: Arc<dyn QueryProcessor>,
        personalization: Arc<dyn PersonalizationProvider>,
        analytics: Arc<dyn AnalyticsSink>,
        config: SearchConfig,
    ) -> Self {
        let config = Arc::new(config);

        Self {
            query_builder: QueryBuilder::new(config.clone()),
            scorer: EntityRelevanceScorer::new(config.clone()),
            facet_generator: FacetGenerator::new(),
            experiment_engine: ExperimentEngine::new(
                experiment_registry,
                config.experiments_enabled,
            ),
            cache: SearchResultCache::new(cache_store, config.clone()),
            backend,
            query_processor,
            personalization,
            analytics,
            config,
        }
    }

    /// Execute one search request.
    ///
    /// # Errors
    ///
    /// * [`SearchError::InvalidQuery`] - The options fail validation
    /// * [`SearchError::BackendUnavailable`] - A backend sub-query failed
    ///   or timed out
    #[instrument(skip(self, options), fields(query = %options.query, entity_type = %options.entity_type))]
    pub async fn search(&self, options: SearchOptions) -> Result<SearchResponse, SearchError> {
        options.validate().map_err(SearchError::invalid_query)?;

        let start = Instant::now();
        let options = self.assign_experiment(options);

        let processed = if options.enable_nlp && options.has_query() {
            Some(self.query_processor.process(&options.query).await)
        } else {
            None
        };
        let query_text = processed
            .as_ref()
            .map(|p| p.processed_query.clone())
            .unwrap_or_else(|| options.query.clone());

        if let Some(cached) = self.cache.get_cached_results(&options).await {
            debug!("Serving search from cache");
            return Ok(cached);
        }

        let personalized_boosts = match (options.personalized, options.user_id) {
            (true, Some(user_id)) => Some(self.personalization.personalized_boosts(user_id).await),
            _ => None,
        };

        let mut response = if options.entity_type.is_federated() {
            self.search_all(&query_text, &options, personalized_boosts.as_ref())
                .await?
        } else {
            self.search_single(
                options.entity_type,
                &query_text,
                &options,
                personalized_boosts.as_ref(),
            )
            .await?
        };

        response.query = options.query.clone();
        response.processed_query = processed.map(|p| p.processed_query);
        response.used_nlp = options.enable_nlp;
        response.personalized = options.personalized;
        response.highlights_enabled = options.enable_highlighting;

        self.experiment_engine
            .process_experiment_results(&mut response, &options);

        response.took_ms = start.elapsed().as_millis() as u64;

        self.cache.cache_results(&options, &response).await;
        self.emit_search_event(&options, &response);

        info!(
            total = response.pagination.total,
            returned = response.len(),
            took_ms = response.took_ms,
            "Search completed"
        );

        Ok(response)
    }

    /// Delete cached search responses matching a pattern (used on reindex).
    pub async fn invalidate_cached_results(&self, pattern: &str) -> Result<u64, SearchError> {
        self.cache.invalidate_cache(pattern).await
    }

    /// Resolve a raw experiment tag into a variant assignment. Already
    /// resolved tags (`"experiment:variant"`) pass through unchanged.
    fn assign_experiment(&self, options: SearchOptions) -> SearchOptions {
        match options.experiment_id.clone() {
            Some(id) if !id.contains(':') => {
                self.experiment_engine.apply_experiment(options, &id, None)
            }
            _ => options,
        }
    }

    /// Search a single entity collection.
    async fn search_single(
        &self,
        entity_type: SearchEntityType,
        query_text: &str,
        options: &SearchOptions,
        boosts: Option<&PersonalizedBoosts>,
    ) -> Result<SearchResponse, SearchError> {
        let (hits, total, aggregations) = self
            .execute_entity_query(entity_type, query_text, options)
            .await?;

        let hits = match boosts {
            Some(boosts) => {
                self.scorer
                    .apply_personalized_boosting(hits, boosts, options.boost_by_values)
            }
            None => hits,
        };

        let facets = self.facet_generator.generate_facets(&aggregations, entity_type);
        let (products, merchants, brands) = results::split_hits(&hits);

        let scores: Vec<f64> = hits.iter().map(|h| h.score).collect();

        Ok(SearchResponse {
            pagination: PaginationInfo::new(total, options.page, options.limit),
            facets,
            entity_distribution: Some(EntityDistribution {
                products: products.len(),
                merchants: merchants.len(),
                brands: brands.len(),
            }),
            relevance_scores: ScoreSummary::from_scores(&scores),
            products,
            merchants,
            brands,
            ..Default::default()
        })
    }

    /// Federated search: fan out one sub-query per entity type, join, then
    /// boost, normalize, and combine facets.
    ///
    /// The three sub-queries are independent, so they run concurrently;
    /// fan-out is bounded at one call per entity type.
    async fn search_all(
        &self,
        query_text: &str,
        options: &SearchOptions,
        boosts: Option<&PersonalizedBoosts>,
    ) -> Result<SearchResponse, SearchError> {
        let (products_result, merchants_result, brands_result) = tokio::join!(
            self.execute_entity_query(SearchEntityType::Product, query_text, options),
            self.execute_entity_query(SearchEntityType::Merchant, query_text, options),
            self.execute_entity_query(SearchEntityType::Brand, query_text, options),
        );

        let (product_hits, product_total, product_aggs) = products_result?;
        let (merchant_hits, merchant_total, merchant_aggs) = merchants_result?;
        let (brand_hits, brand_total, brand_aggs) = brands_result?;

        let mut hits = Vec::with_capacity(
            product_hits.len() + merchant_hits.len() + brand_hits.len(),
        );
        hits.extend(product_hits);
        hits.extend(merchant_hits);
        hits.extend(brand_hits);

        // Backend gives no usable _score under explicit sorts; estimate
        // relevance from the document so boosting and normalization still
        // have a signal to work with.
        for hit in &mut hits {
            if hit.score == 0.0 {
                hit.score = self
                    .scorer
                    .calculate_entity_relevance(query_text, Some(&hit.document));
            }
        }

        let hits = self.scorer.apply_entity_boosting(
            hits,
            SearchEntityType::All,
            options.entity_boosting.as_ref(),
        );

        let hits = match boosts {
            Some(boosts) => {
                self.scorer
                    .apply_personalized_boosting(hits, boosts, options.boost_by_values)
            }
            None => hits,
        };

        let mut normalized = normalize_scores(hits);
        normalized.truncate(options.limit);

        let facets = self.facet_generator.combine_facets(
            &self
                .facet_generator
                .generate_facets(&product_aggs, SearchEntityType::Product),
            &self
                .facet_generator
                .generate_facets(&merchant_aggs, SearchEntityType::Merchant),
            &self
                .facet_generator
                .generate_facets(&brand_aggs, SearchEntityType::Brand),
        );

        let (products, merchants, brands) = results::split_normalized_hits(&normalized);
        let scores: Vec<f64> = normalized.iter().map(|h| h.normalized_score).collect();
        let total = product_total + merchant_total + brand_total;

        Ok(SearchResponse {
            pagination: PaginationInfo::new(total, options.page, options.limit),
            facets,
            entity_distribution: Some(EntityDistribution {
                products: products.len(),
                merchants: merchants.len(),
                brands: brands.len(),
            }),
            relevance_scores: ScoreSummary::from_scores(&scores),
            products,
            merchants,
            brands,
            ..Default::default()
        })
    }

    /// Build and issue one backend sub-query under the configured deadline.
    ///
    /// Fail-loud: a transport failure or timeout surfaces as
    /// [`SearchError::BackendUnavailable`].
    async fn execute_entity_query(
        &self,
        entity_type: SearchEntityType,
        query_text: &str,
        options: &SearchOptions,
    ) -> Result<(Vec<SearchHit>, u64, Value), SearchError> {
        let mut body = self.query_builder.build_query(query_text, options, entity_type);
        body["aggs"] = self.facet_generator.build_aggregation_request(entity_type);

        if self.config.boost_at_query_time && options.entity_type.is_federated() {
            let base = body["query"].take();
            body["query"] = self.scorer.enhance_query_with_entity_boosting(
                base,
                options.entity_type,
                options.entity_boosting.as_ref(),
            );
        }

        let index = self.config.index_for(entity_type);

        let results = match timeout(
            self.config.backend_timeout,
            self.backend.search(index, &body),
        )
        .await
        {
            Ok(Ok(results)) => results,
            Ok(Err(e)) => {
                error!(index = %index, error = %e, "Backend query failed");
                return Err(e.into());
            }
            Err(_) => {
                error!(
                    index = %index,
                    timeout_ms = self.config.backend_timeout.as_millis() as u64,
                    "Backend query timed out"
                );
                return Err(SearchError::backend_unavailable(format!(
                    "search on '{}' timed out after {}ms",
                    index,
                    self.config.backend_timeout.as_millis()
                )));
            }
        };

        let hits = results::parse_hits(
            results.hits,
            entity_type,
            &self.config.highlight_pre_tag,
            &self.config.highlight_post_tag,
        );

        Ok((hits, results.total, results.aggregations))
    }

    /// Emit the analytics event for a completed search, fire-and-forget.
    fn emit_search_event(&self, options: &SearchOptions, response: &SearchResponse) {
        let event = SearchEvent {
            query: options.query.clone(),
            entity_type: options.entity_type,
            filter_count: options.filters.len() + options.range_filters.len(),
            result_total: response.pagination.total,
            used_nlp: options.enable_nlp,
            personalized: options.personalized,
            experiment_id: response.experiment_id.clone(),
            duration_ms: response.took_ms,
            timestamp: Utc::now(),
        };

        let sink = Arc::clone(&self.analytics);
        tokio::spawn(async move {
            sink.record(event);
        });
    }
}

// The end-to-end behavior of the orchestrator is covered by the
// integration suite in tests/orchestrator_integration.rs, which drives this
// type against mock backend, cache, and analytics collaborators.
