//! Search option types.
//!
//! This module defines the request structure consumed by the search
//! orchestrator, including filters, sorting, and feature flags.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::entity_type::SearchEntityType;

/// Default page size for search results.
pub const DEFAULT_LIMIT: usize = 20;

/// Maximum page size. Requests above this are capped.
pub const MAX_LIMIT: usize = 100;

/// A categorical filter on a single field.
///
/// With `exact` set, values are matched against the keyword form of the
/// field; otherwise the backend's analyzed match is used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TermFilter {
    /// The document field to filter on (e.g. "categories", "brandName").
    pub field: String,
    /// Accepted values. A document matches if it carries any of them.
    pub values: Vec<String>,
    /// Match on the exact keyword form instead of analyzed text.
    #[serde(default)]
    pub exact: bool,
}

impl TermFilter {
    /// Create an exact-match filter.
    pub fn exact(field: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            field: field.into(),
            values,
            exact: true,
        }
    }
}

/// A numeric range filter (price, rating, founded year, ...).
///
/// Either bound may be open.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RangeFilter {
    /// The numeric document field to filter on.
    pub field: String,
    /// Inclusive lower bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Inclusive upper bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Sort direction for an explicit sort field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One entry in an ordered sort specification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

/// Per-entity-type boost weights for federated searches.
///
/// Unset weights fall back to the configured defaults (product 1.0,
/// merchant 0.8, brand 0.8).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EntityBoosting {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_boost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_boost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_boost: Option<f64>,
}

/// Search request parameters.
///
/// Options are immutable for the duration of a search invocation; the
/// experiment engine produces a derived copy when a variant modifies them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchOptions {
    /// Free-text query. An empty or whitespace-only query matches everything.
    pub query: String,

    /// The entity collection(s) to search.
    #[serde(default)]
    pub entity_type: SearchEntityType,

    /// Zero-indexed result page.
    #[serde(default)]
    pub page: usize,

    /// Maximum results per page. Capped at [`MAX_LIMIT`].
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Categorical filters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<TermFilter>,

    /// Numeric range filters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub range_filters: Vec<RangeFilter>,

    /// Explicit sort order. Empty means relevance (or newest-first when
    /// there is no query).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortSpec>,

    /// Run the query through the NLP processor before building the backend
    /// query.
    #[serde(default)]
    pub enable_nlp: bool,

    /// Apply user-specific boosting. Personalized searches bypass the cache.
    #[serde(default)]
    pub personalized: bool,

    /// Boost results whose declared values align with the user's.
    #[serde(default)]
    pub boost_by_values: bool,

    /// Include sponsored results. Defaults to true.
    #[serde(default = "default_true")]
    pub include_sponsored_content: bool,

    /// Attach highlighted snippets to results.
    #[serde(default)]
    pub enable_highlighting: bool,

    /// Per-entity boost weight overrides for federated searches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_boosting: Option<EntityBoosting>,

    /// Experiment tag. Before assignment this is the bare experiment id;
    /// after assignment it is `"{experiment_id}:{variant_id}"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiment_id: Option<String>,

    /// Authenticated user, for personalization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,

    /// Session identifier, for deterministic experiment assignment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_true() -> bool {
    true
}

impl SearchOptions {
    /// Create options for a query against one entity collection.
    ///
    /// # Example
    ///
    /// ```
    /// use marketplace_search_shared::{SearchEntityType, SearchOptions};
    ///
    /// let options = SearchOptions::new("organic cotton shirt", SearchEntityType::Product);
    /// assert_eq!(options.limit, 20);
    /// ```
    pub fn new(query: impl Into<String>, entity_type: SearchEntityType) -> Self {
        Self {
            query: query.into(),
            entity_type,
            page: 0,
            limit: DEFAULT_LIMIT,
            filters: Vec::new(),
            range_filters: Vec::new(),
            sort: Vec::new(),
            enable_nlp: false,
            personalized: false,
            boost_by_values: false,
            include_sponsored_content: true,
            enable_highlighting: false,
            entity_boosting: None,
            experiment_id: None,
            user_id: None,
            session_id: None,
        }
    }

    /// Create options for a federated search across all entity types.
    pub fn all_entities(query: impl Into<String>) -> Self {
        Self::new(query, SearchEntityType::All)
    }

    /// Set the result page.
    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Set the page size, capped at [`MAX_LIMIT`].
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.min(MAX_LIMIT);
        self
    }

    /// Add a categorical filter.
    pub fn with_filter(mut self, filter: TermFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add a numeric range filter.
    pub fn with_range_filter(mut self, filter: RangeFilter) -> Self {
        self.range_filters.push(filter);
        self
    }

    /// Add a sort entry.
    pub fn with_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(SortSpec {
            field: field.into(),
            direction,
        });
        self
    }

    /// Tag the request with an experiment id for variant assignment.
    pub fn with_experiment(mut self, experiment_id: impl Into<String>) -> Self {
        self.experiment_id = Some(experiment_id.into());
        self
    }

    /// True when the query has no searchable text.
    pub fn has_query(&self) -> bool {
        !self.query.trim().is_empty()
    }

    /// Validate the option shape.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.limit == 0 {
            return Err("limit must be at least 1".to_string());
        }

        if self.limit > MAX_LIMIT {
            return Err(format!("limit cannot exceed {}", MAX_LIMIT));
        }

        for filter in &self.filters {
            if filter.field.trim().is_empty() {
                return Err("filter field cannot be empty".to_string());
            }
        }

        for range in &self.range_filters {
            if range.field.trim().is_empty() {
                return Err("range filter field cannot be empty".to_string());
            }
            if let (Some(min), Some(max)) = (range.min, range.max) {
                if min > max {
                    return Err(format!(
                        "range filter on '{}' has min {} above max {}",
                        range.field, min, max
                    ));
                }
            }
        }

        Ok(())
    }
}
