//! Search response types.

use serde::{Deserialize, Serialize};

use crate::types::facets::SearchFacets;
use crate::types::hit::HighlightResult;

/// Pagination metadata for a result page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationInfo {
    /// Total matching documents across all pages.
    pub total: u64,
    /// The zero-indexed page this response covers.
    pub page: usize,
    /// Requested page size.
    pub limit: usize,
    /// Total number of pages.
    pub total_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PaginationInfo {
    /// Compute pagination metadata from a total count and page window.
    pub fn new(total: u64, page: usize, limit: usize) -> Self {
        let total_pages = if limit > 0 {
            total.div_ceil(limit as u64)
        } else {
            0
        };

        Self {
            total,
            page,
            limit,
            total_pages,
            has_next: (page as u64 + 1) < total_pages,
            has_previous: page > 0 && total_pages > 0,
        }
    }
}

/// A product entry in the response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProductResult {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub currency: String,
    pub images: Vec<String>,
    pub merchant_id: String,
    pub merchant_name: String,
    pub brand_id: String,
    pub brand_name: String,
    pub categories: Vec<String>,
    pub values: Vec<String>,
    pub rating: f64,
    pub review_count: u64,
    pub is_sponsored: bool,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlights: Option<HighlightResult>,
}

/// A merchant entry in the response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MerchantResult {
    pub id: String,
    pub name: String,
    pub description: String,
    pub logo: String,
    pub hero_image: String,
    pub location: String,
    pub categories: Vec<String>,
    pub values: Vec<String>,
    pub rating: f64,
    pub review_count: u64,
    pub is_sponsored: bool,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlights: Option<HighlightResult>,
}

/// A brand entry in the response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BrandResult {
    pub id: String,
    pub name: String,
    pub description: String,
    pub logo: String,
    pub hero_image: String,
    pub location: String,
    pub categories: Vec<String>,
    pub values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub founded_year: Option<i32>,
    pub is_sponsored: bool,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlights: Option<HighlightResult>,
}

/// How many results each entity type contributed to a federated response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityDistribution {
    pub products: usize,
    pub merchants: usize,
    pub brands: usize,
}

/// Summary statistics over the relevance scores in a response page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreSummary {
    pub max: f64,
    pub min: f64,
    pub mean: f64,
}

impl ScoreSummary {
    /// Summarize a list of scores. Returns `None` for an empty list.
    pub fn from_scores(scores: &[f64]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }

        let mut max = f64::MIN;
        let mut min = f64::MAX;
        let mut sum = 0.0;
        for &score in scores {
            max = max.max(score);
            min = min.min(score);
            sum += score;
        }

        Some(Self {
            max,
            min,
            mean: sum / scores.len() as f64,
        })
    }
}

/// Complete response for one search invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
    /// The query as submitted by the caller.
    pub query: String,
    /// The query after NLP processing, when NLP ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_query: Option<String>,
    pub pagination: PaginationInfo,
    pub facets: SearchFacets,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub products: Vec<ProductResult>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub merchants: Vec<MerchantResult>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub brands: Vec<BrandResult>,
    pub used_nlp: bool,
    pub highlights_enabled: bool,
    pub personalized: bool,
    /// Experiment tag (`"{experiment_id}:{variant_id}"`), when an experiment
    /// served the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_distribution: Option<EntityDistribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_scores: Option<ScoreSummary>,
    /// Wall-clock duration of the search in milliseconds.
    pub took_ms: u64,
}

impl SearchResponse {
    /// An empty response echoing the given query and page window.
    pub fn empty(query: impl Into<String>, page: usize, limit: usize) -> Self {
        Self {
            query: query.into(),
            pagination: PaginationInfo::new(0, page, limit),
            facets: SearchFacets::empty(),
            ..Default::default()
        }
    }

    /// Number of results on this page across all entity types.
    pub fn len(&self) -> usize {
        self.products.len() + self.merchants.len() + self.brands.len()
    }

    /// True when the page carries no results.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_math() {
        let pagination = PaginationInfo::new(45, 0, 20);
        assert_eq!(pagination.total_pages, 3);
        assert!(pagination.has_next);
        assert!(!pagination.has_previous);

        let last = PaginationInfo::new(45, 2, 20);
        assert!(!last.has_next);
        assert!(last.has_previous);
    }

    #[test]
    fn test_pagination_empty() {
        let pagination = PaginationInfo::new(0, 0, 20);
        assert_eq!(pagination.total_pages, 0);
        assert!(!pagination.has_next);
        assert!(!pagination.has_previous);
    }

    #[test]
    fn test_pagination_zero_limit() {
        let pagination = PaginationInfo::new(10, 0, 0);
        assert_eq!(pagination.total_pages, 0);
    }

    #[test]
    fn test_score_summary() {
        let summary = ScoreSummary::from_scores(&[1.0, 0.5, 0.75]).unwrap();
        assert_eq!(summary.max, 1.0);
        assert_eq!(summary.min, 0.5);
        assert!((summary.mean - 0.75).abs() < 1e-9);

        assert!(ScoreSummary::from_scores(&[]).is_none());
    }

    #[test]
    fn test_empty_response() {
        let response = SearchResponse::empty("shirt", 0, 20);
        assert!(response.is_empty());
        assert_eq!(response.len(), 0);
        assert_eq!(response.pagination.total, 0);
        assert_eq!(response.query, "shirt");
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut response = SearchResponse::empty("shirt", 0, 20);
        response.products.push(ProductResult {
            id: "p-1".to_string(),
            title: "Shirt".to_string(),
            score: 2.0,
            normalized_score: Some(1.0),
            ..Default::default()
        });

        let json = serde_json::to_string(&response).unwrap();
        let parsed: SearchResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(response, parsed);
    }
}
