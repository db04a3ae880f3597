//! Facet types.
//!
//! Facets are read-only aggregation summaries computed fresh for each
//! search response; they are never persisted.

use serde::{Deserialize, Serialize};

/// A (term, count) aggregation bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TermBucket {
    pub name: String,
    pub count: u64,
}

impl TermBucket {
    pub fn new(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// A star-rating bucket (1 through 5).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RatingBucket {
    pub value: u8,
    pub count: u64,
}

/// One backend-computed price sub-range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
    pub count: u64,
}

/// Structured price facet: global bounds plus histogram ranges.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceFacet {
    pub min: f64,
    pub max: f64,
    pub ranges: Vec<PriceRange>,
}

/// A founded-year range bucket for brand facets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct YearRangeBucket {
    /// Human-readable range label (e.g. "1980 - 2000").
    pub range: String,
    pub count: u64,
}

/// A verification-status bucket for merchant/brand facets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationBucket {
    /// "Verified" or "Unverified".
    pub status: String,
    pub count: u64,
}

/// The full facet set for one search response.
///
/// Category and value facets are common to every entity type; the rest are
/// populated only when the owning entity type was searched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchFacets {
    pub categories: Vec<TermBucket>,
    pub values: Vec<TermBucket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<PriceFacet>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub brands: Vec<TermBucket>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub merchants: Vec<TermBucket>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<TermBucket>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub colors: Vec<TermBucket>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub sizes: Vec<TermBucket>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub materials: Vec<TermBucket>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub locations: Vec<TermBucket>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub ratings: Vec<RatingBucket>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub founded_years: Vec<YearRangeBucket>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub verification_status: Vec<VerificationBucket>,
    /// Per-entity-type result distribution, populated for federated
    /// searches.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub entity_types: Vec<TermBucket>,
}

impl SearchFacets {
    /// An empty facet set.
    pub fn empty() -> Self {
        Self::default()
    }
}
