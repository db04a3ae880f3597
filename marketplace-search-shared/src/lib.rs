//! # Marketplace Search Shared
//!
//! Shared types and data structures for the marketplace search engine.
//!
//! This crate contains the plain data types that flow between the search
//! components: search options and filters, typed entity documents, hits,
//! facets, and the response structures. It carries no runtime dependencies
//! beyond serialization support.

pub mod types;

pub use types::document::{BrandDocument, EntityDocument, MerchantDocument, ProductDocument};
pub use types::entity_type::SearchEntityType;
pub use types::facets::{
    PriceFacet, PriceRange, RatingBucket, SearchFacets, TermBucket, VerificationBucket,
    YearRangeBucket,
};
pub use types::hit::{HighlightField, HighlightResult, NormalizedHit, SearchHit};
pub use types::response::{
    BrandResult, EntityDistribution, MerchantResult, PaginationInfo, ProductResult, ScoreSummary,
    SearchResponse,
};
pub use types::search_options::{
    EntityBoosting, RangeFilter, SearchOptions, SortDirection, SortSpec, TermFilter,
};
