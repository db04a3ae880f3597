//! NLP query processing interface.
//!
//! The relevance core treats NLP as an opaque text-rewriting step upstream
//! of query building; this module only defines the seam.

use std::collections::HashMap;

use async_trait::async_trait;

/// Outcome of processing a raw query through the NLP pipeline.
#[derive(Debug, Clone)]
pub struct ProcessedQuery {
    /// The rewritten query to match against the index.
    pub processed_query: String,
    /// Recognized entities by kind (e.g. "brand" -> ["ecowear"]).
    pub entities: HashMap<String, Vec<String>>,
    /// Detected search intent label.
    pub intent: String,
    /// Additional terms the expansion step produced.
    pub expanded_terms: Vec<String>,
}

impl ProcessedQuery {
    /// A result that passes the raw query through untouched.
    pub fn passthrough(raw_query: &str) -> Self {
        Self {
            processed_query: raw_query.to_string(),
            entities: HashMap::new(),
            intent: "search".to_string(),
            expanded_terms: Vec::new(),
        }
    }
}

/// Rewrites raw queries before they reach the query builder.
///
/// Implementations must not fail the search: anything going wrong inside
/// the processor should degrade to a passthrough result.
#[async_trait]
pub trait QueryProcessor: Send + Sync {
    /// Process a raw query.
    async fn process(&self, raw_query: &str) -> ProcessedQuery;
}

/// Processor that performs no rewriting. The default when no NLP service is
/// wired in.
pub struct PassthroughQueryProcessor;

#[async_trait]
impl QueryProcessor for PassthroughQueryProcessor {
    async fn process(&self, raw_query: &str) -> ProcessedQuery {
        ProcessedQuery::passthrough(raw_query)
    }
}
