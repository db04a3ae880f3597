//! Raw result types returned by the search backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One raw hit from the search backend, before typed parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendHit {
    /// Backend document id (`_id`).
    pub id: String,
    /// The index the hit came from (`_index`).
    pub index: String,
    /// Raw relevance score (`_score`). Zero when the backend returned none
    /// (e.g. under a non-score sort).
    pub score: f64,
    /// The unparsed source document (`_source`).
    pub source: Value,
    /// Raw highlight payload (`highlight`), when highlighting was requested.
    pub highlight: Option<Value>,
}

/// The raw outcome of one backend search call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSearchResults {
    /// Matched hits in backend order.
    pub hits: Vec<BackendHit>,
    /// Total matching documents across all pages.
    pub total: u64,
    /// Raw aggregation payload, keyed by aggregation name.
    pub aggregations: Value,
    /// Backend-reported execution time in milliseconds.
    pub took_ms: u64,
}

impl BackendSearchResults {
    /// An empty result set.
    pub fn empty() -> Self {
        Self {
            hits: Vec::new(),
            total: 0,
            aggregations: Value::Null,
            took_ms: 0,
        }
    }
}
