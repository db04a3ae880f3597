//! Search analytics interface.
//!
//! The orchestrator emits one event per completed search, fire-and-forget:
//! recording must never block or fail the response.

use chrono::{DateTime, Utc};

use marketplace_search_shared::SearchEntityType;

/// One completed-search record for the analytics pipeline.
#[derive(Debug, Clone)]
pub struct SearchEvent {
    pub query: String,
    pub entity_type: SearchEntityType,
    pub filter_count: usize,
    pub result_total: u64,
    pub used_nlp: bool,
    pub personalized: bool,
    pub experiment_id: Option<String>,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

/// Receives search events.
///
/// `record` is called from a spawned task after the response is assembled;
/// implementations doing real I/O should queue internally rather than
/// block.
pub trait AnalyticsSink: Send + Sync {
    fn record(&self, event: SearchEvent);
}

/// Sink that emits events as structured log records.
pub struct TracingAnalyticsSink;

impl AnalyticsSink for TracingAnalyticsSink {
    fn record(&self, event: SearchEvent) {
        tracing::info!(
            query = %event.query,
            entity_type = %event.entity_type,
            filter_count = event.filter_count,
            result_total = event.result_total,
            used_nlp = event.used_nlp,
            personalized = event.personalized,
            experiment_id = event.experiment_id.as_deref().unwrap_or(""),
            duration_ms = event.duration_ms,
            "Search event"
        );
    }
}
