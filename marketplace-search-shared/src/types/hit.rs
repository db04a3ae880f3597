//! Search hit types.

use serde::{Deserialize, Serialize};

use crate::types::document::EntityDocument;
use crate::types::entity_type::SearchEntityType;

/// Highlighted snippets for one document field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HighlightField {
    pub field: String,
    pub snippets: Vec<String>,
}

/// Highlighting output for a single hit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HighlightResult {
    /// Per-field snippet lists, in backend order.
    pub fields: Vec<HighlightField>,
    /// Lowercased query terms that produced a highlight.
    pub matched_terms: Vec<String>,
}

/// One matched document returned by the search backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    /// Backend document id.
    pub id: String,
    /// The collection the hit came from.
    pub entity_type: SearchEntityType,
    /// Raw relevance score from the backend, possibly adjusted by entity
    /// boosting.
    pub score: f64,
    /// The typed source document.
    pub document: EntityDocument,
    /// Highlighted snippets, when highlighting was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlights: Option<HighlightResult>,
}

/// A hit with its score rescaled into the common [0, 1] range.
///
/// Normalization is relative to the maximum raw score observed for the
/// hit's entity type within the same response, which makes scores
/// comparable across collections with different scoring scales.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedHit {
    #[serde(flatten)]
    pub hit: SearchHit,
    pub normalized_score: f64,
}
