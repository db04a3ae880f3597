//! Entity type definitions for multi-entity search.

use serde::{Deserialize, Serialize};

/// The kind of entity a search targets.
///
/// A search either targets one collection (products, merchants, brands) or
/// federates across all three with [`SearchEntityType::All`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchEntityType {
    /// Search the product collection. This is the default.
    #[default]
    Product,

    /// Search the merchant collection.
    Merchant,

    /// Search the brand collection.
    Brand,

    /// Federated search across products, merchants, and brands.
    All,
}

impl SearchEntityType {
    /// Returns true for the federated cross-entity case.
    pub fn is_federated(&self) -> bool {
        matches!(self, SearchEntityType::All)
    }

    /// The three concrete entity types, in their fixed presentation order.
    pub fn single_types() -> [SearchEntityType; 3] {
        [
            SearchEntityType::Product,
            SearchEntityType::Merchant,
            SearchEntityType::Brand,
        ]
    }

    /// Short lowercase label used in cache keys and log records.
    pub fn label(&self) -> &'static str {
        match self {
            SearchEntityType::Product => "product",
            SearchEntityType::Merchant => "merchant",
            SearchEntityType::Brand => "brand",
            SearchEntityType::All => "all",
        }
    }
}

impl std::fmt::Display for SearchEntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
