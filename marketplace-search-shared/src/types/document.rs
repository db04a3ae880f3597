//! Typed entity documents.
//!
//! Source documents coming back from the search backend are deserialized
//! into one of these structures depending on the collection the hit came
//! from. Field names mirror the indexed document shape (camelCase).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::entity_type::SearchEntityType;

/// A product document as stored in the product index.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductDocument {
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
    pub tags: Vec<String>,
    pub values: Vec<String>,
    pub rating: f64,
    pub review_count: u64,
    pub in_stock: bool,
    pub is_sponsored: bool,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A merchant document as stored in the merchant index.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MerchantDocument {
    pub name: String,
    pub description: String,
    pub logo: String,
    pub hero_image: String,
    pub location: String,
    pub categories: Vec<String>,
    pub values: Vec<String>,
    pub rating: f64,
    pub review_count: u64,
    pub is_verified: bool,
    pub is_sponsored: bool,
    pub is_active: bool,
}

/// A brand document as stored in the brand index.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BrandDocument {
    pub name: String,
    pub description: String,
    pub logo: String,
    pub hero_image: String,
    pub location: String,
    pub story: String,
    pub categories: Vec<String>,
    pub values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub founded_year: Option<i32>,
    pub is_verified: bool,
    pub is_sponsored: bool,
    pub is_active: bool,
}

/// A source document from any of the three collections.
///
/// The variant is decided by which index a hit came from, so downstream
/// scoring and facet code can match exhaustively instead of probing an
/// untyped attribute map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "entity", rename_all = "lowercase")]
pub enum EntityDocument {
    Product(ProductDocument),
    Merchant(MerchantDocument),
    Brand(BrandDocument),
}

impl EntityDocument {
    /// The concrete entity type of this document.
    pub fn entity_type(&self) -> SearchEntityType {
        match self {
            EntityDocument::Product(_) => SearchEntityType::Product,
            EntityDocument::Merchant(_) => SearchEntityType::Merchant,
            EntityDocument::Brand(_) => SearchEntityType::Brand,
        }
    }

    /// The primary display text (product title or merchant/brand name).
    pub fn display_name(&self) -> &str {
        match self {
            EntityDocument::Product(p) => &p.title,
            EntityDocument::Merchant(m) => &m.name,
            EntityDocument::Brand(b) => &b.name,
        }
    }

    /// The document's category list.
    pub fn categories(&self) -> &[String] {
        match self {
            EntityDocument::Product(p) => &p.categories,
            EntityDocument::Merchant(m) => &m.categories,
            EntityDocument::Brand(b) => &b.categories,
        }
    }

    /// The document's declared values.
    pub fn values(&self) -> &[String] {
        match self {
            EntityDocument::Product(p) => &p.values,
            EntityDocument::Merchant(m) => &m.values,
            EntityDocument::Brand(b) => &b.values,
        }
    }

    /// The brand name associated with the document, if any.
    pub fn brand_name(&self) -> Option<&str> {
        match self {
            EntityDocument::Product(p) => Some(&p.brand_name),
            EntityDocument::Merchant(_) => None,
            EntityDocument::Brand(b) => Some(&b.name),
        }
    }

    /// Whether the document is flagged as sponsored content.
    pub fn is_sponsored(&self) -> bool {
        match self {
            EntityDocument::Product(p) => p.is_sponsored,
            EntityDocument::Merchant(m) => m.is_sponsored,
            EntityDocument::Brand(b) => b.is_sponsored,
        }
    }
}
