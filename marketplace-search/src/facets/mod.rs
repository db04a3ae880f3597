//! Facet generation.
//!
//! Builds per-entity aggregation requests, turns raw aggregation payloads
//! into the uniform facet structure, and combines facets from multiple
//! entity searches for the federated case. Generation is deterministic:
//! the same aggregation payload always produces the same facets.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use marketplace_search_shared::{
    PriceFacet, PriceRange, RatingBucket, SearchEntityType, SearchFacets, TermBucket,
    VerificationBucket, YearRangeBucket,
};

/// Bucket count for the common category/value aggregations.
const COMMON_TERMS_SIZE: u32 = 30;

/// Bucket count for entity-specific term aggregations.
const ENTITY_TERMS_SIZE: u32 = 20;

/// Generates entity-specific facets from search aggregations.
pub struct FacetGenerator;

impl FacetGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Build the aggregation request for one entity type.
    ///
    /// Categories and values are common to every entity type; products add
    /// price statistics/histogram and variant attribute terms, merchants
    /// and brands add location, rating, founding, and verification
    /// aggregations. The federated case adds an entity-type breakdown over
    /// the index name.
    pub fn build_aggregation_request(&self, entity_type: SearchEntityType) -> Value {
        let mut entries = serde_json::Map::new();
        entries.insert(
            "categories".to_string(),
            json!({"terms": {"field": "categories.keyword", "size": COMMON_TERMS_SIZE}}),
        );
        entries.insert(
            "values".to_string(),
            json!({"terms": {"field": "values.keyword", "size": COMMON_TERMS_SIZE}}),
        );

        match entity_type {
            SearchEntityType::Product => {
                entries.insert("price_stats".to_string(), json!({"stats": {"field": "price"}}));
                entries.insert(
                    "price_ranges".to_string(),
                    json!({
                        "range": {
                            "field": "price",
                            "ranges": [
                                {"to": 25},
                                {"from": 25, "to": 50},
                                {"from": 50, "to": 100},
                                {"from": 100, "to": 200},
                                {"from": 200}
                            ]
                        }
                    }),
                );
                entries.insert(
                    "brands".to_string(),
                    json!({"terms": {"field": "brandName.keyword", "size": ENTITY_TERMS_SIZE}}),
                );
                entries.insert(
                    "merchants".to_string(),
                    json!({"terms": {"field": "merchantName.keyword", "size": ENTITY_TERMS_SIZE}}),
                );
                entries.insert(
                    "tags".to_string(),
                    json!({"terms": {"field": "tags.keyword", "size": ENTITY_TERMS_SIZE}}),
                );
                entries.insert(
                    "colors".to_string(),
                    json!({"terms": {"field": "variants.attributes.color.keyword", "size": ENTITY_TERMS_SIZE}}),
                );
                entries.insert(
                    "sizes".to_string(),
                    json!({"terms": {"field": "variants.attributes.size.keyword", "size": ENTITY_TERMS_SIZE}}),
                );
                entries.insert(
                    "materials".to_string(),
                    json!({"terms": {"field": "materials.keyword", "size": ENTITY_TERMS_SIZE}}),
                );
                entries.insert(
                    "in_stock".to_string(),
                    json!({"terms": {"field": "inStock", "size": 2}}),
                );
            }
            SearchEntityType::Merchant => {
                entries.insert(
                    "locations".to_string(),
                    json!({"terms": {"field": "location.keyword", "size": ENTITY_TERMS_SIZE}}),
                );
                entries.insert(
                    "ratings".to_string(),
                    json!({"terms": {"field": "rating", "size": 5}}),
                );
                entries.insert(
                    "verification_status".to_string(),
                    json!({"terms": {"field": "isVerified", "size": 2}}),
                );
            }
            SearchEntityType::Brand => {
                entries.insert(
                    "locations".to_string(),
                    json!({"terms": {"field": "location.keyword", "size": ENTITY_TERMS_SIZE}}),
                );
                entries.insert(
                    "founded_year_ranges".to_string(),
                    json!({
                        "range": {
                            "field": "foundedYear",
                            "ranges": [
                                {"to": 1950},
                                {"from": 1950, "to": 1980},
                                {"from": 1980, "to": 2000},
                                {"from": 2000, "to": 2010},
                                {"from": 2010, "to": 2020},
                                {"from": 2020}
                            ]
                        }
                    }),
                );
                entries.insert(
                    "verification_status".to_string(),
                    json!({"terms": {"field": "isVerified", "size": 2}}),
                );
            }
            SearchEntityType::All => {
                entries.insert(
                    "entity_type".to_string(),
                    json!({"terms": {"field": "_index", "size": 3}}),
                );
            }
        }

        Value::Object(entries)
    }

    /// Generate facets from a raw aggregation payload for one entity type.
    pub fn generate_facets(
        &self,
        aggregations: &Value,
        entity_type: SearchEntityType,
    ) -> SearchFacets {
        if aggregations.is_null() {
            return SearchFacets::empty();
        }

        let mut facets = SearchFacets {
            categories: term_buckets(aggregations, "categories"),
            values: term_buckets(aggregations, "values"),
            ..Default::default()
        };

        match entity_type {
            SearchEntityType::Product => {
                facets.price = price_facet(aggregations);
                facets.brands = term_buckets(aggregations, "brands");
                facets.merchants = term_buckets(aggregations, "merchants");
                facets.tags = term_buckets(aggregations, "tags");
                facets.colors = term_buckets(aggregations, "colors");
                facets.sizes = term_buckets(aggregations, "sizes");
                facets.materials = term_buckets(aggregations, "materials");
            }
            SearchEntityType::Merchant => {
                facets.locations = term_buckets(aggregations, "locations");
                facets.ratings = rating_buckets(aggregations);
                facets.verification_status = verification_buckets(aggregations);
            }
            SearchEntityType::Brand => {
                facets.locations = term_buckets(aggregations, "locations");
                facets.founded_years = founded_year_buckets(aggregations);
                facets.verification_status = verification_buckets(aggregations);
            }
            SearchEntityType::All => {
                facets.entity_types = term_buckets(aggregations, "entity_type");
            }
        }

        facets
    }

    /// Combine facets from the three per-entity searches into one set.
    ///
    /// Category and value facets are unioned with counts summed for shared
    /// terms; the structured price facet comes from the product search;
    /// remaining entity-specific facets are carried over from their owning
    /// entity. An entity-type distribution is derived from each input's
    /// category counts, dropping entity types that contributed nothing.
    pub fn combine_facets(
        &self,
        product_facets: &SearchFacets,
        merchant_facets: &SearchFacets,
        brand_facets: &SearchFacets,
    ) -> SearchFacets {
        let inputs = [product_facets, merchant_facets, brand_facets];

        let categories = merge_term_buckets(inputs.iter().map(|f| f.categories.as_slice()));
        let values = merge_term_buckets(inputs.iter().map(|f| f.values.as_slice()));

        let mut locations = merchant_facets.locations.clone();
        locations.extend(brand_facets.locations.iter().cloned());

        let mut verification_status = merchant_facets.verification_status.clone();
        verification_status.extend(brand_facets.verification_status.iter().cloned());

        let entity_types: Vec<TermBucket> = [
            ("product", category_total(product_facets)),
            ("merchant", category_total(merchant_facets)),
            ("brand", category_total(brand_facets)),
        ]
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(name, count)| TermBucket::new(name, count))
        .collect();

        SearchFacets {
            categories,
            values,
            price: product_facets.price.clone(),
            brands: product_facets.brands.clone(),
            merchants: product_facets.merchants.clone(),
            tags: product_facets.tags.clone(),
            colors: product_facets.colors.clone(),
            sizes: product_facets.sizes.clone(),
            materials: product_facets.materials.clone(),
            locations,
            ratings: merchant_facets.ratings.clone(),
            founded_years: brand_facets.founded_years.clone(),
            verification_status,
            entity_types,
        }
    }
}

impl Default for FacetGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn category_total(facets: &SearchFacets) -> u64 {
    facets.categories.iter().map(|bucket| bucket.count).sum()
}

/// Union term buckets by name, summing counts for shared terms. The result
/// is ordered by name so combined output is stable regardless of input
/// order.
fn merge_term_buckets<'a>(sources: impl Iterator<Item = &'a [TermBucket]>) -> Vec<TermBucket> {
    let mut merged: BTreeMap<String, u64> = BTreeMap::new();
    for source in sources {
        for bucket in source {
            *merged.entry(bucket.name.clone()).or_insert(0) += bucket.count;
        }
    }
    merged
        .into_iter()
        .map(|(name, count)| TermBucket { name, count })
        .collect()
}

fn term_buckets(aggregations: &Value, name: &str) -> Vec<TermBucket> {
    let buckets = match aggregations[name]["buckets"].as_array() {
        Some(buckets) => buckets,
        None => return Vec::new(),
    };

    buckets
        .iter()
        .filter_map(|bucket| {
            let key = bucket_key(bucket)?;
            let count = bucket["doc_count"].as_u64().unwrap_or(0);
            Some(TermBucket { name: key, count })
        })
        .collect()
}

/// Bucket keys are strings for keyword fields but numbers or booleans for
/// numeric/boolean fields; render them uniformly.
fn bucket_key(bucket: &Value) -> Option<String> {
    if let Some(key) = bucket["key_as_string"].as_str() {
        return Some(key.to_string());
    }
    match &bucket["key"] {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn price_facet(aggregations: &Value) -> Option<PriceFacet> {
    let stats = &aggregations["price_stats"];
    let min = stats["min"].as_f64()?;
    let max = stats["max"].as_f64()?;

    let mut ranges = Vec::new();
    if let Some(buckets) = aggregations["price_ranges"]["buckets"].as_array() {
        for bucket in buckets {
            ranges.push(PriceRange {
                min: bucket["from"].as_f64().unwrap_or(min),
                max: bucket["to"].as_f64().unwrap_or(max),
                count: bucket["doc_count"].as_u64().unwrap_or(0),
            });
        }
    }

    Some(PriceFacet { min, max, ranges })
}

fn rating_buckets(aggregations: &Value) -> Vec<RatingBucket> {
    let buckets = match aggregations["ratings"]["buckets"].as_array() {
        Some(buckets) => buckets,
        None => return Vec::new(),
    };

    (1..=5u8)
        .filter_map(|value| {
            let count = buckets
                .iter()
                .find(|bucket| bucket["key"].as_f64() == Some(f64::from(value)))
                .and_then(|bucket| bucket["doc_count"].as_u64())
                .unwrap_or(0);
            (count > 0).then_some(RatingBucket { value, count })
        })
        .collect()
}

fn verification_buckets(aggregations: &Value) -> Vec<VerificationBucket> {
    let buckets = match aggregations["verification_status"]["buckets"].as_array() {
        Some(buckets) => buckets,
        None => return Vec::new(),
    };

    buckets
        .iter()
        .filter_map(|bucket| {
            let key = bucket_key(bucket)?;
            let status = if key == "true" || key == "1" {
                "Verified"
            } else {
                "Unverified"
            };
            Some(VerificationBucket {
                status: status.to_string(),
                count: bucket["doc_count"].as_u64().unwrap_or(0),
            })
        })
        .collect()
}

fn founded_year_buckets(aggregations: &Value) -> Vec<YearRangeBucket> {
    let buckets = match aggregations["founded_year_ranges"]["buckets"].as_array() {
        Some(buckets) => buckets,
        None => return Vec::new(),
    };

    buckets
        .iter()
        .map(|bucket| {
            let from = bucket["from"]
                .as_f64()
                .map(|v| format!("{}", v as i64))
                .unwrap_or_else(|| "Before".to_string());
            let to = bucket["to"]
                .as_f64()
                .map(|v| format!("{}", v as i64))
                .unwrap_or_else(|| "Present".to_string());
            YearRangeBucket {
                range: format!("{} - {}", from, to),
                count: bucket["doc_count"].as_u64().unwrap_or(0),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_aggs() -> Value {
        json!({
            "categories": {
                "buckets": [
                    {"key": "clothing", "doc_count": 12},
                    {"key": "accessories", "doc_count": 5}
                ]
            },
            "values": {
                "buckets": [{"key": "sustainable", "doc_count": 9}]
            },
            "price_stats": {"min": 5.0, "max": 250.0},
            "price_ranges": {
                "buckets": [
                    {"to": 25.0, "doc_count": 4},
                    {"from": 25.0, "to": 50.0, "doc_count": 7},
                    {"from": 200.0, "doc_count": 1}
                ]
            },
            "brands": {"buckets": [{"key": "EcoWear", "doc_count": 6}]},
            "tags": {"buckets": [{"key": "organic", "doc_count": 3}]}
        })
    }

    fn merchant_aggs() -> Value {
        json!({
            "categories": {
                "buckets": [
                    {"key": "clothing", "doc_count": 3},
                    {"key": "food", "doc_count": 2}
                ]
            },
            "values": {"buckets": [{"key": "fair trade", "doc_count": 4}]},
            "locations": {"buckets": [{"key": "Portland", "doc_count": 2}]},
            "ratings": {
                "buckets": [
                    {"key": 4.0, "doc_count": 3},
                    {"key": 5.0, "doc_count": 1}
                ]
            },
            "verification_status": {
                "buckets": [
                    {"key": 1, "key_as_string": "true", "doc_count": 4},
                    {"key": 0, "key_as_string": "false", "doc_count": 1}
                ]
            }
        })
    }

    fn brand_aggs() -> Value {
        json!({
            "categories": {"buckets": [{"key": "clothing", "doc_count": 2}]},
            "values": {"buckets": [{"key": "sustainable", "doc_count": 2}]},
            "locations": {"buckets": [{"key": "Copenhagen", "doc_count": 1}]},
            "founded_year_ranges": {
                "buckets": [
                    {"to": 1950.0, "doc_count": 0},
                    {"from": 1980.0, "to": 2000.0, "doc_count": 2},
                    {"from": 2020.0, "doc_count": 1}
                ]
            },
            "verification_status": {
                "buckets": [{"key": 1, "key_as_string": "true", "doc_count": 3}]
            }
        })
    }

    #[test]
    fn test_product_facets() {
        let facets =
            FacetGenerator::new().generate_facets(&product_aggs(), SearchEntityType::Product);

        assert_eq!(facets.categories.len(), 2);
        assert_eq!(facets.categories[0].name, "clothing");
        assert_eq!(facets.categories[0].count, 12);
        assert_eq!(facets.brands[0].name, "EcoWear");
        assert_eq!(facets.tags[0].name, "organic");

        let price = facets.price.unwrap();
        assert_eq!(price.min, 5.0);
        assert_eq!(price.max, 250.0);
        assert_eq!(price.ranges.len(), 3);
        // Open-ended buckets inherit the global bounds.
        assert_eq!(price.ranges[0].min, 5.0);
        assert_eq!(price.ranges[0].max, 25.0);
        assert_eq!(price.ranges[2].max, 250.0);
    }

    #[test]
    fn test_merchant_facets() {
        let facets =
            FacetGenerator::new().generate_facets(&merchant_aggs(), SearchEntityType::Merchant);

        assert_eq!(facets.locations[0].name, "Portland");
        assert_eq!(facets.ratings.len(), 2);
        assert_eq!(facets.ratings[0].value, 4);
        assert_eq!(facets.ratings[0].count, 3);
        assert_eq!(facets.verification_status[0].status, "Verified");
        assert_eq!(facets.verification_status[1].status, "Unverified");
        assert!(facets.price.is_none());
    }

    #[test]
    fn test_brand_facets() {
        let facets = FacetGenerator::new().generate_facets(&brand_aggs(), SearchEntityType::Brand);

        assert_eq!(facets.founded_years.len(), 3);
        assert_eq!(facets.founded_years[0].range, "Before - 1950");
        assert_eq!(facets.founded_years[1].range, "1980 - 2000");
        assert_eq!(facets.founded_years[2].range, "2020 - Present");
    }

    #[test]
    fn test_null_aggregations_yield_empty_facets() {
        let facets =
            FacetGenerator::new().generate_facets(&Value::Null, SearchEntityType::Product);
        assert_eq!(facets, SearchFacets::empty());
    }

    #[test]
    fn test_generation_is_deterministic() {
        let generator = FacetGenerator::new();
        let first = generator.generate_facets(&product_aggs(), SearchEntityType::Product);
        let second = generator.generate_facets(&product_aggs(), SearchEntityType::Product);
        assert_eq!(first, second);
    }

    #[test]
    fn test_combine_facets_sums_shared_terms() {
        let generator = FacetGenerator::new();
        let product = generator.generate_facets(&product_aggs(), SearchEntityType::Product);
        let merchant = generator.generate_facets(&merchant_aggs(), SearchEntityType::Merchant);
        let brand = generator.generate_facets(&brand_aggs(), SearchEntityType::Brand);

        let combined = generator.combine_facets(&product, &merchant, &brand);

        // "clothing" appears in all three inputs: 12 + 3 + 2.
        let clothing = combined
            .categories
            .iter()
            .find(|b| b.name == "clothing")
            .unwrap();
        assert_eq!(clothing.count, 17);

        // Union keeps entity-specific terms.
        assert!(combined.categories.iter().any(|b| b.name == "food"));
        assert!(combined.categories.iter().any(|b| b.name == "accessories"));

        // "sustainable" value is shared by product and brand: 9 + 2.
        let sustainable = combined
            .values
            .iter()
            .find(|b| b.name == "sustainable")
            .unwrap();
        assert_eq!(sustainable.count, 11);

        // Price comes from the product side; locations are concatenated.
        assert!(combined.price.is_some());
        assert_eq!(combined.locations.len(), 2);

        // Entity distribution from category totals.
        assert_eq!(combined.entity_types.len(), 3);
        let product_bucket = combined
            .entity_types
            .iter()
            .find(|b| b.name == "product")
            .unwrap();
        assert_eq!(product_bucket.count, 17);
    }

    #[test]
    fn test_combine_drops_empty_entity_types() {
        let generator = FacetGenerator::new();
        let product = generator.generate_facets(&product_aggs(), SearchEntityType::Product);
        let empty = SearchFacets::empty();

        let combined = generator.combine_facets(&product, &empty, &empty);
        assert_eq!(combined.entity_types.len(), 1);
        assert_eq!(combined.entity_types[0].name, "product");
    }

    #[test]
    fn test_aggregation_request_shapes() {
        let generator = FacetGenerator::new();

        let product = generator.build_aggregation_request(SearchEntityType::Product);
        assert_eq!(product["categories"]["terms"]["field"], "categories.keyword");
        assert_eq!(product["categories"]["terms"]["size"], 30);
        assert_eq!(product["price_stats"]["stats"]["field"], "price");
        assert_eq!(
            product["price_ranges"]["range"]["ranges"][1]["from"],
            25
        );
        assert_eq!(product["brands"]["terms"]["field"], "brandName.keyword");

        let merchant = generator.build_aggregation_request(SearchEntityType::Merchant);
        assert_eq!(merchant["ratings"]["terms"]["field"], "rating");
        assert_eq!(
            merchant["verification_status"]["terms"]["field"],
            "isVerified"
        );
        assert!(merchant.get("price_stats").is_none());

        let brand = generator.build_aggregation_request(SearchEntityType::Brand);
        assert_eq!(
            brand["founded_year_ranges"]["range"]["field"],
            "foundedYear"
        );

        let all = generator.build_aggregation_request(SearchEntityType::All);
        assert_eq!(all["entity_type"]["terms"]["field"], "_index");
    }
}
