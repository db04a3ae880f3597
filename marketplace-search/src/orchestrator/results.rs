//! Hit parsing and response assembly helpers.
//!
//! Turns raw backend hits into typed hits (documents, highlights) and
//! splits ranked hit lists into the per-entity result lists of the
//! response.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::warn;

use marketplace_search_repository::BackendHit;
use marketplace_search_shared::{
    BrandDocument, BrandResult, EntityDocument, HighlightField, HighlightResult, MerchantDocument,
    MerchantResult, NormalizedHit, ProductDocument, ProductResult, SearchEntityType, SearchHit,
};

/// Parse raw backend hits into typed hits for one entity type.
///
/// Hits whose source cannot be deserialized into the entity's document
/// shape are dropped with a warning; a malformed document is an indexing
/// defect, not a reason to fail the search.
pub fn parse_hits(
    raw_hits: Vec<BackendHit>,
    entity_type: SearchEntityType,
    pre_tag: &str,
    post_tag: &str,
) -> Vec<SearchHit> {
    raw_hits
        .into_iter()
        .filter_map(|raw| {
            let document = parse_document(entity_type, raw.source)?;
            let highlights = raw
                .highlight
                .as_ref()
                .and_then(|h| parse_highlights(h, pre_tag, post_tag));
            Some(SearchHit {
                id: raw.id,
                entity_type,
                score: raw.score,
                document,
                highlights,
            })
        })
        .collect()
}

fn parse_document(entity_type: SearchEntityType, source: Value) -> Option<EntityDocument> {
    let parsed = match entity_type {
        SearchEntityType::Product => {
            serde_json::from_value::<ProductDocument>(source).map(EntityDocument::Product)
        }
        SearchEntityType::Merchant => {
            serde_json::from_value::<MerchantDocument>(source).map(EntityDocument::Merchant)
        }
        SearchEntityType::Brand => {
            serde_json::from_value::<BrandDocument>(source).map(EntityDocument::Brand)
        }
        SearchEntityType::All => return None,
    };

    match parsed {
        Ok(document) => Some(document),
        Err(e) => {
            warn!(entity_type = %entity_type, error = %e, "Dropping hit with malformed source");
            None
        }
    }
}

/// Parse a raw highlight payload into per-field snippets plus the set of
/// matched terms extracted from the configured markup tags.
pub fn parse_highlights(raw: &Value, pre_tag: &str, post_tag: &str) -> Option<HighlightResult> {
    let object = raw.as_object()?;

    let mut fields = Vec::new();
    let mut terms: BTreeSet<String> = BTreeSet::new();

    for (field, raw_snippets) in object {
        let snippets: Vec<String> = raw_snippets
            .as_array()
            .map(|array| {
                array
                    .iter()
                    .filter_map(|s| s.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        if snippets.is_empty() {
            continue;
        }

        for snippet in &snippets {
            terms.extend(extract_marked_terms(snippet, pre_tag, post_tag));
        }

        fields.push(HighlightField {
            field: field.clone(),
            snippets,
        });
    }

    if fields.is_empty() {
        return None;
    }

    Some(HighlightResult {
        fields,
        matched_terms: terms.into_iter().collect(),
    })
}

/// Pull the lowercased terms between each pre/post tag pair out of one
/// snippet.
fn extract_marked_terms(snippet: &str, pre_tag: &str, post_tag: &str) -> Vec<String> {
    let mut terms = Vec::new();
    if pre_tag.is_empty() || post_tag.is_empty() {
        return terms;
    }

    let mut rest = snippet;
    while let Some(start) = rest.find(pre_tag) {
        rest = &rest[start + pre_tag.len()..];
        match rest.find(post_tag) {
            Some(end) => {
                terms.push(rest[..end].to_lowercase());
                rest = &rest[end + post_tag.len()..];
            }
            None => break,
        }
    }
    terms
}

/// Split ranked hits into per-entity result lists, keeping each hit's rank
/// order within its own list.
pub fn split_hits(hits: &[SearchHit]) -> (Vec<ProductResult>, Vec<MerchantResult>, Vec<BrandResult>) {
    let mut products = Vec::new();
    let mut merchants = Vec::new();
    let mut brands = Vec::new();

    for hit in hits {
        append_hit(hit, None, &mut products, &mut merchants, &mut brands);
    }

    (products, merchants, brands)
}

/// As [`split_hits`], carrying each hit's normalized score into the result.
pub fn split_normalized_hits(
    hits: &[NormalizedHit],
) -> (Vec<ProductResult>, Vec<MerchantResult>, Vec<BrandResult>) {
    let mut products = Vec::new();
    let mut merchants = Vec::new();
    let mut brands = Vec::new();

    for normalized in hits {
        append_hit(
            &normalized.hit,
            Some(normalized.normalized_score),
            &mut products,
            &mut merchants,
            &mut brands,
        );
    }

    (products, merchants, brands)
}

fn append_hit(
    hit: &SearchHit,
    normalized_score: Option<f64>,
    products: &mut Vec<ProductResult>,
    merchants: &mut Vec<MerchantResult>,
    brands: &mut Vec<BrandResult>,
) {
    match &hit.document {
        EntityDocument::Product(doc) => products.push(ProductResult {
            id: hit.id.clone(),
            title: doc.title.clone(),
            description: doc.description.clone(),
            price: doc.price,
            currency: doc.currency.clone(),
            images: doc.images.clone(),
            merchant_id: doc.merchant_id.clone(),
            merchant_name: doc.merchant_name.clone(),
            brand_id: doc.brand_id.clone(),
            brand_name: doc.brand_name.clone(),
            categories: doc.categories.clone(),
            values: doc.values.clone(),
            rating: doc.rating,
            review_count: doc.review_count,
            is_sponsored: doc.is_sponsored,
            score: hit.score,
            normalized_score,
            highlights: hit.highlights.clone(),
        }),
        EntityDocument::Merchant(doc) => merchants.push(MerchantResult {
            id: hit.id.clone(),
            name: doc.name.clone(),
            description: doc.description.clone(),
            logo: doc.logo.clone(),
            hero_image: doc.hero_image.clone(),
            location: doc.location.clone(),
            categories: doc.categories.clone(),
            values: doc.values.clone(),
            rating: doc.rating,
            review_count: doc.review_count,
            is_sponsored: doc.is_sponsored,
            score: hit.score,
            normalized_score,
            highlights: hit.highlights.clone(),
        }),
        EntityDocument::Brand(doc) => brands.push(BrandResult {
            id: hit.id.clone(),
            name: doc.name.clone(),
            description: doc.description.clone(),
            logo: doc.logo.clone(),
            hero_image: doc.hero_image.clone(),
            location: doc.location.clone(),
            categories: doc.categories.clone(),
            values: doc.values.clone(),
            founded_year: doc.founded_year,
            is_sponsored: doc.is_sponsored,
            score: hit.score,
            normalized_score,
            highlights: hit.highlights.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backend_hit(id: &str, score: f64, source: Value) -> BackendHit {
        BackendHit {
            id: id.to_string(),
            index: "products".to_string(),
            score,
            source,
            highlight: None,
        }
    }

    #[test]
    fn test_parse_hits_builds_typed_documents() {
        let hits = parse_hits(
            vec![backend_hit(
                "p-1",
                4.2,
                json!({"title": "Shirt", "brandName": "EcoWear"}),
            )],
            SearchEntityType::Product,
            "<em>",
            "</em>",
        );

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "p-1");
        assert_eq!(hits[0].score, 4.2);
        match &hits[0].document {
            EntityDocument::Product(doc) => assert_eq!(doc.title, "Shirt"),
            other => panic!("expected product document, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_hits_drops_malformed_sources() {
        let hits = parse_hits(
            vec![
                backend_hit("p-1", 1.0, json!({"title": "Shirt"})),
                backend_hit("p-2", 2.0, Value::Null),
            ],
            SearchEntityType::Product,
            "<em>",
            "</em>",
        );

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "p-1");
    }

    #[test]
    fn test_parse_highlights_extracts_terms() {
        let raw = json!({
            "title": ["<em>Organic</em> Cotton <em>Shirt</em>"],
            "description": ["soft <em>organic</em> fabric"]
        });

        let highlights = parse_highlights(&raw, "<em>", "</em>").unwrap();

        assert_eq!(highlights.fields.len(), 2);
        // Terms are lowercased and deduplicated.
        assert_eq!(highlights.matched_terms, vec!["organic", "shirt"]);
    }

    #[test]
    fn test_parse_highlights_custom_tags() {
        let raw = json!({"title": ["**Organic** Shirt"]});
        let highlights = parse_highlights(&raw, "**", "**").unwrap();
        assert_eq!(highlights.matched_terms, vec!["organic"]);
    }

    #[test]
    fn test_parse_highlights_empty_payload() {
        assert!(parse_highlights(&json!({}), "<em>", "</em>").is_none());
        assert!(parse_highlights(&json!({"title": []}), "<em>", "</em>").is_none());
    }

    #[test]
    fn test_unterminated_tag_is_ignored() {
        let terms = extract_marked_terms("<em>organic shirt", "<em>", "</em>");
        assert!(terms.is_empty());
    }

    #[test]
    fn test_split_hits_keeps_rank_order() {
        let hits = vec![
            SearchHit {
                id: "p-1".to_string(),
                entity_type: SearchEntityType::Product,
                score: 3.0,
                document: EntityDocument::Product(ProductDocument {
                    title: "First".to_string(),
                    ..Default::default()
                }),
                highlights: None,
            },
            SearchHit {
                id: "m-1".to_string(),
                entity_type: SearchEntityType::Merchant,
                score: 2.0,
                document: EntityDocument::Merchant(MerchantDocument::default()),
                highlights: None,
            },
            SearchHit {
                id: "p-2".to_string(),
                entity_type: SearchEntityType::Product,
                score: 1.0,
                document: EntityDocument::Product(ProductDocument::default()),
                highlights: None,
            },
        ];

        let (products, merchants, brands) = split_hits(&hits);

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].id, "p-1");
        assert_eq!(products[1].id, "p-2");
        assert_eq!(merchants.len(), 1);
        assert!(brands.is_empty());
        assert!(products[0].normalized_score.is_none());
    }
}
