//! Cross-entity score normalization.
//!
//! Different collections do not produce comparable raw relevance
//! magnitudes, so federated results are rescaled per entity type before
//! they are merged into one ranking. Without this step a 0.9-scoring
//! product would be unfairly ranked below a 0.95-scoring merchant purely
//! because of different scoring scales.

use marketplace_search_shared::{NormalizedHit, SearchEntityType, SearchHit};

/// Rescale hit scores into a common [0, 1] range per entity type.
///
/// Hits are partitioned by entity type; within each partition every score
/// is divided by the partition's maximum. A partition whose maximum is zero
/// is left unnormalized to avoid division by zero. Partitions are then
/// recombined in the fixed order products, merchants, brands and the
/// combined list is sorted descending by normalized score (the sort is
/// stable, so the type order breaks ties).
///
/// Idempotent: reapplying to already-normalized scores changes nothing,
/// since each partition's maximum is already 1.0 (aside from the zero-max
/// edge case).
pub fn normalize_scores(hits: Vec<SearchHit>) -> Vec<NormalizedHit> {
    let mut products = Vec::new();
    let mut merchants = Vec::new();
    let mut brands = Vec::new();

    for hit in hits {
        match hit.entity_type {
            SearchEntityType::Merchant => merchants.push(hit),
            SearchEntityType::Brand => brands.push(hit),
            _ => products.push(hit),
        }
    }

    let mut combined = Vec::with_capacity(products.len() + merchants.len() + brands.len());
    combined.extend(normalize_partition(products));
    combined.extend(normalize_partition(merchants));
    combined.extend(normalize_partition(brands));

    combined.sort_by(|a, b| b.normalized_score.total_cmp(&a.normalized_score));
    combined
}

fn normalize_partition(hits: Vec<SearchHit>) -> Vec<NormalizedHit> {
    let max_score = hits.iter().fold(0.0_f64, |max, hit| max.max(hit.score));

    hits.into_iter()
        .map(|hit| {
            let normalized_score = if max_score > 0.0 {
                hit.score / max_score
            } else {
                hit.score
            };
            NormalizedHit {
                hit,
                normalized_score,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketplace_search_shared::{
        EntityDocument, MerchantDocument, ProductDocument,
    };

    fn hit(id: &str, entity_type: SearchEntityType, score: f64) -> SearchHit {
        let document = match entity_type {
            SearchEntityType::Merchant => EntityDocument::Merchant(MerchantDocument::default()),
            _ => EntityDocument::Product(ProductDocument::default()),
        };
        SearchHit {
            id: id.to_string(),
            entity_type,
            score,
            document,
            highlights: None,
        }
    }

    #[test]
    fn test_each_partition_max_is_one() {
        let hits = vec![
            hit("p-1", SearchEntityType::Product, 8.0),
            hit("p-2", SearchEntityType::Product, 4.0),
            hit("p-3", SearchEntityType::Product, 2.0),
            hit("m-1", SearchEntityType::Merchant, 1.2),
            hit("m-2", SearchEntityType::Merchant, 0.6),
        ];

        let normalized = normalize_scores(hits);

        let product_max = normalized
            .iter()
            .filter(|h| h.hit.entity_type == SearchEntityType::Product)
            .map(|h| h.normalized_score)
            .fold(0.0_f64, f64::max);
        let merchant_max = normalized
            .iter()
            .filter(|h| h.hit.entity_type == SearchEntityType::Merchant)
            .map(|h| h.normalized_score)
            .fold(0.0_f64, f64::max);

        assert_eq!(product_max, 1.0);
        assert_eq!(merchant_max, 1.0);
    }

    #[test]
    fn test_combined_ordering_products_first_on_ties() {
        // The federated scenario: products 8/4/2, merchants 1.2/0.6. Both
        // partition tops normalize to 1.0; the stable sort keeps the
        // product partition first on the tie.
        let hits = vec![
            hit("p-1", SearchEntityType::Product, 8.0),
            hit("p-2", SearchEntityType::Product, 4.0),
            hit("p-3", SearchEntityType::Product, 2.0),
            hit("m-1", SearchEntityType::Merchant, 1.2),
            hit("m-2", SearchEntityType::Merchant, 0.6),
        ];

        let normalized = normalize_scores(hits);
        let ids: Vec<&str> = normalized.iter().map(|h| h.hit.id.as_str()).collect();

        assert_eq!(ids, vec!["p-1", "m-1", "p-2", "m-2", "p-3"]);
        assert_eq!(normalized[0].normalized_score, 1.0);
        assert_eq!(normalized[1].normalized_score, 1.0);
        assert_eq!(normalized[2].normalized_score, 0.5);
        assert_eq!(normalized[3].normalized_score, 0.5);
        assert_eq!(normalized[4].normalized_score, 0.25);
    }

    #[test]
    fn test_zero_max_partition_left_unnormalized() {
        let hits = vec![
            hit("p-1", SearchEntityType::Product, 0.0),
            hit("p-2", SearchEntityType::Product, 0.0),
        ];

        let normalized = normalize_scores(hits);
        assert!(normalized.iter().all(|h| h.normalized_score == 0.0));
    }

    #[test]
    fn test_idempotent() {
        let hits = vec![
            hit("p-1", SearchEntityType::Product, 6.0),
            hit("p-2", SearchEntityType::Product, 3.0),
            hit("m-1", SearchEntityType::Merchant, 2.0),
        ];

        let first = normalize_scores(hits);
        let reapplied = normalize_scores(
            first
                .iter()
                .map(|h| SearchHit {
                    score: h.normalized_score,
                    ..h.hit.clone()
                })
                .collect(),
        );

        for (a, b) in first.iter().zip(reapplied.iter()) {
            assert_eq!(a.hit.id, b.hit.id);
            assert_eq!(a.normalized_score, b.normalized_score);
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(normalize_scores(Vec::new()).is_empty());
    }
}
