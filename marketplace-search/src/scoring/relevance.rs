//! Entity relevance scoring and boosting.
//!
//! Blends text-match contributions per field with entity-specific weights,
//! and applies per-entity-type boost multipliers when searching across all
//! entity types simultaneously.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use marketplace_search_shared::{
    EntityBoosting, EntityDocument, SearchEntityType, SearchHit,
};

use crate::config::SearchConfig;
use crate::personalization::PersonalizedBoosts;

/// Score contribution per matched query term, by entity type and field.
/// Tuned values carried over from production traffic.
const PRODUCT_TITLE_WEIGHT: f64 = 2.0;
const PRODUCT_DESCRIPTION_WEIGHT: f64 = 1.0;
const PRODUCT_CATEGORY_WEIGHT: f64 = 1.5;
const PRODUCT_TAG_WEIGHT: f64 = 1.0;
const PRODUCT_BRAND_WEIGHT: f64 = 1.0;

const NAME_WEIGHT: f64 = 3.0;
const DESCRIPTION_WEIGHT: f64 = 1.0;
const CATEGORY_WEIGHT: f64 = 1.5;
const VALUE_WEIGHT: f64 = 1.5;
const LOCATION_WEIGHT: f64 = 1.0;
const STORY_WEIGHT: f64 = 0.5;

/// Neutral score for hits that cannot be scored (no query or no document).
const NEUTRAL_RELEVANCE: f64 = 0.5;

/// Scores and boosts entity relevance in multi-entity searches.
pub struct EntityRelevanceScorer {
    config: Arc<SearchConfig>,
}

impl EntityRelevanceScorer {
    /// Create a new scorer.
    pub fn new(config: Arc<SearchConfig>) -> Self {
        Self { config }
    }

    /// Compute a field-match relevance score in [0, 1] for one document.
    ///
    /// The query is lowercased and split on whitespace; each term that
    /// appears in a field contributes that field's weight. The sum is
    /// divided by the configured ceiling and clamped. A missing document or
    /// empty query yields the neutral default of 0.5.
    pub fn calculate_entity_relevance(
        &self,
        query: &str,
        document: Option<&EntityDocument>,
    ) -> f64 {
        let document = match document {
            Some(doc) => doc,
            None => return NEUTRAL_RELEVANCE,
        };

        if query.trim().is_empty() {
            return NEUTRAL_RELEVANCE;
        }

        let lowered = query.to_lowercase();
        let terms: Vec<&str> = lowered.split_whitespace().collect();

        let score = match document {
            EntityDocument::Product(product) => {
                let mut score = 0.0;
                score += Self::text_score(&product.title, &terms, PRODUCT_TITLE_WEIGHT);
                score +=
                    Self::text_score(&product.description, &terms, PRODUCT_DESCRIPTION_WEIGHT);
                score += Self::list_score(&product.categories, &terms, PRODUCT_CATEGORY_WEIGHT);
                score += Self::list_score(&product.tags, &terms, PRODUCT_TAG_WEIGHT);
                score += Self::text_score(&product.brand_name, &terms, PRODUCT_BRAND_WEIGHT);
                score
            }
            EntityDocument::Merchant(merchant) => {
                let mut score = 0.0;
                score += Self::text_score(&merchant.name, &terms, NAME_WEIGHT);
                score += Self::text_score(&merchant.description, &terms, DESCRIPTION_WEIGHT);
                score += Self::list_score(&merchant.categories, &terms, CATEGORY_WEIGHT);
                score += Self::list_score(&merchant.values, &terms, VALUE_WEIGHT);
                score += Self::text_score(&merchant.location, &terms, LOCATION_WEIGHT);
                score
            }
            EntityDocument::Brand(brand) => {
                let mut score = 0.0;
                score += Self::text_score(&brand.name, &terms, NAME_WEIGHT);
                score += Self::text_score(&brand.description, &terms, DESCRIPTION_WEIGHT);
                score += Self::list_score(&brand.categories, &terms, CATEGORY_WEIGHT);
                score += Self::list_score(&brand.values, &terms, VALUE_WEIGHT);
                score += Self::text_score(&brand.location, &terms, LOCATION_WEIGHT);
                score += Self::text_score(&brand.story, &terms, STORY_WEIGHT);
                score
            }
        };

        (score / self.config.relevance_ceiling).clamp(0.0, 1.0)
    }

    /// Weight contribution of terms found in one text field.
    fn text_score(field: &str, terms: &[&str], weight: f64) -> f64 {
        let lowered = field.to_lowercase();
        terms
            .iter()
            .filter(|term| lowered.contains(**term))
            .count() as f64
            * weight
    }

    /// Weight contribution of terms found in a list field, counting every
    /// (element, term) match.
    fn list_score(items: &[String], terms: &[&str], weight: f64) -> f64 {
        items
            .iter()
            .map(|item| Self::text_score(item, terms, weight))
            .sum()
    }

    /// Apply per-entity-type boost multipliers to a federated hit list.
    ///
    /// Only applies when searching across all entity types: for a single
    /// entity type the hits come back unchanged. Each hit's raw score is
    /// multiplied by its entity's weight and the list is re-sorted
    /// descending by the adjusted score.
    pub fn apply_entity_boosting(
        &self,
        mut hits: Vec<SearchHit>,
        entity_type: SearchEntityType,
        boosting: Option<&EntityBoosting>,
    ) -> Vec<SearchHit> {
        if !entity_type.is_federated() {
            return hits;
        }

        let (product_boost, merchant_boost, brand_boost) = self.resolve_boosts(boosting);

        for hit in &mut hits {
            let factor = match hit.entity_type {
                SearchEntityType::Product => product_boost,
                SearchEntityType::Merchant => merchant_boost,
                SearchEntityType::Brand => brand_boost,
                SearchEntityType::All => 1.0,
            };
            hit.score *= factor;
        }

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));

        debug!(
            product_boost = product_boost,
            merchant_boost = merchant_boost,
            brand_boost = brand_boost,
            hit_count = hits.len(),
            "Applied entity boosting"
        );

        hits
    }

    /// Multiply user-specific boosts into hit scores.
    ///
    /// Category and brand boosts come from browsing history and are scaled
    /// by the history factor; value boosts come from explicit preferences,
    /// are scaled by the preferences factor, and only apply when the caller
    /// opted into value alignment. A weight of 1.0 is neutral; scaling
    /// stretches the distance from neutral so the configured factors control
    /// how strongly personalization bends the ranking.
    pub fn apply_personalized_boosting(
        &self,
        mut hits: Vec<SearchHit>,
        boosts: &PersonalizedBoosts,
        boost_by_values: bool,
    ) -> Vec<SearchHit> {
        let history_factor = self.config.user_history_boost_factor;
        let preferences_factor = self.config.user_preferences_boost_factor;

        for hit in &mut hits {
            let mut factor = 1.0;

            if let Some(weight) =
                Self::max_matching_weight(hit.document.categories(), &boosts.category_boosts)
            {
                factor *= Self::scale_weight(weight, history_factor);
            }

            if let Some(brand) = hit.document.brand_name() {
                if let Some(weight) = boosts.brand_boosts.get(&brand.to_lowercase()) {
                    factor *= Self::scale_weight(*weight, history_factor);
                }
            }

            if boost_by_values {
                if let Some(weight) =
                    Self::max_matching_weight(hit.document.values(), &boosts.value_boosts)
                {
                    factor *= Self::scale_weight(weight, preferences_factor);
                }
            }

            hit.score *= factor;
        }

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits
    }

    fn max_matching_weight(
        items: &[String],
        boosts: &std::collections::HashMap<String, f64>,
    ) -> Option<f64> {
        items
            .iter()
            .filter_map(|item| boosts.get(&item.to_lowercase()))
            .copied()
            .fold(None, |acc, w| Some(acc.map_or(w, |a: f64| a.max(w))))
    }

    fn scale_weight(weight: f64, factor: f64) -> f64 {
        1.0 + (weight - 1.0) * factor
    }

    /// Wrap a base query in a function-score construct whose per-entity
    /// weight functions multiply into the text relevance score.
    ///
    /// Used when boosting is wanted at query-build time rather than
    /// post-hoc. `score_mode` and `boost_mode` are both `multiply`, so the
    /// boost is a true multiplier on text relevance, never an additive
    /// bonus. No-op for single-entity searches.
    pub fn enhance_query_with_entity_boosting(
        &self,
        base_query: Value,
        entity_type: SearchEntityType,
        boosting: Option<&EntityBoosting>,
    ) -> Value {
        if !entity_type.is_federated() {
            return base_query;
        }

        let (product_boost, merchant_boost, brand_boost) = self.resolve_boosts(boosting);

        json!({
            "function_score": {
                "query": base_query,
                "functions": [
                    {
                        "filter": {"term": {"_index": self.config.product_index}},
                        "weight": product_boost
                    },
                    {
                        "filter": {"term": {"_index": self.config.merchant_index}},
                        "weight": merchant_boost
                    },
                    {
                        "filter": {"term": {"_index": self.config.brand_index}},
                        "weight": brand_boost
                    }
                ],
                "score_mode": "multiply",
                "boost_mode": "multiply"
            }
        })
    }

    fn resolve_boosts(&self, boosting: Option<&EntityBoosting>) -> (f64, f64, f64) {
        let product = boosting
            .and_then(|b| b.product_boost)
            .unwrap_or(self.config.default_product_boost);
        let merchant = boosting
            .and_then(|b| b.merchant_boost)
            .unwrap_or(self.config.default_merchant_boost);
        let brand = boosting
            .and_then(|b| b.brand_boost)
            .unwrap_or(self.config.default_brand_boost);
        (product, merchant, brand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketplace_search_shared::{
        BrandDocument, MerchantDocument, ProductDocument,
    };

    fn scorer() -> EntityRelevanceScorer {
        EntityRelevanceScorer::new(Arc::new(SearchConfig::default()))
    }

    fn product_doc() -> EntityDocument {
        EntityDocument::Product(ProductDocument {
            title: "Organic Cotton Shirt".to_string(),
            description: "A comfortable shirt made of organic cotton".to_string(),
            categories: vec!["clothing".to_string(), "shirts".to_string()],
            tags: vec!["organic".to_string()],
            brand_name: "EcoWear".to_string(),
            ..Default::default()
        })
    }

    fn hit(id: &str, entity_type: SearchEntityType, score: f64) -> SearchHit {
        let document = match entity_type {
            SearchEntityType::Merchant => EntityDocument::Merchant(MerchantDocument::default()),
            SearchEntityType::Brand => EntityDocument::Brand(BrandDocument::default()),
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
    fn test_missing_document_yields_neutral_score() {
        assert_eq!(scorer().calculate_entity_relevance("shirt", None), 0.5);
    }

    #[test]
    fn test_empty_query_yields_neutral_score() {
        let doc = product_doc();
        assert_eq!(scorer().calculate_entity_relevance("", Some(&doc)), 0.5);
        assert_eq!(scorer().calculate_entity_relevance("  ", Some(&doc)), 0.5);
    }

    #[test]
    fn test_product_relevance_weights() {
        let doc = product_doc();
        // "shirt" matches title (2.0), description (1.0), and the "shirts"
        // category (1.5): 4.5 / 10 = 0.45.
        let score = scorer().calculate_entity_relevance("shirt", Some(&doc));
        assert!((score - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_merchant_relevance_weights() {
        let doc = EntityDocument::Merchant(MerchantDocument {
            name: "Green Goods".to_string(),
            description: "Sustainable green products".to_string(),
            values: vec!["green living".to_string()],
            ..Default::default()
        });
        // "green" matches name (3.0), description (1.0), and a value (1.5):
        // 5.5 / 10 = 0.55.
        let score = scorer().calculate_entity_relevance("green", Some(&doc));
        assert!((score - 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_brand_story_weight() {
        let doc = EntityDocument::Brand(BrandDocument {
            name: "Heritage".to_string(),
            story: "A heritage of craftsmanship".to_string(),
            ..Default::default()
        });
        // "heritage" matches name (3.0) and story (0.5): 3.5 / 10 = 0.35.
        let score = scorer().calculate_entity_relevance("heritage", Some(&doc));
        assert!((score - 0.35).abs() < 1e-9);
    }

    #[test]
    fn test_relevance_clamped_to_one() {
        let doc = EntityDocument::Product(ProductDocument {
            title: "shirt shirt shirt".to_string(),
            description: "shirt".to_string(),
            categories: vec!["shirt".to_string(); 10],
            tags: vec!["shirt".to_string(); 10],
            brand_name: "shirt".to_string(),
            ..Default::default()
        });
        let score = scorer().calculate_entity_relevance("shirt shirts tee", Some(&doc));
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_boosting_is_noop_for_single_entity_type() {
        let hits = vec![
            hit("p-1", SearchEntityType::Product, 2.0),
            hit("p-2", SearchEntityType::Product, 1.0),
        ];
        let boosted =
            scorer().apply_entity_boosting(hits.clone(), SearchEntityType::Product, None);
        assert_eq!(boosted, hits);
    }

    #[test]
    fn test_default_boosting_multiplies_and_resorts() {
        let hits = vec![
            hit("m-1", SearchEntityType::Merchant, 3.0),
            hit("p-1", SearchEntityType::Product, 2.5),
            hit("b-1", SearchEntityType::Brand, 3.0),
        ];
        let boosted = scorer().apply_entity_boosting(hits, SearchEntityType::All, None);

        // merchant 3.0 * 0.8 = 2.4, product 2.5 * 1.0 = 2.5, brand 2.4
        assert_eq!(boosted[0].id, "p-1");
        assert_eq!(boosted[0].score, 2.5);
        assert_eq!(boosted[1].score, 2.4);
        assert_eq!(boosted[2].score, 2.4);
    }

    #[test]
    fn test_boosting_overrides() {
        let boosting = EntityBoosting {
            product_boost: Some(0.5),
            merchant_boost: Some(2.0),
            brand_boost: None,
        };
        let hits = vec![
            hit("p-1", SearchEntityType::Product, 4.0),
            hit("m-1", SearchEntityType::Merchant, 3.0),
        ];
        let boosted =
            scorer().apply_entity_boosting(hits, SearchEntityType::All, Some(&boosting));

        // merchant 3.0 * 2.0 = 6.0 beats product 4.0 * 0.5 = 2.0
        assert_eq!(boosted[0].id, "m-1");
        assert_eq!(boosted[0].score, 6.0);
        assert_eq!(boosted[1].score, 2.0);
    }

    #[test]
    fn test_function_score_enhancement_shape() {
        let base = json!({"match": {"title": "shirt"}});
        let enhanced = scorer().enhance_query_with_entity_boosting(
            base.clone(),
            SearchEntityType::All,
            None,
        );

        assert_eq!(enhanced["function_score"]["query"], base);
        assert_eq!(enhanced["function_score"]["score_mode"], "multiply");
        assert_eq!(enhanced["function_score"]["boost_mode"], "multiply");

        let functions = enhanced["function_score"]["functions"].as_array().unwrap();
        assert_eq!(functions.len(), 3);
        assert_eq!(functions[0]["filter"]["term"]["_index"], "products");
        assert_eq!(functions[0]["weight"], 1.0);
        assert_eq!(functions[1]["weight"], 0.8);
    }

    #[test]
    fn test_enhancement_noop_for_single_entity_type() {
        let base = json!({"match": {"title": "shirt"}});
        let enhanced = scorer().enhance_query_with_entity_boosting(
            base.clone(),
            SearchEntityType::Product,
            None,
        );
        assert_eq!(enhanced, base);
    }

    #[test]
    fn test_personalized_boosting_prefers_matching_categories() {
        let mut boosts = PersonalizedBoosts::default();
        boosts.category_boosts.insert("clothing".to_string(), 1.5);

        let clothing = SearchHit {
            document: EntityDocument::Product(ProductDocument {
                categories: vec!["clothing".to_string()],
                ..Default::default()
            }),
            ..hit("p-1", SearchEntityType::Product, 1.0)
        };
        let other = hit("p-2", SearchEntityType::Product, 1.0);

        let boosted =
            scorer().apply_personalized_boosting(vec![other, clothing], &boosts, false);

        assert_eq!(boosted[0].id, "p-1");
        // 1.0 * (1.0 + 0.5 * 1.2) = 1.6
        assert!((boosted[0].score - 1.6).abs() < 1e-9);
        assert_eq!(boosted[1].score, 1.0);
    }

    #[test]
    fn test_value_boosts_require_opt_in() {
        let mut boosts = PersonalizedBoosts::default();
        boosts.value_boosts.insert("sustainable".to_string(), 2.0);

        let aligned = SearchHit {
            document: EntityDocument::Product(ProductDocument {
                values: vec!["sustainable".to_string()],
                ..Default::default()
            }),
            ..hit("p-1", SearchEntityType::Product, 1.0)
        };

        let untouched =
            scorer().apply_personalized_boosting(vec![aligned.clone()], &boosts, false);
        assert_eq!(untouched[0].score, 1.0);

        let boosted = scorer().apply_personalized_boosting(vec![aligned], &boosts, true);
        // 1.0 * (1.0 + 1.0 * 1.5) = 2.5
        assert!((boosted[0].score - 2.5).abs() < 1e-9);
    }
}
