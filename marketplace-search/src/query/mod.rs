//! Backend query construction.
//!
//! Translates normalized search options into a backend query body: boolean
//! must/filter clauses, a multi-field weighted match, highlighting, sorting,
//! and pagination. Construction never fails: malformed filter input degrades
//! to a well-formed match-all query with a logged warning.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::warn;

use marketplace_search_shared::{
    RangeFilter, SearchEntityType, SearchOptions, SortDirection, TermFilter,
};

use crate::config::SearchConfig;

/// Fields mapped as booleans in the index. Term filters on these match the
/// bare field with a parsed boolean instead of the keyword subfield.
const BOOLEAN_FIELDS: [&str; 4] = ["inStock", "isVerified", "isSponsored", "isActive"];

/// Builds backend query bodies from search options.
pub struct QueryBuilder {
    config: Arc<SearchConfig>,
}

impl QueryBuilder {
    /// Create a new query builder.
    pub fn new(config: Arc<SearchConfig>) -> Self {
        Self { config }
    }

    /// Build the full query body for one entity index.
    ///
    /// `query_text` is the (possibly NLP-processed) text to match; an empty
    /// or whitespace-only value produces a match-all clause. Invalid filter
    /// shapes fall back to a match-all query over the same page window
    /// rather than failing the search.
    pub fn build_query(
        &self,
        query_text: &str,
        options: &SearchOptions,
        entity_type: SearchEntityType,
    ) -> Value {
        match self.try_build(query_text, options, entity_type) {
            Ok(body) => body,
            Err(reason) => {
                warn!(
                    query = %query_text,
                    entity_type = %entity_type,
                    reason = %reason,
                    "Invalid filter shape, falling back to match-all query"
                );
                self.fallback_query(options)
            }
        }
    }

    fn try_build(
        &self,
        query_text: &str,
        options: &SearchOptions,
        entity_type: SearchEntityType,
    ) -> Result<Value, String> {
        let mut filter_clauses = Vec::new();

        for filter in &options.filters {
            filter_clauses.push(Self::term_filter_clause(filter)?);
        }

        for range in &options.range_filters {
            filter_clauses.push(Self::range_filter_clause(range)?);
        }

        if !options.include_sponsored_content {
            filter_clauses.push(json!({"term": {"isSponsored": false}}));
        }

        // Only active/published documents are ever searchable.
        filter_clauses.push(json!({"term": {"isActive": true}}));

        let must_clause = if query_text.trim().is_empty() {
            json!({"match_all": {}})
        } else {
            json!({
                "multi_match": {
                    "query": query_text.trim(),
                    "fields": Self::match_fields(entity_type),
                    "fuzziness": "AUTO"
                }
            })
        };

        let mut body = json!({
            "query": {
                "bool": {
                    "must": [must_clause],
                    "filter": filter_clauses
                }
            },
            "sort": self.sort_clause(query_text, options),
            "from": options.page * options.limit,
            "size": options.limit
        });

        if options.enable_highlighting {
            body["highlight"] = self.highlight_clause(entity_type);
        }

        Ok(body)
    }

    /// A match-all query preserving the page window, used when filter input
    /// cannot be translated.
    fn fallback_query(&self, options: &SearchOptions) -> Value {
        json!({
            "query": {
                "bool": {
                    "must": [{"match_all": {}}],
                    "filter": [{"term": {"isActive": true}}]
                }
            },
            "sort": [{"createdAt": {"order": "desc"}}],
            "from": options.page * options.limit,
            "size": options.limit
        })
    }

    fn term_filter_clause(filter: &TermFilter) -> Result<Value, String> {
        let field = filter.field.trim();
        if field.is_empty() {
            return Err("term filter has an empty field".to_string());
        }
        if filter.values.is_empty() {
            return Err(format!("term filter on '{}' has no values", field));
        }

        if BOOLEAN_FIELDS.contains(&field) {
            let value = filter.values[0]
                .parse::<bool>()
                .map_err(|_| format!("boolean filter on '{}' has a non-boolean value", field))?;
            return Ok(json!({"term": {field: value}}));
        }

        if filter.exact {
            let keyword_field = format!("{}.keyword", field);
            Ok(json!({"terms": {keyword_field: filter.values}}))
        } else if filter.values.len() == 1 {
            Ok(json!({"match": {field: filter.values[0]}}))
        } else {
            let should: Vec<Value> = filter
                .values
                .iter()
                .map(|value| json!({"match": {field: value}}))
                .collect();
            Ok(json!({"bool": {"should": should, "minimum_should_match": 1}}))
        }
    }

    fn range_filter_clause(range: &RangeFilter) -> Result<Value, String> {
        let field = range.field.trim();
        if field.is_empty() {
            return Err("range filter has an empty field".to_string());
        }

        let mut bounds = serde_json::Map::new();
        if let Some(min) = range.min {
            if !min.is_finite() {
                return Err(format!("range filter on '{}' has a non-finite min", field));
            }
            bounds.insert("gte".to_string(), json!(min));
        }
        if let Some(max) = range.max {
            if !max.is_finite() {
                return Err(format!("range filter on '{}' has a non-finite max", field));
            }
            bounds.insert("lte".to_string(), json!(max));
        }

        if bounds.is_empty() {
            return Err(format!("range filter on '{}' has no bounds", field));
        }

        Ok(json!({"range": {field: Value::Object(bounds)}}))
    }

    /// Weighted match fields per entity type. Title/name carry the highest
    /// boost, then descriptive and taxonomy fields.
    fn match_fields(entity_type: SearchEntityType) -> Vec<&'static str> {
        match entity_type {
            SearchEntityType::Product => vec![
                "title^3",
                "description^2",
                "brandName^1.5",
                "categories^1.5",
                "tags",
                "values",
            ],
            SearchEntityType::Merchant => vec![
                "name^3",
                "description",
                "categories^1.5",
                "values^1.5",
                "location",
            ],
            SearchEntityType::Brand => vec![
                "name^3",
                "description",
                "categories^1.5",
                "values^1.5",
                "location",
                "story^0.5",
            ],
            SearchEntityType::All => vec!["title^3", "name^3", "description"],
        }
    }

    /// Explicit sorts win; otherwise relevance when a query is present and
    /// newest-first when there is none.
    fn sort_clause(&self, query_text: &str, options: &SearchOptions) -> Value {
        if !options.sort.is_empty() {
            let sorts: Vec<Value> = options
                .sort
                .iter()
                .map(|spec| {
                    let order = match spec.direction {
                        SortDirection::Asc => "asc",
                        SortDirection::Desc => "desc",
                    };
                    json!({spec.field.as_str(): {"order": order}})
                })
                .collect();
            return Value::Array(sorts);
        }

        if query_text.trim().is_empty() {
            json!([{"createdAt": {"order": "desc"}}])
        } else {
            json!([{"_score": "desc"}])
        }
    }

    fn highlight_clause(&self, entity_type: SearchEntityType) -> Value {
        let mut fields = serde_json::Map::new();
        for field in Self::default_highlight_fields(entity_type) {
            fields.insert(field.to_string(), json!({}));
        }

        json!({
            "pre_tags": [self.config.highlight_pre_tag],
            "post_tags": [self.config.highlight_post_tag],
            "fields": fields,
            "fragment_size": self.config.highlight_fragment_size,
            "number_of_fragments": self.config.highlight_fragment_count,
            "require_field_match": false
        })
    }

    /// Default fields to highlight per entity type.
    fn default_highlight_fields(entity_type: SearchEntityType) -> Vec<&'static str> {
        match entity_type {
            SearchEntityType::Product => vec![
                "title",
                "description",
                "brandName",
                "merchantName",
                "categories",
                "tags",
            ],
            SearchEntityType::Merchant => {
                vec!["name", "description", "categories", "values", "location"]
            }
            SearchEntityType::Brand => vec![
                "name",
                "description",
                "categories",
                "values",
                "location",
                "story",
            ],
            SearchEntityType::All => vec!["title", "name", "description"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> QueryBuilder {
        QueryBuilder::new(Arc::new(SearchConfig::default()))
    }

    fn options() -> SearchOptions {
        SearchOptions::new("shirt", SearchEntityType::Product)
    }

    #[test]
    fn test_empty_query_builds_match_all() {
        let body = builder().build_query("", &options(), SearchEntityType::Product);
        assert!(body["query"]["bool"]["must"][0]["match_all"].is_object());
    }

    #[test]
    fn test_whitespace_query_builds_match_all() {
        let body = builder().build_query("   ", &options(), SearchEntityType::Product);
        assert!(body["query"]["bool"]["must"][0]["match_all"].is_object());
    }

    #[test]
    fn test_text_query_builds_weighted_multi_match() {
        let body = builder().build_query("shirt", &options(), SearchEntityType::Product);
        let multi_match = &body["query"]["bool"]["must"][0]["multi_match"];

        assert_eq!(multi_match["query"], "shirt");
        assert_eq!(multi_match["fuzziness"], "AUTO");
        assert_eq!(multi_match["fields"][0], "title^3");
    }

    #[test]
    fn test_active_filter_always_present() {
        let body = builder().build_query("shirt", &options(), SearchEntityType::Product);
        let filters = body["query"]["bool"]["filter"].as_array().unwrap();
        assert!(filters
            .iter()
            .any(|f| f["term"]["isActive"].as_bool() == Some(true)));
    }

    #[test]
    fn test_exact_term_filter_targets_keyword_field() {
        let opts = options().with_filter(TermFilter::exact(
            "categories",
            vec!["clothing".to_string(), "accessories".to_string()],
        ));
        let body = builder().build_query("shirt", &opts, SearchEntityType::Product);
        let filters = body["query"]["bool"]["filter"].as_array().unwrap();
        let terms = filters
            .iter()
            .find(|f| f["terms"]["categories.keyword"].is_array())
            .unwrap();
        assert_eq!(terms["terms"]["categories.keyword"][0], "clothing");
    }

    #[test]
    fn test_boolean_field_filter() {
        let opts = options().with_filter(TermFilter {
            field: "inStock".to_string(),
            values: vec!["true".to_string()],
            exact: true,
        });
        let body = builder().build_query("shirt", &opts, SearchEntityType::Product);
        let filters = body["query"]["bool"]["filter"].as_array().unwrap();
        assert!(filters
            .iter()
            .any(|f| f["term"]["inStock"].as_bool() == Some(true)));
    }

    #[test]
    fn test_range_filter_clause() {
        let opts = options().with_range_filter(RangeFilter {
            field: "price".to_string(),
            min: Some(10.0),
            max: Some(50.0),
        });
        let body = builder().build_query("shirt", &opts, SearchEntityType::Product);
        let filters = body["query"]["bool"]["filter"].as_array().unwrap();
        let range = filters.iter().find(|f| f["range"]["price"].is_object()).unwrap();
        assert_eq!(range["range"]["price"]["gte"], 10.0);
        assert_eq!(range["range"]["price"]["lte"], 50.0);
    }

    #[test]
    fn test_sponsored_exclusion() {
        let mut opts = options();
        opts.include_sponsored_content = false;
        let body = builder().build_query("shirt", &opts, SearchEntityType::Product);
        let filters = body["query"]["bool"]["filter"].as_array().unwrap();
        assert!(filters
            .iter()
            .any(|f| f["term"]["isSponsored"].as_bool() == Some(false)));
    }

    #[test]
    fn test_pagination_offset() {
        let opts = options().with_page(3).with_limit(25);
        let body = builder().build_query("shirt", &opts, SearchEntityType::Product);
        assert_eq!(body["from"], 75);
        assert_eq!(body["size"], 25);
    }

    #[test]
    fn test_default_sort_relevance_with_query() {
        let body = builder().build_query("shirt", &options(), SearchEntityType::Product);
        assert_eq!(body["sort"][0]["_score"], "desc");
    }

    #[test]
    fn test_default_sort_newest_without_query() {
        let body = builder().build_query("", &options(), SearchEntityType::Product);
        assert_eq!(body["sort"][0]["createdAt"]["order"], "desc");
    }

    #[test]
    fn test_explicit_sort_wins() {
        let opts = options().with_sort("price", SortDirection::Asc);
        let body = builder().build_query("shirt", &opts, SearchEntityType::Product);
        assert_eq!(body["sort"][0]["price"]["order"], "asc");
    }

    #[test]
    fn test_highlight_block() {
        let mut opts = options();
        opts.enable_highlighting = true;
        let body = builder().build_query("shirt", &opts, SearchEntityType::Product);
        let highlight = &body["highlight"];

        assert_eq!(highlight["pre_tags"][0], "<em>");
        assert_eq!(highlight["post_tags"][0], "</em>");
        assert_eq!(highlight["require_field_match"], false);
        assert!(highlight["fields"]["title"].is_object());
        assert!(highlight["fields"]["brandName"].is_object());
    }

    #[test]
    fn test_no_highlight_block_by_default() {
        let body = builder().build_query("shirt", &options(), SearchEntityType::Product);
        assert!(body.get("highlight").is_none());
    }

    #[test]
    fn test_invalid_filter_falls_back_to_match_all() {
        // Empty values list is an invalid filter shape.
        let opts = options().with_filter(TermFilter {
            field: "categories".to_string(),
            values: vec![],
            exact: true,
        });
        let body = builder().build_query("shirt", &opts, SearchEntityType::Product);

        assert!(body["query"]["bool"]["must"][0]["match_all"].is_object());
        // Page window survives the fallback.
        assert_eq!(body["size"], 20);
    }

    #[test]
    fn test_merchant_fields_weight_name_highest() {
        let body = builder().build_query(
            "green goods",
            &SearchOptions::new("green goods", SearchEntityType::Merchant),
            SearchEntityType::Merchant,
        );
        let fields = body["query"]["bool"]["must"][0]["multi_match"]["fields"]
            .as_array()
            .unwrap();
        assert_eq!(fields[0], "name^3");
    }
}
