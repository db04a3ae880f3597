//! OpenSearch backend implementation.
//!
//! This module provides the concrete implementation of `SearchBackend`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use opensearch::http::request::JsonBody;
use opensearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use opensearch::indices::{IndicesCreateParts, IndicesRefreshParts};
use opensearch::{BulkParts, OpenSearch, SearchParts};
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::errors::SearchBackendError;
use crate::interfaces::SearchBackend;
use crate::types::{BackendHit, BackendSearchResults};

/// OpenSearch-backed implementation of [`SearchBackend`].
///
/// # Example
///
/// ```ignore
/// use marketplace_search_repository::OpenSearchBackend;
/// use serde_json::json;
///
/// let backend = OpenSearchBackend::new("http://localhost:9200")?;
/// let results = backend
///     .search("products", &json!({"query": {"match_all": {}}}))
///     .await?;
/// ```
pub struct OpenSearchBackend {
    client: OpenSearch,
}

impl OpenSearchBackend {
    /// Create a new backend connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchBackend)` - A new backend instance
    /// * `Err(SearchBackendError)` - If connection setup fails
    pub fn new(url: &str) -> Result<Self, SearchBackendError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchBackendError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchBackendError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, "Created OpenSearch backend");

        Ok(Self { client })
    }

    /// Parse a raw search response body into [`BackendSearchResults`].
    ///
    /// Tolerates missing highlight payloads and treats an absent `_score`
    /// (e.g. under a non-score sort) as zero.
    fn parse_search_response(body: Value) -> Result<BackendSearchResults, SearchBackendError> {
        let took_ms = body["took"].as_u64().unwrap_or(0);

        let hits_obj = body
            .get("hits")
            .ok_or_else(|| SearchBackendError::parse("response has no hits object"))?;

        let total = hits_obj["total"]["value"]
            .as_u64()
            .or_else(|| hits_obj["total"].as_u64())
            .unwrap_or(0);

        let mut hits = Vec::new();
        if let Some(raw_hits) = hits_obj["hits"].as_array() {
            for raw in raw_hits {
                let id = raw["_id"]
                    .as_str()
                    .ok_or_else(|| SearchBackendError::parse("hit has no _id"))?
                    .to_string();
                let index = raw["_index"].as_str().unwrap_or_default().to_string();
                let score = raw["_score"].as_f64().unwrap_or(0.0);
                let source = raw.get("_source").cloned().unwrap_or(Value::Null);
                let highlight = raw.get("highlight").cloned().filter(|h| !h.is_null());

                hits.push(BackendHit {
                    id,
                    index,
                    score,
                    source,
                    highlight,
                });
            }
        }

        let aggregations = body.get("aggregations").cloned().unwrap_or(Value::Null);

        Ok(BackendSearchResults {
            hits,
            total,
            aggregations,
            took_ms,
        })
    }
}

#[async_trait]
impl SearchBackend for OpenSearchBackend {
    async fn search(
        &self,
        index: &str,
        body: &Value,
    ) -> Result<BackendSearchResults, SearchBackendError> {
        let response = self
            .client
            .search(SearchParts::Index(&[index]))
            .body(body.clone())
            .send()
            .await
            .map_err(|e| SearchBackendError::query(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, index = %index, "Search request failed");
            return Err(SearchBackendError::query(format!(
                "Search failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchBackendError::parse(e.to_string()))?;

        let results = Self::parse_search_response(response_body)?;

        debug!(
            index = %index,
            hit_count = results.hits.len(),
            total = results.total,
            took_ms = results.took_ms,
            "Search completed"
        );

        Ok(results)
    }

    async fn bulk_index(
        &self,
        index: &str,
        documents: &[(String, Value)],
    ) -> Result<(), SearchBackendError> {
        if documents.is_empty() {
            return Ok(());
        }

        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(documents.len() * 2);
        for (id, source) in documents {
            body.push(json!({"index": {"_id": id}}).into());
            body.push(source.clone().into());
        }

        let response = self
            .client
            .bulk(BulkParts::Index(index))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchBackendError::bulk_index(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Bulk index request failed");
            return Err(SearchBackendError::bulk_index(format!(
                "Bulk index failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchBackendError::parse(e.to_string()))?;

        if response_body["errors"].as_bool().unwrap_or(false) {
            return Err(SearchBackendError::bulk_index(
                "Bulk response reported item-level errors".to_string(),
            ));
        }

        debug!(index = %index, count = documents.len(), "Bulk indexed documents");
        Ok(())
    }

    async fn create_index(
        &self,
        index: &str,
        settings: &Value,
    ) -> Result<(), SearchBackendError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(settings.clone())
            .send()
            .await
            .map_err(|e| SearchBackendError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Create index request failed");
            return Err(SearchBackendError::index_creation(format!(
                "Create index failed with status {}: {}",
                status, error_body
            )));
        }

        info!(index = %index, "Created index");
        Ok(())
    }

    async fn update_aliases(
        &self,
        alias: &str,
        old_index: Option<&str>,
        new_index: &str,
    ) -> Result<(), SearchBackendError> {
        let mut actions = Vec::new();
        if let Some(old) = old_index {
            actions.push(json!({"remove": {"index": old, "alias": alias}}));
        }
        actions.push(json!({"add": {"index": new_index, "alias": alias}}));

        let response = self
            .client
            .indices()
            .update_aliases()
            .body(json!({"actions": actions}))
            .send()
            .await
            .map_err(|e| SearchBackendError::alias(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Update aliases request failed");
            return Err(SearchBackendError::alias(format!(
                "Update aliases failed with status {}: {}",
                status, error_body
            )));
        }

        info!(alias = %alias, new_index = %new_index, "Updated alias");
        Ok(())
    }

    async fn refresh_index(&self, index: &str) -> Result<(), SearchBackendError> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchBackendError::refresh(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(SearchBackendError::refresh(format!(
                "Refresh failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(index = %index, "Refreshed index");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_response() -> Value {
        json!({
            "took": 12,
            "hits": {
                "total": {"value": 37, "relation": "eq"},
                "hits": [
                    {
                        "_id": "p-1",
                        "_index": "products",
                        "_score": 8.5,
                        "_source": {"title": "Organic Shirt"},
                        "highlight": {"title": ["<em>Organic</em> Shirt"]}
                    },
                    {
                        "_id": "p-2",
                        "_index": "products",
                        "_score": null,
                        "_source": {"title": "Plain Shirt"}
                    }
                ]
            },
            "aggregations": {
                "categories": {"buckets": [{"key": "clothing", "doc_count": 12}]}
            }
        })
    }

    #[test]
    fn test_parse_search_response() {
        let results = OpenSearchBackend::parse_search_response(sample_response()).unwrap();

        assert_eq!(results.total, 37);
        assert_eq!(results.took_ms, 12);
        assert_eq!(results.hits.len(), 2);

        let first = &results.hits[0];
        assert_eq!(first.id, "p-1");
        assert_eq!(first.index, "products");
        assert_eq!(first.score, 8.5);
        assert!(first.highlight.is_some());

        // Missing _score falls back to zero, missing highlight to None.
        let second = &results.hits[1];
        assert_eq!(second.score, 0.0);
        assert!(second.highlight.is_none());

        assert!(results.aggregations["categories"]["buckets"].is_array());
    }

    #[test]
    fn test_parse_search_response_without_hits_is_error() {
        let result = OpenSearchBackend::parse_search_response(json!({"took": 1}));
        assert!(matches!(result, Err(SearchBackendError::ParseError(_))));
    }

    #[test]
    fn test_parse_search_response_without_aggregations() {
        let results = OpenSearchBackend::parse_search_response(json!({
            "took": 1,
            "hits": {"total": {"value": 0}, "hits": []}
        }))
        .unwrap();

        assert_eq!(results.total, 0);
        assert!(results.hits.is_empty());
        assert!(results.aggregations.is_null());
    }
}
