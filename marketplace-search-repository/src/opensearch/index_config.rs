//! Index settings and mappings for the marketplace collections.
//!
//! Each entity collection gets its own index with text fields carrying a
//! keyword subfield so the same field can serve both analyzed matching and
//! exact-term filtering/aggregation.

use serde_json::{json, Value};

/// Get the versioned name for an index alias.
///
/// # Example
///
/// ```
/// use marketplace_search_repository::opensearch::versioned_index_name;
///
/// assert_eq!(versioned_index_name("products", 2), "products_v2");
/// ```
pub fn versioned_index_name(alias: &str, version: u32) -> String {
    format!("{}_v{}", alias, version)
}

fn text_with_keyword() -> Value {
    json!({
        "type": "text",
        "fields": {
            "keyword": {
                "type": "keyword",
                "ignore_above": 256
            }
        }
    })
}

/// Settings and mappings for the product index.
pub fn product_index_settings() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "properties": {
                "title": text_with_keyword(),
                "description": {"type": "text"},
                "price": {"type": "float"},
                "currency": {"type": "keyword"},
                "images": {"type": "keyword", "index": false},
                "merchantId": {"type": "keyword"},
                "merchantName": text_with_keyword(),
                "brandId": {"type": "keyword"},
                "brandName": text_with_keyword(),
                "categories": text_with_keyword(),
                "tags": text_with_keyword(),
                "values": text_with_keyword(),
                "rating": {"type": "float"},
                "reviewCount": {"type": "integer"},
                "inStock": {"type": "boolean"},
                "isSponsored": {"type": "boolean"},
                "isActive": {"type": "boolean"},
                "createdAt": {"type": "date"},
                "variants": {
                    "properties": {
                        "attributes": {
                            "properties": {
                                "color": text_with_keyword(),
                                "size": text_with_keyword()
                            }
                        }
                    }
                },
                "materials": text_with_keyword()
            }
        }
    })
}

/// Settings and mappings for the merchant index.
pub fn merchant_index_settings() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "properties": {
                "name": text_with_keyword(),
                "description": {"type": "text"},
                "logo": {"type": "keyword", "index": false},
                "heroImage": {"type": "keyword", "index": false},
                "location": text_with_keyword(),
                "categories": text_with_keyword(),
                "values": text_with_keyword(),
                "rating": {"type": "float"},
                "reviewCount": {"type": "integer"},
                "isVerified": {"type": "boolean"},
                "isSponsored": {"type": "boolean"},
                "isActive": {"type": "boolean"},
                "createdAt": {"type": "date"}
            }
        }
    })
}

/// Settings and mappings for the brand index.
pub fn brand_index_settings() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "properties": {
                "name": text_with_keyword(),
                "description": {"type": "text"},
                "story": {"type": "text"},
                "logo": {"type": "keyword", "index": false},
                "heroImage": {"type": "keyword", "index": false},
                "location": text_with_keyword(),
                "categories": text_with_keyword(),
                "values": text_with_keyword(),
                "foundedYear": {"type": "integer"},
                "isVerified": {"type": "boolean"},
                "isSponsored": {"type": "boolean"},
                "isActive": {"type": "boolean"},
                "createdAt": {"type": "date"}
            }
        }
    })
}
