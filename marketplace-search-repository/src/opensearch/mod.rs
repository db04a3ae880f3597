//! OpenSearch implementation of the search backend.
//!
//! This module provides a concrete implementation of `SearchBackend`
//! using OpenSearch as the backend.

mod backend;
mod index_config;

pub use backend::OpenSearchBackend;
pub use index_config::{
    brand_index_settings, merchant_index_settings, product_index_settings, versioned_index_name,
};
