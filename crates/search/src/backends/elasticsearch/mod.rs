//! Elasticsearch backend implementation.
//!
//! Each collection maps to one index named `{prefix}_{collection}` (e.g.
//! `hfs_patient`). Stored documents are the FHIR resources themselves, so a
//! hit's `_source` is the resource JSON.
//!
//! # Example
//!
//! ```ignore
//! use helios_search::backends::elasticsearch::{ElasticsearchBackend, ElasticsearchConfig};
//!
//! let config = ElasticsearchConfig {
//!     nodes: vec!["http://localhost:9200".to_string()],
//!     ..Default::default()
//! };
//! let backend = ElasticsearchBackend::new(config)?;
//! backend.health_check().await?;
//! ```

mod backend;
mod response;

pub use backend::{ElasticsearchAuth, ElasticsearchBackend, ElasticsearchConfig};
pub use response::{parse_error_response, parse_msearch_response, parse_search_response};
