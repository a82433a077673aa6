//! Elasticsearch backend implementation.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use elasticsearch::auth::Credentials;
use elasticsearch::cert::CertificateValidation;
use elasticsearch::http::request::JsonBody;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::{Elasticsearch, MsearchParts, SearchParts};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::backends::{SearchBackend, SubQueryResult};
use crate::error::BackendError;
use crate::types::{BackendHits, BackendQuery};

use super::response::{parse_error_response, parse_msearch_response, parse_search_response};

const BACKEND_NAME: &str = "elasticsearch";

/// Authentication configuration for Elasticsearch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ElasticsearchAuth {
    /// Basic username/password authentication.
    Basic {
        /// The username for basic auth.
        username: String,
        /// The password for basic auth.
        password: String,
    },
    /// Bearer token authentication.
    Bearer {
        /// The bearer token.
        token: String,
    },
}

/// Configuration for the Elasticsearch backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Elasticsearch node URLs (e.g., `["http://localhost:9200"]`).
    /// Currently uses the first node (single-node connection pool).
    pub nodes: Vec<String>,

    /// Index name prefix (default: `"hfs"`).
    /// Indices are named: `{prefix}_{collection}`
    #[serde(default = "default_index_prefix")]
    pub index_prefix: String,

    /// Request timeout in milliseconds (default: 30000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Optional authentication.
    #[serde(default)]
    pub auth: Option<ElasticsearchAuth>,

    /// Whether to disable certificate validation (default: false).
    /// Only use for development/testing.
    #[serde(default)]
    pub disable_certificate_validation: bool,
}

fn default_index_prefix() -> String {
    "hfs".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30000
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            nodes: vec!["http://localhost:9200".to_string()],
            index_prefix: default_index_prefix(),
            request_timeout_ms: default_request_timeout_ms(),
            auth: None,
            disable_certificate_validation: false,
        }
    }
}

/// Elasticsearch implementation of [`SearchBackend`].
pub struct ElasticsearchBackend {
    client: Elasticsearch,
    config: ElasticsearchConfig,
}

impl Debug for ElasticsearchBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchBackend")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ElasticsearchBackend {
    /// Creates a new Elasticsearch backend with the given configuration.
    ///
    /// This only builds the client; no connection is made until the first
    /// request.
    pub fn new(config: ElasticsearchConfig) -> Result<Self, BackendError> {
        let client = Self::build_client(&config)?;
        Ok(Self { client, config })
    }

    fn build_client(config: &ElasticsearchConfig) -> Result<Elasticsearch, BackendError> {
        let url = config
            .nodes
            .first()
            .cloned()
            .unwrap_or_else(|| "http://localhost:9200".to_string());

        let parsed_url: elasticsearch::http::Url =
            url.parse().map_err(|e| BackendError::ConnectionFailed {
                backend_name: BACKEND_NAME.to_string(),
                message: format!("Invalid URL: {}", e),
            })?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);

        let mut builder = TransportBuilder::new(conn_pool)
            .timeout(Duration::from_millis(config.request_timeout_ms));

        if config.disable_certificate_validation {
            builder = builder.cert_validation(CertificateValidation::None);
        }

        if let Some(ref auth) = config.auth {
            builder = match auth {
                ElasticsearchAuth::Basic { username, password } => {
                    builder.auth(Credentials::Basic(username.clone(), password.clone()))
                }
                ElasticsearchAuth::Bearer { token } => {
                    builder.auth(Credentials::Bearer(token.clone()))
                }
            };
        }

        let transport = builder.build().map_err(|e| BackendError::ConnectionFailed {
            backend_name: BACKEND_NAME.to_string(),
            message: format!("Failed to build transport: {}", e),
        })?;

        Ok(Elasticsearch::new(transport))
    }

    /// Returns the backend configuration.
    pub fn config(&self) -> &ElasticsearchConfig {
        &self.config
    }

    /// Returns the index name for a collection.
    pub fn index_name(&self, collection: &str) -> String {
        let collection = collection.to_lowercase();
        if self.config.index_prefix.is_empty() {
            collection
        } else {
            format!("{}_{}", self.config.index_prefix, collection)
        }
    }

    /// Checks that the cluster is reachable and not red.
    pub async fn health_check(&self) -> Result<(), BackendError> {
        let response = self
            .client
            .cluster()
            .health(elasticsearch::cluster::ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| BackendError::Unavailable {
                backend_name: BACKEND_NAME.to_string(),
                message: format!("Health check failed: {}", e),
            })?;

        let status = response.status_code();
        if !status.is_success() {
            return Err(BackendError::Unavailable {
                backend_name: BACKEND_NAME.to_string(),
                message: format!("Cluster health returned status {}", status),
            });
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| BackendError::InvalidResponse {
                backend_name: BACKEND_NAME.to_string(),
                message: format!("Failed to parse health response: {}", e),
            })?;

        let cluster_status = body
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or("unknown");

        if cluster_status == "red" {
            return Err(BackendError::Unavailable {
                backend_name: BACKEND_NAME.to_string(),
                message: format!("Cluster status is red: {:?}", body),
            });
        }

        Ok(())
    }
}

fn request_error(e: elasticsearch::Error) -> BackendError {
    BackendError::Request {
        backend_name: BACKEND_NAME.to_string(),
        message: e.to_string(),
    }
}

#[async_trait]
impl SearchBackend for ElasticsearchBackend {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn search(
        &self,
        query: &BackendQuery,
        from: u32,
        size: u32,
    ) -> Result<BackendHits, BackendError> {
        let index = self.index_name(&query.collection);

        let response = self
            .client
            .search(SearchParts::Index(&[&index]))
            .from(i64::from(from))
            .size(i64::from(size))
            .body(query.body.clone())
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(parse_error_response(status.as_u16(), &body, &index));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse {
                backend_name: BACKEND_NAME.to_string(),
                message: format!("Failed to parse search response: {}", e),
            })?;

        parse_search_response(&body)
    }

    async fn multi_search(
        &self,
        queries: &[BackendQuery],
    ) -> Result<Vec<SubQueryResult>, BackendError> {
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let indices: Vec<String> = queries
            .iter()
            .map(|q| self.index_name(&q.collection))
            .collect();

        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(queries.len() * 2);
        for (query, index) in queries.iter().zip(&indices) {
            body.push(JsonBody::new(json!({ "index": index })));
            body.push(JsonBody::new(query.body.clone()));
        }

        let response = self
            .client
            .msearch(MsearchParts::None)
            .body(body)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Response {
                backend_name: BACKEND_NAME.to_string(),
                status: status.as_u16(),
                message: body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse {
                backend_name: BACKEND_NAME.to_string(),
                message: format!("Failed to parse multi-search response: {}", e),
            })?;

        parse_msearch_response(&body, &indices)
    }
}
