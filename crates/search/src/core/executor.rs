//! Single and batched query execution.
//!
//! Both entry points apply the same policy: a missing index is an expected
//! state for a resource type that has never been written, so it yields an
//! empty result. Every other backend error is returned unchanged.

use std::sync::Arc;

use serde_json::Value;

use crate::backends::SearchBackend;
use crate::error::BackendError;
use crate::types::{BackendHits, BackendQuery};

/// Runs backend queries with missing-index tolerance.
#[derive(Clone)]
pub struct QueryExecutor {
    backend: Arc<dyn SearchBackend>,
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl QueryExecutor {
    /// Creates an executor over the given backend.
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &Arc<dyn SearchBackend> {
        &self.backend
    }

    /// Runs one query with an offset window.
    ///
    /// Returns `total = 0` and no hits if the collection has no index.
    pub async fn execute(
        &self,
        query: &BackendQuery,
        from: u32,
        size: u32,
    ) -> Result<BackendHits, BackendError> {
        match self.backend.search(query, from, size).await {
            Ok(hits) => Ok(hits),
            Err(e) if e.is_index_not_found() => {
                tracing::info!(
                    collection = %query.collection,
                    error = %e,
                    "Collection not indexed yet, returning empty result"
                );
                Ok(BackendHits::empty())
            }
            Err(e) => Err(e),
        }
    }

    /// Runs several queries as one multiplexed request.
    ///
    /// Hits are concatenated in query order. A sub-query against a missing
    /// index contributes nothing; any other sub-query failure aborts the
    /// batch. An empty batch never reaches the backend.
    pub async fn execute_batch(&self, queries: &[BackendQuery]) -> Result<Vec<Value>, BackendError> {
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let results = self.backend.multi_search(queries).await?;
        if results.len() != queries.len() {
            return Err(BackendError::InvalidResponse {
                backend_name: self.backend.name().to_string(),
                message: format!(
                    "multi-search returned {} results for {} queries",
                    results.len(),
                    queries.len()
                ),
            });
        }

        let mut hits = Vec::new();
        for (query, result) in queries.iter().zip(results) {
            match result {
                Ok(sub) => hits.extend(sub.hits),
                Err(e) if e.is_index_not_found() => {
                    tracing::info!(
                        collection = %query.collection,
                        error = %e,
                        "Skipping sub-query against collection that is not indexed yet"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Ok(hits)
    }
}
