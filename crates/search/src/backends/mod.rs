//! Search backend abstraction and implementations.
//!
//! The orchestrator only needs two primitives from a backend: run one query
//! against one collection, and run several queries as a single multiplexed
//! request. Backends must report a missing collection as
//! [`BackendError::IndexNotFound`] so the executors can treat it as empty.
//!
//! Available backend features:
//! - `elasticsearch` (default) - Elasticsearch via the official client

use async_trait::async_trait;

use crate::error::BackendError;
use crate::types::{BackendHits, BackendQuery};

#[cfg(feature = "elasticsearch")]
pub mod elasticsearch;

/// Outcome of one sub-query in a multi-search request.
pub type SubQueryResult = Result<BackendHits, BackendError>;

/// A document-indexed search backend.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Returns a short name for logging.
    fn name(&self) -> &'static str;

    /// Runs one query against one collection with an offset window.
    ///
    /// # Errors
    ///
    /// * `BackendError::IndexNotFound` - If the collection does not exist
    /// * any other `BackendError` - For transport or query failures
    async fn search(
        &self,
        query: &BackendQuery,
        from: u32,
        size: u32,
    ) -> Result<BackendHits, BackendError>;

    /// Runs several queries in one request.
    ///
    /// The outer error is a failure of the request as a whole. Otherwise the
    /// returned vector has one result per input query, in input order.
    async fn multi_search(
        &self,
        queries: &[BackendQuery],
    ) -> Result<Vec<SubQueryResult>, BackendError>;
}
