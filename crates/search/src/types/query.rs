//! Backend query and hit types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A query against one backend collection.
///
/// The body is opaque to the orchestration layer; only the collection is
/// inspected, for routing and for the allowed-type filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendQuery {
    /// Target collection (lowercased resource type, e.g. `patient`).
    pub collection: String,

    /// Query body in the backend's query language.
    pub body: Value,
}

impl BackendQuery {
    /// Creates a new backend query.
    pub fn new(collection: impl Into<String>, body: Value) -> Self {
        Self {
            collection: collection.into(),
            body,
        }
    }
}

/// Raw hits returned by a backend query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendHits {
    /// Total matches reported by the backend.
    pub total: u64,

    /// Stored documents in backend order.
    pub hits: Vec<Value>,
}

impl BackendHits {
    /// Creates hits with an explicit total.
    pub fn new(total: u64, hits: Vec<Value>) -> Self {
        Self { total, hits }
    }

    /// The result for a collection that does not exist yet.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if there are no hits.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}
