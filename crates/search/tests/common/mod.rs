//! Shared test utilities for search integration tests.
//!
//! [`MockBackend`] is an in-memory [`SearchBackend`] that understands the
//! query shapes produced by the default compiler and deriver (`ids`,
//! `terms` on `*.reference`, `match`, `term`). Collections can be marked
//! missing or failing, and every call is recorded.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};

use helios_search::backends::{SearchBackend, SubQueryResult};
use helios_search::error::BackendError;
use helios_search::types::{BackendHits, BackendQuery};

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Search {
        collection: String,
        from: u32,
        size: u32,
    },
    MultiSearch {
        collections: Vec<String>,
    },
}

#[derive(Debug, Default)]
pub struct MockBackend {
    collections: HashMap<String, Vec<Value>>,
    missing: HashSet<String>,
    failing: HashSet<String>,
    calls: Mutex<Vec<Call>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores resources in the collection named after their type.
    pub fn with_resources(mut self, resources: impl IntoIterator<Item = Value>) -> Self {
        for resource in resources {
            let collection = resource["resourceType"]
                .as_str()
                .unwrap_or_default()
                .to_lowercase();
            self.collections.entry(collection).or_default().push(resource);
        }
        self
    }

    /// Makes the collection report a missing index.
    pub fn with_missing(mut self, collection: &str) -> Self {
        self.missing.insert(collection.to_string());
        self
    }

    /// Makes the collection fail with a server error.
    pub fn with_failing(mut self, collection: &str) -> Self {
        self.failing.insert(collection.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn search_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Search { .. }))
            .count()
    }

    pub fn multi_search_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::MultiSearch { .. }))
            .count()
    }

    fn check_collection(&self, collection: &str) -> Result<(), BackendError> {
        if self.missing.contains(collection) {
            return Err(BackendError::IndexNotFound {
                index: collection.to_string(),
            });
        }
        if self.failing.contains(collection) {
            return Err(BackendError::Response {
                backend_name: "mock".to_string(),
                status: 500,
                message: format!("{} is broken", collection),
            });
        }
        Ok(())
    }

    fn matching(&self, query: &BackendQuery) -> Vec<Value> {
        let bool_query = &query.body["query"]["bool"];
        let clauses: Vec<&Value> = ["filter", "must"]
            .iter()
            .filter_map(|k| bool_query.get(*k).and_then(|v| v.as_array()))
            .flatten()
            .collect();

        self.collections
            .get(&query.collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| clauses.iter().all(|clause| matches_clause(doc, clause)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn matches_clause(doc: &Value, clause: &Value) -> bool {
    if let Some(ids) = clause.get("ids") {
        let id = doc["id"].as_str().unwrap_or_default();
        return ids["values"]
            .as_array()
            .map(|values| values.iter().any(|v| v.as_str() == Some(id)))
            .unwrap_or(false);
    }

    if let Some(terms) = clause.get("terms").and_then(|t| t.as_object()) {
        return terms.iter().all(|(path, wanted)| {
            let wanted: Vec<&str> = wanted
                .as_array()
                .map(|a| a.iter().filter_map(|v| v.as_str()).collect())
                .unwrap_or_default();
            let element = path.trim_end_matches(".reference");
            references_in(&doc[element])
                .iter()
                .any(|r| wanted.contains(&r.as_str()))
        });
    }

    if let Some(fields) = clause
        .get("match")
        .or_else(|| clause.get("term"))
        .and_then(|m| m.as_object())
    {
        return fields.iter().all(|(field, wanted)| &doc[field.as_str()] == wanted);
    }

    true
}

fn references_in(value: &Value) -> Vec<String> {
    match value {
        Value::Object(obj) => obj
            .get("reference")
            .and_then(|r| r.as_str())
            .map(|r| vec![r.to_string()])
            .unwrap_or_default(),
        Value::Array(items) => items.iter().flat_map(references_in).collect(),
        _ => Vec::new(),
    }
}

#[async_trait]
impl SearchBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn search(
        &self,
        query: &BackendQuery,
        from: u32,
        size: u32,
    ) -> Result<BackendHits, BackendError> {
        self.calls.lock().unwrap().push(Call::Search {
            collection: query.collection.clone(),
            from,
            size,
        });
        self.check_collection(&query.collection)?;

        let docs = self.matching(query);
        let total = docs.len() as u64;
        let page = docs
            .into_iter()
            .skip(from as usize)
            .take(size as usize)
            .collect();
        Ok(BackendHits::new(total, page))
    }

    async fn multi_search(
        &self,
        queries: &[BackendQuery],
    ) -> Result<Vec<SubQueryResult>, BackendError> {
        self.calls.lock().unwrap().push(Call::MultiSearch {
            collections: queries.iter().map(|q| q.collection.clone()).collect(),
        });

        Ok(queries
            .iter()
            .map(|query| -> SubQueryResult {
                self.check_collection(&query.collection)?;
                let docs = self.matching(query);
                let total = docs.len() as u64;
                let size = query.body["size"].as_u64().unwrap_or(u64::MAX) as usize;
                Ok(BackendHits::new(total, docs.into_iter().take(size).collect()))
            })
            .collect())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub const BASE_URL: &str = "http://localhost:8080/fhir";

pub fn reference(target: &str) -> Value {
    json!({ "reference": target })
}

pub fn patient(id: &str) -> Value {
    json!({ "resourceType": "Patient", "id": id, "active": true })
}

pub fn patient_with_org(id: &str, org: &str) -> Value {
    json!({
        "resourceType": "Patient",
        "id": id,
        "active": true,
        "organization": reference(&format!("Organization/{}", org))
    })
}

pub fn organization(id: &str, part_of: Option<&str>) -> Value {
    let mut org = json!({ "resourceType": "Organization", "id": id, "name": format!("Org {}", id) });
    if let Some(parent) = part_of {
        org["partOf"] = reference(&format!("Organization/{}", parent));
    }
    org
}

pub fn observation(id: &str, subject: &str) -> Value {
    json!({
        "resourceType": "Observation",
        "id": id,
        "status": "final",
        "subject": reference(subject)
    })
}

/// Collects entry ids in result order.
pub fn ids(entries: &[helios_search::types::SearchEntry]) -> Vec<String> {
    entries.iter().map(|e| e.id().to_string()).collect()
}

/// Asserts that no id appears twice.
pub fn assert_unique_ids(entries: &[helios_search::types::SearchEntry]) {
    let mut seen = HashSet::new();
    for entry in entries {
        assert!(seen.insert(entry.id().to_string()), "duplicate entry {}", entry.id());
    }
}
