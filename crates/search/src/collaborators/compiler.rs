//! Basic Elasticsearch query compiler.

use serde_json::{Value, json};

use crate::error::{SearchError, SearchResult};
use crate::types::SearchRequest;

use super::QueryCompiler;

/// Compiles plain field parameters into an Elasticsearch `bool` query.
///
/// - `_id` becomes an `ids` query (documents are indexed under their
///   resource id).
/// - Other parameters starting with `_` are control parameters and are
///   ignored here.
/// - `name=value` becomes a `match` on `name`; comma-separated values are
///   OR-ed. `name:exact=value` uses `term`, `name:missing=true|false` uses
///   `exists`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicQueryCompiler;

impl BasicQueryCompiler {
    /// Creates a new compiler.
    pub fn new() -> Self {
        Self
    }

    fn build_clause(&self, name: &str, value: &str) -> SearchResult<Option<Value>> {
        if name == "_id" {
            let ids = split_values(name, value)?;
            return Ok(Some(json!({ "ids": { "values": ids } })));
        }

        if name.starts_with('_') {
            return Ok(None);
        }

        let (field, modifier) = match name.split_once(':') {
            Some((field, modifier)) => (field, Some(modifier)),
            None => (name, None),
        };

        let clause = match modifier {
            None => any_of(
                split_values(name, value)?
                    .into_iter()
                    .map(|v| json!({ "match": { field: v } }))
                    .collect(),
            ),
            Some("exact") => any_of(
                split_values(name, value)?
                    .into_iter()
                    .map(|v| json!({ "term": { field: v } }))
                    .collect(),
            ),
            Some("missing") => {
                let exists = json!({ "exists": { "field": field } });
                match value {
                    "true" => json!({ "bool": { "must_not": [exists] } }),
                    "false" => exists,
                    _ => {
                        return Err(SearchError::QueryCompilation {
                            message: format!("{} expects true or false, got '{}'", name, value),
                        });
                    }
                }
            }
            Some(other) => {
                return Err(SearchError::QueryCompilation {
                    message: format!("unsupported modifier '{}' on {}", other, field),
                });
            }
        };

        Ok(Some(clause))
    }
}

impl QueryCompiler for BasicQueryCompiler {
    fn compile(&self, request: &SearchRequest, filter_rules: &[Value]) -> SearchResult<Value> {
        let mut must_clauses: Vec<Value> = Vec::new();
        for (name, value) in &request.params {
            if let Some(clause) = self.build_clause(name, value)? {
                must_clauses.push(clause);
            }
        }

        let mut bool_query = json!({
            "filter": filter_rules,
        });

        if !must_clauses.is_empty() {
            bool_query["must"] = json!(must_clauses);
        }

        Ok(json!({
            "query": { "bool": bool_query },
            "track_total_hits": true,
        }))
    }
}

fn split_values<'a>(name: &str, value: &'a str) -> SearchResult<Vec<&'a str>> {
    let values: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();
    if values.is_empty() {
        return Err(SearchError::QueryCompilation {
            message: format!("parameter {} has no value", name),
        });
    }
    Ok(values)
}

fn any_of(mut clauses: Vec<Value>) -> Value {
    if clauses.len() == 1 {
        return clauses.remove(0);
    }
    json!({
        "bool": {
            "should": clauses,
            "minimum_should_match": 1
        }
    })
}
