//! Reference-following inclusion deriver.

use serde_json::{Map, Value, json};

use crate::error::{SearchError, SearchResult};
use crate::types::{
    BackendQuery, PARAM_INCLUDE, PARAM_INCLUDE_ITERATE, PARAM_INCLUDE_RECURSE, PARAM_REVINCLUDE,
    PARAM_REVINCLUDE_ITERATE, PARAM_REVINCLUDE_RECURSE, SearchRequest, collection_for,
};

use super::directive::{IncludeDirective, parse_reference};
use super::{InclusionContext, InclusionDeriver};

/// Default `size` of each derived query.
pub const DEFAULT_MAX_INCLUDE_RESULTS: u32 = 1000;

/// Derives inclusion queries by following FHIR `reference` strings.
///
/// Forward inclusion reads the element named by the directive's search
/// parameter from each source resource and fetches the referenced ids,
/// one query per target collection. Reverse inclusion queries the
/// directive's source collection for resources whose element references
/// any of the context resources.
#[derive(Debug, Clone)]
pub struct ReferenceInclusionDeriver {
    max_results: u32,
}

impl Default for ReferenceInclusionDeriver {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_INCLUDE_RESULTS,
        }
    }
}

impl ReferenceInclusionDeriver {
    /// Creates a deriver with the default result bound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `size` of each derived query.
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    fn query_body(&self, clause: Value, filter_rules: &[Value]) -> Value {
        let mut filter = Vec::with_capacity(filter_rules.len() + 1);
        filter.push(clause);
        filter.extend(filter_rules.iter().cloned());
        json!({
            "query": { "bool": { "filter": filter } },
            "size": self.max_results,
        })
    }
}

fn directives(request: &SearchRequest, names: &[&str]) -> SearchResult<Vec<IncludeDirective>> {
    names
        .iter()
        .flat_map(|name| request.param_values(name))
        .map(IncludeDirective::parse)
        .collect()
}

fn resource_type(resource: &Value) -> &str {
    resource
        .get("resourceType")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
}

fn resource_id(resource: &Value) -> &str {
    resource
        .get("id")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
}

/// Collects `(type, id)` pairs from reference objects within a value.
fn collect_references(value: &Value, refs: &mut Vec<(String, String)>) {
    match value {
        Value::Object(obj) => {
            if let Some(reference) = obj.get("reference").and_then(|r| r.as_str()) {
                if let Some(parsed) = parse_reference(reference) {
                    refs.push(parsed);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_references(item, refs);
            }
        }
        _ => {}
    }
}

fn references_for(resource: &Value, directive: &IncludeDirective) -> Vec<(String, String)> {
    let mut refs = Vec::new();
    let Some(obj) = resource.as_object() else {
        return refs;
    };

    if directive.is_wildcard() {
        for value in obj.values() {
            collect_references(value, &mut refs);
        }
    } else {
        // Codes like `partof` don't always match the element casing (`partOf`)
        let element = directive.element_name();
        let value = obj.get(&element).or_else(|| {
            obj.iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(&element))
                .map(|(_, value)| value)
        });
        if let Some(value) = value {
            collect_references(value, &mut refs);
        }
    }
    refs
}

impl InclusionDeriver for ReferenceInclusionDeriver {
    fn include_queries(&self, ctx: &InclusionContext<'_>) -> SearchResult<Vec<BackendQuery>> {
        let names: &[&str] = if ctx.iterate {
            &[PARAM_INCLUDE_ITERATE, PARAM_INCLUDE_RECURSE]
        } else {
            &[PARAM_INCLUDE]
        };

        // Target type -> ids, in first-seen order
        let mut targets: Vec<(String, Vec<String>)> = Vec::new();
        for directive in directives(ctx.request, names)? {
            for resource in ctx.resources {
                if !directive.applies_to(resource_type(resource)) {
                    continue;
                }
                for (ref_type, ref_id) in references_for(resource, &directive) {
                    if !directive.accepts_target(&ref_type) {
                        continue;
                    }
                    match targets.iter_mut().find(|(t, _)| *t == ref_type) {
                        Some((_, ids)) => {
                            if !ids.contains(&ref_id) {
                                ids.push(ref_id);
                            }
                        }
                        None => targets.push((ref_type, vec![ref_id])),
                    }
                }
            }
        }

        Ok(targets
            .into_iter()
            .map(|(target_type, ids)| {
                let clause = json!({ "ids": { "values": ids } });
                BackendQuery::new(
                    collection_for(&target_type),
                    self.query_body(clause, ctx.filter_rules),
                )
            })
            .collect())
    }

    fn revinclude_queries(&self, ctx: &InclusionContext<'_>) -> SearchResult<Vec<BackendQuery>> {
        let names: &[&str] = if ctx.iterate {
            &[PARAM_REVINCLUDE_ITERATE, PARAM_REVINCLUDE_RECURSE]
        } else {
            &[PARAM_REVINCLUDE]
        };

        let mut queries = Vec::new();
        for directive in directives(ctx.request, names)? {
            if directive.is_wildcard() || directive.source_type == "*" {
                return Err(SearchError::InvalidInclude {
                    value: "*".to_string(),
                    message: "wildcards are not supported for _revinclude".to_string(),
                });
            }

            let references: Vec<String> = ctx
                .resources
                .iter()
                .filter(|r| directive.accepts_target(resource_type(r)))
                .filter(|r| !resource_id(r).is_empty())
                .map(|r| format!("{}/{}", resource_type(r), resource_id(r)))
                .fold(Vec::new(), |mut acc, reference| {
                    if !acc.contains(&reference) {
                        acc.push(reference);
                    }
                    acc
                });

            if references.is_empty() {
                continue;
            }

            let mut terms = Map::new();
            terms.insert(
                format!("{}.reference", directive.element_name()),
                json!(references),
            );
            let clause = json!({ "terms": terms });
            queries.push(BackendQuery::new(
                collection_for(&directive.source_type),
                self.query_body(clause, ctx.filter_rules),
            ));
        }

        Ok(queries)
    }
}
