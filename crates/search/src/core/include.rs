//! One pass of `_include` / `_revinclude` expansion.

use serde_json::Value;

use crate::collaborators::{InclusionContext, InclusionDeriver};
use crate::config::SearchPolicy;
use crate::error::SearchResult;
use crate::types::{BackendQuery, SearchEntry, SearchMode, SearchRequest};

use super::executor::QueryExecutor;
use super::projector::project_hits;

/// Fetches resources related to a set of already-found entries.
///
/// The expander does not de-duplicate: entries it returns may already be
/// known to the caller.
pub struct InclusionExpander<'a> {
    executor: &'a QueryExecutor,
    deriver: &'a dyn InclusionDeriver,
    policy: &'a SearchPolicy,
}

impl<'a> InclusionExpander<'a> {
    /// Creates an expander.
    pub fn new(
        executor: &'a QueryExecutor,
        deriver: &'a dyn InclusionDeriver,
        policy: &'a SearchPolicy,
    ) -> Self {
        Self {
            executor,
            deriver,
            policy,
        }
    }

    /// Derives, filters, and runs the inclusion queries for `found`.
    ///
    /// With `iterate` set, only the `:iterate` directives are considered.
    pub async fn expand(
        &self,
        found: &[SearchEntry],
        request: &SearchRequest,
        iterate: bool,
    ) -> SearchResult<Vec<SearchEntry>> {
        if found.is_empty() {
            return Ok(Vec::new());
        }

        let resources: Vec<Value> = found.iter().map(|e| e.resource.clone()).collect();
        let ctx = InclusionContext {
            request,
            resources: &resources,
            filter_rules: &self.policy.filter_rules,
            fhir_version: request.fhir_version,
            iterate,
        };

        let mut candidates = self.deriver.include_queries(&ctx)?;
        candidates.extend(self.deriver.revinclude_queries(&ctx)?);

        let queries = allowed_queries(candidates, request);
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let hits = self.executor.execute_batch(&queries).await?;
        tracing::debug!(
            iterate,
            queries = queries.len(),
            hits = hits.len(),
            "Inclusion pass complete"
        );

        Ok(project_hits(
            hits,
            &request.base_url,
            SearchMode::Include,
            &self.policy.clean_up,
        ))
    }
}

/// Keeps the queries whose collection the caller may see.
fn allowed_queries(candidates: Vec<BackendQuery>, request: &SearchRequest) -> Vec<BackendQuery> {
    candidates
        .into_iter()
        .filter(|q| {
            let allowed = request.is_type_allowed(&q.collection);
            if !allowed {
                tracing::debug!(
                    collection = %q.collection,
                    "Dropping inclusion query for a resource type the caller may not see"
                );
            }
            allowed
        })
        .collect()
}
