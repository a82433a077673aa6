//! Type-level search orchestration.

use std::collections::HashSet;
use std::sync::Arc;

use crate::backends::SearchBackend;
use crate::collaborators::{
    BasicQueryCompiler, InclusionDeriver, QueryCompiler, ReferenceInclusionDeriver,
};
use crate::config::{SearchConfig, SearchPolicy};
use crate::error::{SearchError, SearchResult};
use crate::types::{BackendQuery, SearchBundle, SearchMode, SearchRequest};

use super::executor::QueryExecutor;
use super::include::InclusionExpander;
use super::iterate::IterativeResolver;
use super::pagination::{PageWindow, plan_links};
use super::projector::project_hits;

/// Resolves a search request into a complete searchset.
///
/// Stages run strictly in order because each depends on the previous one:
/// primary query, paging links, one `_include`/`_revinclude` pass over the
/// matches, then `:iterate` rounds over everything found so far.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use helios_search::backends::elasticsearch::{ElasticsearchBackend, ElasticsearchConfig};
/// use helios_search::core::SearchOrchestrator;
/// use helios_search::types::SearchRequest;
///
/// let backend = Arc::new(ElasticsearchBackend::new(ElasticsearchConfig::default())?);
/// let orchestrator = SearchOrchestrator::new(backend);
///
/// let request = SearchRequest::new("Patient")
///     .with_base_url("http://localhost:8080/fhir")
///     .with_param("family", "Smith")
///     .with_param("_include", "Patient:organization")
///     .with_allowed_types(["Organization"]);
///
/// let bundle = orchestrator.search(&request).await?;
/// ```
pub struct SearchOrchestrator {
    executor: QueryExecutor,
    compiler: Arc<dyn QueryCompiler>,
    deriver: Arc<dyn InclusionDeriver>,
    policy: SearchPolicy,
    config: SearchConfig,
}

impl std::fmt::Debug for SearchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchOrchestrator")
            .field("executor", &self.executor)
            .field("policy", &self.policy)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SearchOrchestrator {
    /// Creates an orchestrator with the default compiler, deriver, and policy.
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            executor: QueryExecutor::new(backend),
            compiler: Arc::new(BasicQueryCompiler::new()),
            deriver: Arc::new(ReferenceInclusionDeriver::new()),
            policy: SearchPolicy::default(),
            config: SearchConfig::default(),
        }
    }

    /// Replaces the query compiler.
    pub fn with_compiler(mut self, compiler: Arc<dyn QueryCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    /// Replaces the inclusion deriver.
    pub fn with_deriver(mut self, deriver: Arc<dyn InclusionDeriver>) -> Self {
        self.deriver = deriver;
        self
    }

    /// Sets the filter and clean-up policy.
    pub fn with_policy(mut self, policy: SearchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the limits.
    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the limits.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Returns the policy.
    pub fn policy(&self) -> &SearchPolicy {
        &self.policy
    }

    /// Searches one resource type and resolves its inclusions.
    ///
    /// # Errors
    ///
    /// * `SearchError::InvalidPagination` - If `_count` or the offset is malformed
    /// * `SearchError::InvalidInclude` - If an include directive is malformed
    /// * `SearchError::Backend` - For any backend failure other than a missing index
    pub async fn search(&self, request: &SearchRequest) -> SearchResult<SearchBundle> {
        match self.run(request).await {
            Ok(bundle) => Ok(bundle),
            Err(e) => {
                tracing::error!(
                    resource_type = %request.resource_type,
                    error = %e,
                    "Search failed"
                );
                Err(e)
            }
        }
    }

    /// Searches across all resource types.
    ///
    /// Not implemented at this layer; always fails without backend access.
    pub async fn search_all(&self, _request: &SearchRequest) -> SearchResult<SearchBundle> {
        Err(SearchError::not_implemented(
            "search across all resource types",
        ))
    }

    async fn run(&self, request: &SearchRequest) -> SearchResult<SearchBundle> {
        let window = PageWindow::from_request(request, &self.config)?;

        let body = self.compiler.compile(request, &self.policy.filter_rules)?;
        let query = BackendQuery::new(request.collection(), body);
        let hits = self.executor.execute(&query, window.from, window.size).await?;
        tracing::debug!(
            resource_type = %request.resource_type,
            total = hits.total,
            returned = hits.hits.len(),
            "Primary search complete"
        );

        let matches = project_hits(
            hits.hits,
            &request.base_url,
            SearchMode::Match,
            &self.policy.clean_up,
        );
        let mut bundle = SearchBundle::new(hits.total, matches);

        let links = plan_links(request, &window, hits.total);
        bundle.self_link = Some(links.self_link);
        bundle.previous_link = links.previous;
        bundle.next_link = links.next;

        let expander = InclusionExpander::new(&self.executor, self.deriver.as_ref(), &self.policy);

        let included = expander.expand(&bundle.entries, request, false).await?;
        let mut seen: HashSet<String> = bundle.entries.iter().map(|e| e.id().to_string()).collect();
        let included: Vec<_> = included
            .into_iter()
            .filter(|e| seen.insert(e.id().to_string()))
            .collect();
        bundle.append(included);

        let outcome = IterativeResolver::new(&expander, self.config.max_iterate_depth)
            .resolve(request, &bundle.entries)
            .await?;
        if outcome.truncated {
            bundle.message = Some(format!(
                "Iterative inclusion stopped after {} rounds; some related resources were not included",
                outcome.rounds
            ));
        }
        bundle.append(outcome.entries);

        tracing::debug!(
            resource_type = %request.resource_type,
            entries = bundle.entries.len(),
            iterate_rounds = outcome.rounds,
            "Search complete"
        );

        Ok(bundle)
    }
}
