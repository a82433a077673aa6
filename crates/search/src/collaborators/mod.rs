//! Query compilation and inclusion derivation.
//!
//! The orchestrator treats both as pluggable: a [`QueryCompiler`] turns the
//! request parameters into the primary query body, and an
//! [`InclusionDeriver`] turns a set of found resources into the backend
//! queries that fetch their `_include`/`_revinclude` targets.
//!
//! Default implementations:
//! - [`BasicQueryCompiler`] - `bool` query over plain field matches
//! - [`ReferenceInclusionDeriver`] - follows FHIR `reference` strings

use serde_json::Value;

use crate::error::SearchResult;
use crate::types::{BackendQuery, FhirVersion, SearchRequest};

mod compiler;
mod deriver;
mod directive;

pub use compiler::BasicQueryCompiler;
pub use deriver::{DEFAULT_MAX_INCLUDE_RESULTS, ReferenceInclusionDeriver};
pub use directive::{IncludeDirective, parse_reference};

/// Compiles request parameters into a backend query body.
pub trait QueryCompiler: Send + Sync {
    /// Builds the primary query body.
    ///
    /// `filter_rules` must be applied to the query as passive filters.
    /// Offset and page size are not part of the body.
    fn compile(&self, request: &SearchRequest, filter_rules: &[Value]) -> SearchResult<Value>;
}

/// Inputs for deriving inclusion queries.
#[derive(Debug, Clone, Copy)]
pub struct InclusionContext<'a> {
    /// The original request; its include parameters drive derivation.
    pub request: &'a SearchRequest,

    /// Resources whose references (or referrers) should be fetched.
    pub resources: &'a [Value],

    /// Passive filter clauses to add to every derived query.
    pub filter_rules: &'a [Value],

    /// FHIR version of the stored resources.
    pub fhir_version: FhirVersion,

    /// Whether this is an `:iterate` pass.
    pub iterate: bool,
}

/// Derives backend queries for included resources.
pub trait InclusionDeriver: Send + Sync {
    /// Queries for resources referenced by the context resources (`_include`).
    fn include_queries(&self, ctx: &InclusionContext<'_>) -> SearchResult<Vec<BackendQuery>>;

    /// Queries for resources referencing the context resources (`_revinclude`).
    fn revinclude_queries(&self, ctx: &InclusionContext<'_>) -> SearchResult<Vec<BackendQuery>>;
}
