//! Core types for search requests, backend queries, and results.

mod bundle;
mod entry;
mod query;
mod request;

pub use bundle::SearchBundle;
pub use entry::{SearchEntry, SearchMode};
pub use query::{BackendHits, BackendQuery};
pub use request::{
    ALLOW_ALL_TYPES, FhirVersion, ITERATE_PARAMS, PARAM_COUNT, PARAM_INCLUDE,
    PARAM_INCLUDE_ITERATE, PARAM_INCLUDE_RECURSE, PARAM_OFFSET, PARAM_OFFSET_ALIAS,
    PARAM_REVINCLUDE, PARAM_REVINCLUDE_ITERATE, PARAM_REVINCLUDE_RECURSE, SearchRequest,
    collection_for,
};
