//! Search execution and inclusion resolution.
//!
//! Components, leaves first:
//! - [`QueryExecutor`] - single and batched queries with missing-index tolerance
//! - [`project_hits`] - raw hits to [`SearchEntry`](crate::types::SearchEntry) values
//! - [`PageWindow`] / [`plan_links`] - offset windows and paging links
//! - [`InclusionExpander`] - one `_include`/`_revinclude` pass
//! - [`IterativeResolver`] - bounded `:iterate` traversal
//! - [`SearchOrchestrator`] - the entry point tying them together

mod executor;
mod include;
mod iterate;
mod orchestrator;
mod pagination;
mod projector;

pub use executor::QueryExecutor;
pub use include::InclusionExpander;
pub use iterate::{IterateOutcome, IterativeResolver, TraversalState};
pub use orchestrator::SearchOrchestrator;
pub use pagination::{PageLinks, PageWindow, plan_links};
pub use projector::{project_hits, resource_url};
