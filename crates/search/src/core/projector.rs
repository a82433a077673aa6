//! Projection of raw hits into search entries.

use serde_json::Value;

use crate::config::CleanUp;
use crate::types::{SearchEntry, SearchMode};

/// Builds the canonical address of a resource: `{base}/{type}/{id}`.
pub fn resource_url(base_url: &str, resource_type: &str, id: &str) -> String {
    format!("{}/{}/{}", base_url.trim_end_matches('/'), resource_type, id)
}

/// Converts stored documents into entries, preserving order.
///
/// The clean-up transform runs before the address is derived, so the
/// address reflects the resource as it is returned.
pub fn project_hits(
    hits: Vec<Value>,
    base_url: &str,
    mode: SearchMode,
    clean_up: &CleanUp,
) -> Vec<SearchEntry> {
    hits.into_iter()
        .map(|hit| {
            let resource = clean_up.apply(hit);
            let resource_type = resource
                .get("resourceType")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            let id = resource
                .get("id")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            let full_url = resource_url(base_url, resource_type, id);
            SearchEntry::new(resource, mode, full_url)
        })
        .collect()
}
