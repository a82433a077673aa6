//! Search result entries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Why an entry is part of a search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Primary search result.
    Match,
    /// Included via _include or _revinclude.
    Include,
    /// Result of server-side processing.
    Outcome,
}

impl SearchMode {
    /// Returns the FHIR code string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Match => "match",
            SearchMode::Include => "include",
            SearchMode::Outcome => "outcome",
        }
    }
}

/// A resolved resource within a search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchEntry {
    /// The cleaned resource payload.
    pub resource: Value,

    /// Provenance of the entry.
    pub mode: SearchMode,

    /// Canonical address: `{base}/{type}/{id}`.
    pub full_url: String,
}

impl SearchEntry {
    /// Creates a new entry.
    pub fn new(resource: Value, mode: SearchMode, full_url: impl Into<String>) -> Self {
        Self {
            resource,
            mode,
            full_url: full_url.into(),
        }
    }

    /// Returns the resource identifier used for de-duplication.
    pub fn id(&self) -> &str {
        self.resource
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
    }

    /// Returns the declared resource type.
    pub fn resource_type(&self) -> &str {
        self.resource
            .get("resourceType")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
    }

    /// Returns the relative reference for this resource (`Type/id`).
    pub fn reference(&self) -> String {
        format!("{}/{}", self.resource_type(), self.id())
    }

    /// Converts to a FHIR `Bundle.entry` element.
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "fullUrl": self.full_url,
            "resource": self.resource,
            "search": { "mode": self.mode.as_str() }
        })
    }
}
