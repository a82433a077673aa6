//! The searchset result built by one orchestrated search.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::entry::{SearchEntry, SearchMode};

/// Result of a type-level search, including resolved inclusions.
///
/// Primary matches come first, followed by included resources in the
/// order they were discovered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchBundle {
    /// Total matches of the primary query. Inclusions are not counted.
    pub total: u64,

    /// Entries in result order.
    pub entries: Vec<SearchEntry>,

    /// Link to this page.
    pub self_link: Option<String>,

    /// Link to the previous page, if any.
    pub previous_link: Option<String>,

    /// Link to the next page, if any.
    pub next_link: Option<String>,

    /// Informational message surfaced as an OperationOutcome entry.
    pub message: Option<String>,
}

impl SearchBundle {
    /// Creates a bundle with the given total and primary entries.
    pub fn new(total: u64, entries: Vec<SearchEntry>) -> Self {
        Self {
            total,
            entries,
            ..Default::default()
        }
    }

    /// Creates an empty bundle.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sets the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Appends entries to the end of the bundle.
    pub fn append(&mut self, entries: impl IntoIterator<Item = SearchEntry>) {
        self.entries.extend(entries);
    }

    /// Returns the primary matches.
    pub fn matches(&self) -> impl Iterator<Item = &SearchEntry> {
        self.entries.iter().filter(|e| e.mode == SearchMode::Match)
    }

    /// Returns the included resources.
    pub fn included(&self) -> impl Iterator<Item = &SearchEntry> {
        self.entries.iter().filter(|e| e.mode == SearchMode::Include)
    }

    /// Converts to a FHIR `Bundle` resource of type `searchset`.
    pub fn to_json(&self) -> Value {
        let mut bundle = json!({
            "resourceType": "Bundle",
            "type": "searchset",
            "total": self.total,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let links: Vec<Value> = [
            ("self", &self.self_link),
            ("previous", &self.previous_link),
            ("next", &self.next_link),
        ]
        .into_iter()
        .filter_map(|(relation, url)| {
            url.as_ref()
                .map(|url| json!({ "relation": relation, "url": url }))
        })
        .collect();
        if !links.is_empty() {
            bundle["link"] = json!(links);
        }

        let mut entries: Vec<Value> = self.entries.iter().map(|e| e.to_json()).collect();
        if let Some(message) = &self.message {
            entries.push(json!({
                "resource": {
                    "resourceType": "OperationOutcome",
                    "issue": [{
                        "severity": "information",
                        "code": "informational",
                        "diagnostics": message
                    }]
                },
                "search": { "mode": SearchMode::Outcome.as_str() }
            }));
        }
        if !entries.is_empty() {
            bundle["entry"] = json!(entries);
        }

        bundle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, mode: SearchMode) -> SearchEntry {
        SearchEntry::new(
            json!({"resourceType": "Patient", "id": id}),
            mode,
            format!("http://example.com/Patient/{}", id),
        )
    }

    #[test]
    fn test_searchset_bundle() {
        let mut bundle = SearchBundle::new(1, vec![entry("p1", SearchMode::Match)]);
        bundle.self_link = Some("http://example.com/Patient".to_string());
        bundle.append(vec![entry("p2", SearchMode::Include)]);

        let json = bundle.to_json();
        assert_eq!(json["resourceType"], "Bundle");
        assert_eq!(json["type"], "searchset");
        assert_eq!(json["total"], 1);
        assert_eq!(json["link"][0]["relation"], "self");
        assert_eq!(json["entry"][0]["search"]["mode"], "match");
        assert_eq!(json["entry"][1]["search"]["mode"], "include");
        assert_eq!(bundle.matches().count(), 1);
        assert_eq!(bundle.included().count(), 1);
    }

    #[test]
    fn test_empty_bundle_has_no_links_or_entries() {
        let json = SearchBundle::empty().to_json();
        assert_eq!(json["total"], 0);
        assert!(json.get("link").is_none());
        assert!(json.get("entry").is_none());
    }

    #[test]
    fn test_message_becomes_outcome_entry() {
        let json = SearchBundle::empty()
            .with_message("index not created yet")
            .to_json();
        assert_eq!(json["entry"][0]["search"]["mode"], "outcome");
        assert_eq!(
            json["entry"][0]["resource"]["issue"][0]["diagnostics"],
            "index not created yet"
        );
    }
}
