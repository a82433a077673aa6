//! Search configuration.
//!
//! [`SearchConfig`] holds the numeric limits and is deserializable with
//! per-field defaults. [`SearchPolicy`] is the injected policy value: passive
//! filter rules added to every backend query and a clean-up transform applied
//! to every stored document before it is returned.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default page size when `_count` is absent.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound for `_count`.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Maximum number of `:iterate` expansion rounds.
pub const MAX_ITERATE_DEPTH: usize = 5;

/// Limits applied by the search orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Page size used when `_count` is absent (default: 20).
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Larger `_count` values are clamped to this (default: 1000).
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Maximum number of `:iterate` rounds (default: 5).
    #[serde(default = "default_max_iterate_depth")]
    pub max_iterate_depth: usize,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_max_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_max_iterate_depth() -> usize {
    MAX_ITERATE_DEPTH
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            max_iterate_depth: default_max_iterate_depth(),
        }
    }
}

impl SearchConfig {
    /// Validates the configuration and returns every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.max_page_size == 0 {
            errors.push("Max page size cannot be 0".to_string());
        }

        if self.default_page_size > self.max_page_size {
            errors.push("Default page size cannot exceed max page size".to_string());
        }

        if self.max_iterate_depth == 0 {
            errors.push("Max iterate depth cannot be 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Transform applied to each stored document before it is surfaced.
#[derive(Clone)]
pub struct CleanUp(Arc<dyn Fn(Value) -> Value + Send + Sync>);

impl CleanUp {
    /// Wraps a transform.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// The identity transform.
    pub fn identity() -> Self {
        Self::new(|resource| resource)
    }

    /// Applies the transform.
    pub fn apply(&self, resource: Value) -> Value {
        (self.0)(resource)
    }
}

impl Default for CleanUp {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for CleanUp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CleanUp").finish_non_exhaustive()
    }
}

/// Passive filtering and clean-up policy injected into the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct SearchPolicy {
    /// Filter clauses added to every backend query.
    pub filter_rules: Vec<Value>,

    /// Transform applied to every returned document.
    pub clean_up: CleanUp,
}

impl SearchPolicy {
    /// Creates a policy with no filters and the identity clean-up.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a passive filter clause.
    pub fn with_filter_rule(mut self, rule: Value) -> Self {
        self.filter_rules.push(rule);
        self
    }

    /// Sets the clean-up transform.
    pub fn with_clean_up<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.clean_up = CleanUp::new(f);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.default_page_size, 20);
        assert_eq!(config.max_page_size, 1000);
        assert_eq!(config.max_iterate_depth, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_partial_deserialization() {
        let config: SearchConfig = serde_json::from_str(r#"{"default_page_size": 50}"#).unwrap();
        assert_eq!(config.default_page_size, 50);
        assert_eq!(config.max_page_size, 1000);
        assert_eq!(config.max_iterate_depth, 5);
    }

    #[test]
    fn test_config_validation_collects_errors() {
        let config = SearchConfig {
            default_page_size: 10,
            max_page_size: 0,
            max_iterate_depth: 0,
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_identity_clean_up() {
        let resource = json!({"resourceType": "Patient", "id": "p1"});
        assert_eq!(CleanUp::identity().apply(resource.clone()), resource);
    }

    #[test]
    fn test_policy_clean_up() {
        let policy = SearchPolicy::new()
            .with_filter_rule(json!({"term": {"meta.security.code": "public"}}))
            .with_clean_up(|mut resource| {
                if let Some(obj) = resource.as_object_mut() {
                    obj.remove("text");
                }
                resource
            });

        assert_eq!(policy.filter_rules.len(), 1);
        let cleaned = policy
            .clean_up
            .apply(json!({"id": "p1", "text": {"div": "<div/>"}}));
        assert!(cleaned.get("text").is_none());
    }
}
