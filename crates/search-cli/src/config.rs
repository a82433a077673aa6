//! Command-line configuration for `hfs-search`.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `HFS_SEARCH_ES_NODES` | http://localhost:9200 | Comma-separated Elasticsearch nodes |
//! | `HFS_SEARCH_ES_INDEX_PREFIX` | hfs | Index name prefix |
//! | `HFS_SEARCH_ES_USERNAME` | | Basic auth username |
//! | `HFS_SEARCH_ES_PASSWORD` | | Basic auth password |
//! | `HFS_SEARCH_ES_TIMEOUT_MS` | 30000 | Request timeout (milliseconds) |
//! | `HFS_SEARCH_BASE_URL` | http://localhost:8080/fhir | Base URL for `fullUrl` and links |
//! | `HFS_SEARCH_ALLOWED_TYPES` | | Types that may be included (`*` for all) |
//! | `HFS_SEARCH_FHIR_VERSION` | 4.0 | FHIR version (4.0, 4.3, 5.0, 6.0) |
//! | `HFS_SEARCH_DEFAULT_PAGE_SIZE` | 20 | Page size when `_count` is absent |
//! | `HFS_SEARCH_MAX_PAGE_SIZE` | 1000 | Upper bound for `_count` |
//! | `HFS_SEARCH_MAX_ITERATE_DEPTH` | 5 | Rounds of `:iterate` resolution |
//! | `HFS_SEARCH_MAX_INCLUDE_RESULTS` | 1000 | Size of each inclusion query |
//! | `HFS_SEARCH_LOG_LEVEL` | warn | Log level |

use clap::Parser;

use helios_search::backends::elasticsearch::{ElasticsearchAuth, ElasticsearchConfig};
use helios_search::config::SearchConfig;
use helios_search::types::{FhirVersion, SearchRequest};

/// Runs one FHIR search against Elasticsearch and prints the searchset.
#[derive(Debug, Clone, Parser)]
#[command(name = "hfs-search")]
#[command(about = "Resolve a FHIR search, with _include and _revinclude, against Elasticsearch")]
pub struct CliConfig {
    /// Resource type to search (e.g. `Patient`).
    pub resource_type: String,

    /// Search parameter as `name=value`. Repeatable, order is kept.
    #[arg(short, long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,

    /// Elasticsearch node URLs (comma-separated).
    #[arg(long, env = "HFS_SEARCH_ES_NODES", default_value = "http://localhost:9200")]
    pub es_nodes: String,

    /// Elasticsearch index prefix.
    #[arg(long, env = "HFS_SEARCH_ES_INDEX_PREFIX", default_value = "hfs")]
    pub es_index_prefix: String,

    /// Elasticsearch username for basic auth.
    #[arg(long, env = "HFS_SEARCH_ES_USERNAME")]
    pub es_username: Option<String>,

    /// Elasticsearch password for basic auth.
    #[arg(long, env = "HFS_SEARCH_ES_PASSWORD")]
    pub es_password: Option<String>,

    /// Elasticsearch request timeout in milliseconds.
    #[arg(long, env = "HFS_SEARCH_ES_TIMEOUT_MS", default_value = "30000")]
    pub es_timeout_ms: u64,

    /// Base URL used for `fullUrl` values and paging links.
    #[arg(long, env = "HFS_SEARCH_BASE_URL", default_value = "http://localhost:8080/fhir")]
    pub base_url: String,

    /// Resource types that may appear as included resources (comma-separated, `*` for all).
    #[arg(long, env = "HFS_SEARCH_ALLOWED_TYPES", default_value = "")]
    pub allowed_types: String,

    /// FHIR version of the stored resources.
    #[arg(long, env = "HFS_SEARCH_FHIR_VERSION", default_value = "4.0")]
    pub fhir_version: String,

    /// Page size when `_count` is not given.
    #[arg(long, env = "HFS_SEARCH_DEFAULT_PAGE_SIZE", default_value = "20")]
    pub default_page_size: u32,

    /// Upper bound for `_count`.
    #[arg(long, env = "HFS_SEARCH_MAX_PAGE_SIZE", default_value = "1000")]
    pub max_page_size: u32,

    /// Maximum rounds of `:iterate` resolution.
    #[arg(long, env = "HFS_SEARCH_MAX_ITERATE_DEPTH", default_value = "5")]
    pub max_iterate_depth: usize,

    /// Maximum resources fetched by each inclusion query.
    #[arg(long, env = "HFS_SEARCH_MAX_INCLUDE_RESULTS", default_value = "1000")]
    pub max_include_results: u32,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "HFS_SEARCH_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Check cluster health before searching.
    #[arg(long)]
    pub health_check: bool,

    /// Print compact JSON instead of pretty-printed.
    #[arg(long)]
    pub compact: bool,
}

impl CliConfig {
    /// Validates the configuration and returns every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.resource_type.trim().is_empty() {
            errors.push("Resource type cannot be empty".to_string());
        }

        if self.nodes().is_empty() {
            errors.push("At least one Elasticsearch node is required".to_string());
        }

        if self.es_timeout_ms == 0 {
            errors.push("Elasticsearch timeout cannot be 0".to_string());
        }

        if self.es_username.is_some() != self.es_password.is_some() {
            errors.push("Elasticsearch username and password must be set together".to_string());
        }

        if FhirVersion::from_mime_param(&self.fhir_version).is_none() {
            errors.push(format!("Unknown FHIR version '{}'", self.fhir_version));
        }

        if self.max_include_results == 0 {
            errors.push("Max include results cannot be 0".to_string());
        }

        for param in &self.params {
            if split_param(param).is_none() {
                errors.push(format!("Parameter '{}' is not of the form name=value", param));
            }
        }

        if let Err(search_errors) = self.search_config().validate() {
            errors.extend(search_errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Returns the configured Elasticsearch nodes.
    pub fn nodes(&self) -> Vec<String> {
        split_list(&self.es_nodes)
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
            max_iterate_depth: self.max_iterate_depth,
        }
    }

    pub fn elasticsearch_config(&self) -> ElasticsearchConfig {
        let auth = match (&self.es_username, &self.es_password) {
            (Some(username), Some(password)) => Some(ElasticsearchAuth::Basic {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        };

        ElasticsearchConfig {
            nodes: self.nodes(),
            index_prefix: self.es_index_prefix.clone(),
            request_timeout_ms: self.es_timeout_ms,
            auth,
            ..Default::default()
        }
    }

    /// Builds the search request. Call [`validate`](Self::validate) first.
    pub fn request(&self) -> SearchRequest {
        SearchRequest::new(self.resource_type.trim())
            .with_base_url(&self.base_url)
            .with_params(self.params.iter().filter_map(|p| split_param(p)))
            .with_allowed_types(split_list(&self.allowed_types))
            .with_fhir_version(FhirVersion::from_mime_param(&self.fhir_version).unwrap_or_default())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn split_param(param: &str) -> Option<(&str, &str)> {
    let (name, value) = param.split_once('=')?;
    let name = name.trim();
    (!name.is_empty()).then_some((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliConfig {
        let mut argv = vec!["hfs-search"];
        argv.extend_from_slice(args);
        CliConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["Patient"]);
        assert_eq!(config.nodes(), vec!["http://localhost:9200"]);
        assert_eq!(config.es_index_prefix, "hfs");
        assert_eq!(config.default_page_size, 20);
        assert_eq!(config.max_iterate_depth, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_request_keeps_param_order() {
        let config = parse(&[
            "Patient",
            "-p",
            "family=Smith",
            "--param",
            "_include=Patient:organization",
            "-p",
            "family=Jones",
            "--allowed-types",
            "Organization, Practitioner",
        ]);
        let request = config.request();

        assert_eq!(request.resource_type, "Patient");
        assert_eq!(request.param_values("family"), vec!["Smith", "Jones"]);
        assert_eq!(request.params[1].0, "_include");
        assert!(request.is_type_allowed("Practitioner"));
        assert!(!request.is_type_allowed("Observation"));
    }

    #[test]
    fn test_param_value_may_contain_equals() {
        let config = parse(&["Observation", "-p", "code=http://loinc.org|1234=5"]);
        assert_eq!(
            config.request().param("code"),
            Some("http://loinc.org|1234=5")
        );
    }

    #[test]
    fn test_validation_collects_errors() {
        let config = parse(&[
            "Patient",
            "-p",
            "missing-equals",
            "--es-nodes",
            " , ",
            "--fhir-version",
            "3.0",
            "--es-username",
            "elastic",
            "--default-page-size",
            "50",
            "--max-page-size",
            "10",
        ]);
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn test_elasticsearch_config() {
        let config = parse(&[
            "Patient",
            "--es-nodes",
            "http://es1:9200,http://es2:9200",
            "--es-index-prefix",
            "tenant",
            "--es-username",
            "elastic",
            "--es-password",
            "changeme",
        ]);
        let es = config.elasticsearch_config();
        assert_eq!(es.nodes.len(), 2);
        assert_eq!(es.index_prefix, "tenant");
        assert!(matches!(es.auth, Some(ElasticsearchAuth::Basic { .. })));
    }
}
