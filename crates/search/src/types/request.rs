//! Search request types.
//!
//! A [`SearchRequest`] carries everything one orchestrated search needs: the
//! resource type, the raw query parameters in their original order, the base
//! URL used for links, and the resource types the caller may see.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Page offset parameter used in generated paging links.
pub const PARAM_OFFSET: &str = "_getpagesoffset";

/// Alternate page offset parameter accepted on input.
pub const PARAM_OFFSET_ALIAS: &str = "_offset";

/// Page size parameter.
pub const PARAM_COUNT: &str = "_count";

/// Forward include parameter.
pub const PARAM_INCLUDE: &str = "_include";

/// Reverse include parameter.
pub const PARAM_REVINCLUDE: &str = "_revinclude";

/// Forward include parameter applied to included resources as well.
pub const PARAM_INCLUDE_ITERATE: &str = "_include:iterate";

/// Reverse include parameter applied to included resources as well.
pub const PARAM_REVINCLUDE_ITERATE: &str = "_revinclude:iterate";

/// Legacy (STU3) spelling of `_include:iterate`.
pub const PARAM_INCLUDE_RECURSE: &str = "_include:recurse";

/// Legacy (STU3) spelling of `_revinclude:iterate`.
pub const PARAM_REVINCLUDE_RECURSE: &str = "_revinclude:recurse";

/// Parameter names that request transitive inclusion.
pub const ITERATE_PARAMS: [&str; 4] = [
    PARAM_INCLUDE_ITERATE,
    PARAM_REVINCLUDE_ITERATE,
    PARAM_INCLUDE_RECURSE,
    PARAM_REVINCLUDE_RECURSE,
];

/// Wildcard entry in the allowed resource type set.
pub const ALLOW_ALL_TYPES: &str = "*";

/// FHIR version of the stored resources.
///
/// Passed through to inclusion derivers, which may need it to resolve
/// search parameter definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FhirVersion {
    /// FHIR R4 (4.0.1).
    #[default]
    R4,
    /// FHIR R4B (4.3.0).
    R4B,
    /// FHIR R5 (5.0.0).
    R5,
    /// FHIR R6 (ballot).
    R6,
}

impl FhirVersion {
    /// Returns the `fhirVersion` MIME parameter value for this version.
    pub fn as_mime_param(&self) -> &'static str {
        match self {
            FhirVersion::R4 => "4.0",
            FhirVersion::R4B => "4.3",
            FhirVersion::R5 => "5.0",
            FhirVersion::R6 => "6.0",
        }
    }

    /// Parses a `fhirVersion` MIME parameter value.
    pub fn from_mime_param(value: &str) -> Option<Self> {
        match value {
            "4.0" | "4.0.1" => Some(FhirVersion::R4),
            "4.3" | "4.3.0" => Some(FhirVersion::R4B),
            "5.0" | "5.0.0" => Some(FhirVersion::R5),
            "6.0" | "6.0.0" => Some(FhirVersion::R6),
            _ => None,
        }
    }
}

impl fmt::Display for FhirVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FhirVersion::R4 => write!(f, "R4"),
            FhirVersion::R4B => write!(f, "R4B"),
            FhirVersion::R5 => write!(f, "R5"),
            FhirVersion::R6 => write!(f, "R6"),
        }
    }
}

/// A single type-level search request.
///
/// Immutable for the lifetime of one orchestrated search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// The resource type being searched (e.g. `Patient`).
    pub resource_type: String,

    /// Query parameters in request order. Names may repeat.
    pub params: Vec<(String, String)>,

    /// Base URL used for entry addresses and paging links.
    pub base_url: String,

    /// Resource types the caller is permitted to see, lowercased.
    allowed_resource_types: HashSet<String>,

    /// FHIR version of the stored resources.
    #[serde(default)]
    pub fhir_version: FhirVersion,
}

impl SearchRequest {
    /// Creates a request for the given resource type with no parameters.
    ///
    /// The searched type itself is always allowed.
    pub fn new(resource_type: impl Into<String>) -> Self {
        let resource_type = resource_type.into();
        let mut allowed_resource_types = HashSet::new();
        allowed_resource_types.insert(resource_type.to_lowercase());
        Self {
            resource_type,
            params: Vec::new(),
            base_url: String::new(),
            allowed_resource_types,
            fhir_version: FhirVersion::default(),
        }
    }

    /// Appends a query parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Appends several query parameters, preserving their order.
    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Adds resource types the caller may see. `*` allows every type.
    pub fn with_allowed_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_resource_types
            .extend(types.into_iter().map(|t| t.as_ref().to_lowercase()));
        self
    }

    /// Sets the FHIR version.
    pub fn with_fhir_version(mut self, version: FhirVersion) -> Self {
        self.fhir_version = version;
        self
    }

    /// Returns the first value of a parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns every value of a parameter in request order.
    pub fn param_values(&self, name: &str) -> Vec<&str> {
        self.params
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Returns true if the parameter is present at least once.
    pub fn has_param(&self, name: &str) -> bool {
        self.params.iter().any(|(k, _)| k == name)
    }

    /// Returns true if any transitive inclusion parameter is present.
    pub fn has_iterate_params(&self) -> bool {
        ITERATE_PARAMS.iter().any(|name| self.has_param(name))
    }

    /// Returns true if the caller may see resources of this type or collection.
    ///
    /// Matching is case-insensitive so both `Patient` and `patient` match.
    pub fn is_type_allowed(&self, resource_type: &str) -> bool {
        self.allowed_resource_types.contains(ALLOW_ALL_TYPES)
            || self
                .allowed_resource_types
                .contains(&resource_type.to_lowercase())
    }

    /// Returns the allowed resource types (lowercased).
    pub fn allowed_types(&self) -> &HashSet<String> {
        &self.allowed_resource_types
    }

    /// Returns the backend collection for the searched resource type.
    pub fn collection(&self) -> String {
        collection_for(&self.resource_type)
    }

    /// Returns the type-level search URL without a query string.
    pub fn type_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.resource_type
        )
    }
}

/// Returns the backend collection name for a resource type.
pub fn collection_for(resource_type: &str) -> String {
    resource_type.to_lowercase()
}
