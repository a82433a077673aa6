//! `_include` / `_revinclude` directive and reference parsing.

use crate::error::{SearchError, SearchResult};

/// Wildcard accepted as a whole `_include` value.
const WILDCARD: &str = "*";

/// A parsed `SourceType:searchParam[:TargetType]` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDirective {
    /// Resource type holding the reference (`*` for any).
    pub source_type: String,
    /// Search parameter naming the reference element (`*` for all).
    pub search_param: String,
    /// Optional restriction on the referenced type.
    pub target_type: Option<String>,
}

impl IncludeDirective {
    /// Parses a directive value.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::InvalidInclude` if the value has fewer than two
    /// or more than three non-empty segments.
    pub fn parse(value: &str) -> SearchResult<Self> {
        if value == WILDCARD {
            return Ok(Self {
                source_type: WILDCARD.to_string(),
                search_param: WILDCARD.to_string(),
                target_type: None,
            });
        }

        let parts: Vec<&str> = value.split(':').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(invalid(value, "empty segment"));
        }

        match parts.as_slice() {
            [source, param] => Ok(Self {
                source_type: source.to_string(),
                search_param: param.to_string(),
                target_type: None,
            }),
            [source, param, target] => Ok(Self {
                source_type: source.to_string(),
                search_param: param.to_string(),
                target_type: Some(target.to_string()),
            }),
            _ => Err(invalid(
                value,
                "expected SourceType:searchParam[:TargetType]",
            )),
        }
    }

    /// Returns true if the directive reads every reference element.
    pub fn is_wildcard(&self) -> bool {
        self.search_param == WILDCARD
    }

    /// Returns true if resources of this type are directive sources.
    pub fn applies_to(&self, resource_type: &str) -> bool {
        self.source_type == WILDCARD || self.source_type == resource_type
    }

    /// Returns true if a reference to this type passes the target restriction.
    pub fn accepts_target(&self, resource_type: &str) -> bool {
        self.target_type
            .as_deref()
            .is_none_or(|target| target == resource_type)
    }

    /// Returns the JSON element name for the search parameter.
    ///
    /// FHIR search parameter codes are kebab-case while elements are
    /// camelCase, so `general-practitioner` maps to `generalPractitioner`.
    pub fn element_name(&self) -> String {
        let mut out = String::with_capacity(self.search_param.len());
        let mut upper = false;
        for c in self.search_param.chars() {
            if c == '-' {
                upper = true;
            } else if upper {
                out.extend(c.to_uppercase());
                upper = false;
            } else {
                out.push(c);
            }
        }
        out
    }
}

fn invalid(value: &str, message: &str) -> SearchError {
    SearchError::InvalidInclude {
        value: value.to_string(),
        message: message.to_string(),
    }
}

/// Parses a FHIR reference string into `(type, id)`.
///
/// Accepts relative (`Patient/123`), absolute
/// (`http://x/fhir/Patient/123`) and versioned
/// (`Patient/123/_history/2`) forms. Contained (`#id`) and
/// type-less references yield `None`.
pub fn parse_reference(reference: &str) -> Option<(String, String)> {
    let reference = match reference.find("/_history/") {
        Some(pos) => &reference[..pos],
        None => reference,
    };

    let (type_part, id_part) = reference.rsplit_once('/')?;
    if id_part.is_empty() {
        return None;
    }

    let resource_type = type_part.rsplit('/').next().unwrap_or(type_part);
    if resource_type
        .chars()
        .next()
        .map(|c| c.is_ascii_uppercase())
        .unwrap_or(false)
    {
        return Some((resource_type.to_string(), id_part.to_string()));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_part_directive() {
        let d = IncludeDirective::parse("Patient:organization").unwrap();
        assert_eq!(d.source_type, "Patient");
        assert_eq!(d.search_param, "organization");
        assert!(d.target_type.is_none());
        assert!(d.applies_to("Patient"));
        assert!(!d.applies_to("Observation"));
        assert!(d.accepts_target("Organization"));
    }

    #[test]
    fn test_parse_targeted_directive() {
        let d = IncludeDirective::parse("Observation:subject:Patient").unwrap();
        assert_eq!(d.target_type.as_deref(), Some("Patient"));
        assert!(d.accepts_target("Patient"));
        assert!(!d.accepts_target("Group"));
    }

    #[test]
    fn test_parse_wildcard() {
        let d = IncludeDirective::parse("*").unwrap();
        assert!(d.is_wildcard());
        assert!(d.applies_to("Anything"));
    }

    #[test]
    fn test_parse_invalid_directives() {
        assert!(IncludeDirective::parse("Patient").is_err());
        assert!(IncludeDirective::parse("Patient::Organization").is_err());
        assert!(IncludeDirective::parse("a:b:c:d").is_err());
    }

    #[test]
    fn test_element_name() {
        let d = IncludeDirective::parse("Patient:general-practitioner").unwrap();
        assert_eq!(d.element_name(), "generalPractitioner");
        let d = IncludeDirective::parse("Observation:subject").unwrap();
        assert_eq!(d.element_name(), "subject");
    }

    #[test]
    fn test_parse_reference_forms() {
        assert_eq!(
            parse_reference("Patient/123"),
            Some(("Patient".to_string(), "123".to_string()))
        );
        assert_eq!(
            parse_reference("http://example.com/fhir/Organization/o1"),
            Some(("Organization".to_string(), "o1".to_string()))
        );
        assert_eq!(
            parse_reference("Patient/123/_history/4"),
            Some(("Patient".to_string(), "123".to_string()))
        );
        assert_eq!(parse_reference("#contained"), None);
        assert_eq!(parse_reference("urn:uuid:abc"), None);
        assert_eq!(parse_reference("Patient/"), None);
    }
}
