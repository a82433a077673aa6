//! Offset pagination and paging links.
//!
//! Offsets and page sizes that are not non-negative integers are rejected
//! before any backend access. `_count` above the configured maximum is
//! clamped.

use url::form_urlencoded;

use crate::config::SearchConfig;
use crate::error::{SearchError, SearchResult};
use crate::types::{PARAM_COUNT, PARAM_OFFSET, PARAM_OFFSET_ALIAS, SearchRequest};

/// The offset window of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Number of results to skip.
    pub from: u32,
    /// Page size.
    pub size: u32,
}

impl PageWindow {
    /// Creates a window.
    pub fn new(from: u32, size: u32) -> Self {
        Self { from, size }
    }

    /// Reads `_getpagesoffset` (or `_offset`) and `_count` from a request.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::InvalidPagination` for values that are not
    /// non-negative integers.
    pub fn from_request(request: &SearchRequest, config: &SearchConfig) -> SearchResult<Self> {
        let offset = request
            .param(PARAM_OFFSET)
            .map(|v| (PARAM_OFFSET, v))
            .or_else(|| request.param(PARAM_OFFSET_ALIAS).map(|v| (PARAM_OFFSET_ALIAS, v)));

        let from = match offset {
            Some((name, value)) => parse_non_negative(name, value)?,
            None => 0,
        };

        let size = match request.param(PARAM_COUNT) {
            Some(value) => parse_non_negative(PARAM_COUNT, value)?.min(config.max_page_size),
            None => config.default_page_size,
        };

        Ok(Self { from, size })
    }

    /// Returns true if there is a page before this one.
    pub fn has_previous(&self) -> bool {
        self.from > 0
    }

    /// Returns true if results remain after this page.
    pub fn has_next(&self, total: u64) -> bool {
        self.size > 0 && u64::from(self.from) + u64::from(self.size) < total
    }

    /// Returns the window of the previous page, if any.
    pub fn previous(&self) -> Option<Self> {
        self.has_previous()
            .then(|| Self::new(self.from.saturating_sub(self.size), self.size))
    }

    /// Returns the window of the next page, if any.
    pub fn next(&self, total: u64) -> Option<Self> {
        self.has_next(total)
            .then(|| Self::new(self.from.saturating_add(self.size), self.size))
    }
}

fn parse_non_negative(name: &str, value: &str) -> SearchResult<u32> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| SearchError::InvalidPagination {
            parameter: name.to_string(),
            value: value.to_string(),
            message: "expected a non-negative integer".to_string(),
        })
}

/// Links for the current page and its neighbours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLinks {
    /// Link to the current page with the original parameters.
    pub self_link: String,
    /// Link to the previous page.
    pub previous: Option<String>,
    /// Link to the next page.
    pub next: Option<String>,
}

/// Builds paging links from the original request parameters.
pub fn plan_links(request: &SearchRequest, window: &PageWindow, total: u64) -> PageLinks {
    PageLinks {
        self_link: build_url(request, &request.params),
        previous: window
            .previous()
            .map(|w| build_url(request, &rewrite_window(&request.params, &w))),
        next: window
            .next(total)
            .map(|w| build_url(request, &rewrite_window(&request.params, &w))),
    }
}

/// Replaces the pagination parameters in place, appending any that are absent.
///
/// `_offset` is normalized to `_getpagesoffset` and repeated pagination
/// parameters collapse into one.
fn rewrite_window(params: &[(String, String)], window: &PageWindow) -> Vec<(String, String)> {
    let mut out = Vec::with_capacity(params.len() + 2);
    let mut offset_written = false;
    let mut count_written = false;

    for (name, value) in params {
        if name == PARAM_OFFSET || name == PARAM_OFFSET_ALIAS {
            if !offset_written {
                out.push((PARAM_OFFSET.to_string(), window.from.to_string()));
                offset_written = true;
            }
        } else if name == PARAM_COUNT {
            if !count_written {
                out.push((PARAM_COUNT.to_string(), window.size.to_string()));
                count_written = true;
            }
        } else {
            out.push((name.clone(), value.clone()));
        }
    }

    if !offset_written {
        out.push((PARAM_OFFSET.to_string(), window.from.to_string()));
    }
    if !count_written {
        out.push((PARAM_COUNT.to_string(), window.size.to_string()));
    }
    out
}

fn build_url(request: &SearchRequest, params: &[(String, String)]) -> String {
    let base = request.type_url();
    if params.is_empty() {
        return base;
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish();
    format!("{}?{}", base, query)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(params: &[(&str, &str)]) -> SearchRequest {
        SearchRequest::new("Patient")
            .with_base_url("http://example.com/fhir")
            .with_params(params.iter().copied())
    }

    #[test]
    fn test_window_defaults() {
        let window = PageWindow::from_request(&request(&[]), &SearchConfig::default()).unwrap();
        assert_eq!(window, PageWindow::new(0, 20));
    }

    #[test]
    fn test_window_reads_params() {
        let req = request(&[("_getpagesoffset", "30"), ("_count", "10")]);
        let window = PageWindow::from_request(&req, &SearchConfig::default()).unwrap();
        assert_eq!(window, PageWindow::new(30, 10));

        let req = request(&[("_offset", "5")]);
        let window = PageWindow::from_request(&req, &SearchConfig::default()).unwrap();
        assert_eq!(window.from, 5);
    }

    #[test]
    fn test_window_clamps_count() {
        let req = request(&[("_count", "5000")]);
        let window = PageWindow::from_request(&req, &SearchConfig::default()).unwrap();
        assert_eq!(window.size, 1000);
    }

    #[test]
    fn test_window_rejects_malformed_values() {
        let config = SearchConfig::default();
        for (name, value) in [
            ("_count", "ten"),
            ("_count", "-1"),
            ("_getpagesoffset", "1.5"),
            ("_getpagesoffset", ""),
            ("_offset", "99999999999"),
        ] {
            let err = PageWindow::from_request(&request(&[(name, value)]), &config).unwrap_err();
            match err {
                SearchError::InvalidPagination { parameter, .. } => assert_eq!(parameter, name),
                other => panic!("expected InvalidPagination, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_middle_page_links() {
        let req = request(&[("name", "smith"), ("_getpagesoffset", "10"), ("_count", "10")]);
        let window = PageWindow::from_request(&req, &SearchConfig::default()).unwrap();
        let links = plan_links(&req, &window, 25);

        assert_eq!(
            links.previous.as_deref(),
            Some("http://example.com/fhir/Patient?name=smith&_getpagesoffset=0&_count=10")
        );
        assert_eq!(
            links.next.as_deref(),
            Some("http://example.com/fhir/Patient?name=smith&_getpagesoffset=20&_count=10")
        );
        assert_eq!(
            links.self_link,
            "http://example.com/fhir/Patient?name=smith&_getpagesoffset=10&_count=10"
        );
    }

    #[test]
    fn test_last_page_has_no_next() {
        let req = request(&[("_getpagesoffset", "20"), ("_count", "10")]);
        let window = PageWindow::from_request(&req, &SearchConfig::default()).unwrap();
        let links = plan_links(&req, &window, 25);

        assert!(links.next.is_none());
        assert_eq!(
            links.previous.as_deref(),
            Some("http://example.com/fhir/Patient?_getpagesoffset=10&_count=10")
        );
    }

    #[test]
    fn test_first_page_appends_missing_params() {
        let req = request(&[("name", "a b")]);
        let window = PageWindow::new(0, 10);
        let links = plan_links(&req, &window, 25);

        assert!(links.previous.is_none());
        assert_eq!(
            links.next.as_deref(),
            Some("http://example.com/fhir/Patient?name=a+b&_getpagesoffset=10&_count=10")
        );
    }

    #[test]
    fn test_previous_offset_saturates() {
        let window = PageWindow::new(5, 10);
        assert_eq!(window.previous(), Some(PageWindow::new(0, 10)));
    }

    #[test]
    fn test_zero_size_has_no_next() {
        let window = PageWindow::new(0, 0);
        assert!(window.next(100).is_none());
    }

    #[test]
    fn test_alias_normalized_in_links() {
        let req = request(&[("_offset", "10"), ("_count", "10")]);
        let window = PageWindow::from_request(&req, &SearchConfig::default()).unwrap();
        let links = plan_links(&req, &window, 100);
        assert_eq!(
            links.next.as_deref(),
            Some("http://example.com/fhir/Patient?_getpagesoffset=20&_count=10")
        );
    }

    #[test]
    fn test_empty_params_self_link() {
        let req = request(&[]);
        let links = plan_links(&req, &PageWindow::new(0, 20), 0);
        assert_eq!(links.self_link, "http://example.com/fhir/Patient");
        assert!(links.previous.is_none());
        assert!(links.next.is_none());
    }
}
