//! Parsing of Elasticsearch search and multi-search responses.

use serde_json::Value;

use crate::backends::SubQueryResult;
use crate::error::BackendError;
use crate::types::BackendHits;

const BACKEND_NAME: &str = "elasticsearch";
const INDEX_NOT_FOUND: &str = "index_not_found_exception";

fn invalid_response(message: impl Into<String>) -> BackendError {
    BackendError::InvalidResponse {
        backend_name: BACKEND_NAME.to_string(),
        message: message.into(),
    }
}

/// Extracts the total and `_source` documents from a search response body.
pub fn parse_search_response(body: &Value) -> Result<BackendHits, BackendError> {
    let hits = body
        .get("hits")
        .ok_or_else(|| invalid_response("response has no hits section"))?;

    // ES 7+ reports {"value": n, "relation": "eq"}; older versions a bare number
    let total = match hits.get("total") {
        Some(t) => t
            .get("value")
            .and_then(|v| v.as_u64())
            .or_else(|| t.as_u64())
            .unwrap_or(0),
        None => 0,
    };

    let documents = hits
        .get("hits")
        .and_then(|h| h.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|hit| hit.get("_source").cloned())
                .collect()
        })
        .unwrap_or_default();

    Ok(BackendHits::new(total, documents))
}

/// Maps a non-success search response to a backend error.
pub fn parse_error_response(status: u16, body: &str, index: &str) -> BackendError {
    if body.contains(INDEX_NOT_FOUND) {
        return BackendError::IndexNotFound {
            index: index.to_string(),
        };
    }
    BackendError::Response {
        backend_name: BACKEND_NAME.to_string(),
        status,
        message: body.to_string(),
    }
}

/// Splits a multi-search response into one result per sub-query.
///
/// `indices` lists the index of each sub-query in request order and is used
/// to label missing-index errors.
pub fn parse_msearch_response(
    body: &Value,
    indices: &[String],
) -> Result<Vec<SubQueryResult>, BackendError> {
    let responses = body
        .get("responses")
        .and_then(|r| r.as_array())
        .ok_or_else(|| invalid_response("multi-search response has no responses array"))?;

    if responses.len() != indices.len() {
        return Err(invalid_response(format!(
            "multi-search returned {} responses for {} queries",
            responses.len(),
            indices.len()
        )));
    }

    Ok(responses
        .iter()
        .zip(indices)
        .map(|(item, index)| match item.get("error") {
            Some(error) => Err(sub_query_error(item, error, index)),
            None => parse_search_response(item),
        })
        .collect())
}

fn sub_query_error(item: &Value, error: &Value, index: &str) -> BackendError {
    let error_type = error
        .get("type")
        .and_then(|t| t.as_str())
        .or_else(|| error.as_str())
        .unwrap_or("unknown");

    if error_type == INDEX_NOT_FOUND {
        return BackendError::IndexNotFound {
            index: index.to_string(),
        };
    }

    let status = item
        .get("status")
        .and_then(|s| s.as_u64())
        .and_then(|s| u16::try_from(s).ok())
        .unwrap_or(500);
    let reason = error
        .get("reason")
        .and_then(|r| r.as_str())
        .unwrap_or(error_type);

    BackendError::Response {
        backend_name: BACKEND_NAME.to_string(),
        status,
        message: format!("{}: {}", error_type, reason),
    }
}
