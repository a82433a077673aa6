//! Error types for search orchestration.
//!
//! Backend failures are kept in their own enum so the executors can tell the
//! expected "index not found" state apart from every other failure before
//! anything reaches the caller.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The error type for all search operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The requested operation exists in the API but has no implementation.
    #[error("{operation} is not implemented")]
    NotImplemented { operation: String },

    /// A pagination parameter could not be interpreted.
    #[error("invalid pagination parameter {parameter}={value}: {message}")]
    InvalidPagination {
        parameter: String,
        value: String,
        message: String,
    },

    /// The request parameters could not be compiled into a backend query.
    #[error("failed to compile search query: {message}")]
    QueryCompilation { message: String },

    /// An _include or _revinclude directive is malformed.
    #[error("invalid include directive '{value}': {message}")]
    InvalidInclude { value: String, message: String },
}

/// Errors raised by a search backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The index backing a collection does not exist yet.
    #[error("index not found: {index}")]
    IndexNotFound { index: String },

    /// Failed to set up a client for the backend.
    #[error("connection to {backend_name} failed: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// The request could not be sent or no response arrived.
    #[error("{backend_name} request failed: {message}")]
    Request {
        backend_name: String,
        message: String,
    },

    /// The backend answered with an error status.
    #[error("{backend_name} returned status {status}: {message}")]
    Response {
        backend_name: String,
        status: u16,
        message: String,
    },

    /// The backend answered with a body that could not be interpreted.
    #[error("invalid response from {backend_name}: {message}")]
    InvalidResponse {
        backend_name: String,
        message: String,
    },

    /// The backend is reachable but not healthy.
    #[error("{backend_name} unavailable: {message}")]
    Unavailable {
        backend_name: String,
        message: String,
    },
}

impl BackendError {
    /// Returns true if this error only means the target index was never created.
    pub fn is_index_not_found(&self) -> bool {
        matches!(self, BackendError::IndexNotFound { .. })
    }
}

impl SearchError {
    /// Creates a not-implemented error for the named operation.
    pub fn not_implemented(operation: impl Into<String>) -> Self {
        SearchError::NotImplemented {
            operation: operation.into(),
        }
    }

    /// Returns true if this is a client-side error (bad request input).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SearchError::InvalidPagination { .. }
                | SearchError::InvalidInclude { .. }
                | SearchError::QueryCompilation { .. }
        )
    }
}

/// Result type alias for search operations.
pub type SearchResult<T> = Result<T, SearchError>;
