//! Helios FHIR Server Search
//!
//! This crate resolves a FHIR type-level search into a complete, paginated
//! searchset against a document-indexed backend, then expands the result
//! with the resources named by `_include` and `_revinclude`, following
//! `:iterate` directives transitively up to a bounded depth.
//!
//! # Features
//!
//! - **Missing-index tolerance**: a resource type that was never written
//!   searches as an empty result rather than an error
//! - **Batched inclusion**: every inclusion pass is a single multi-search
//! - **Bounded `:iterate`**: breadth-first, duplicate-free, cycle-safe
//! - **Offset paging**: previous/next links rebuilt from the request
//!
//! Available backend features:
//! - `elasticsearch` (default) - Elasticsearch via the official client
//!
//! # Architecture
//!
//! - [`types`] - Requests, entries, bundles, and backend queries
//! - [`error`] - Error types for all operations
//! - [`config`] - Limits and the injected filter/clean-up policy
//! - [`backends`] - The [`SearchBackend`](backends::SearchBackend) trait and implementations
//! - [`collaborators`] - Query compilation and inclusion derivation
//! - [`core`] - Executors, pagination, inclusion, and orchestration
//!
//! # Quick Start
//!
//! ```
//! use helios_search::types::SearchRequest;
//!
//! let request = SearchRequest::new("Patient")
//!     .with_base_url("http://localhost:8080/fhir")
//!     .with_param("family", "Smith")
//!     .with_param("_include", "Patient:organization")
//!     .with_param("_include:iterate", "Organization:partof")
//!     .with_allowed_types(["Organization"]);
//!
//! assert!(request.has_iterate_params());
//! assert!(request.is_type_allowed("organization"));
//! assert!(!request.is_type_allowed("Practitioner"));
//! ```
//!
//! # Pagination
//!
//! ```
//! use helios_search::config::SearchConfig;
//! use helios_search::core::{PageWindow, plan_links};
//! use helios_search::types::SearchRequest;
//!
//! let request = SearchRequest::new("Patient")
//!     .with_base_url("http://localhost:8080/fhir")
//!     .with_param("_getpagesoffset", "10")
//!     .with_param("_count", "10");
//!
//! let window = PageWindow::from_request(&request, &SearchConfig::default()).unwrap();
//! let links = plan_links(&request, &window, 25);
//! assert_eq!(
//!     links.next.as_deref(),
//!     Some("http://localhost:8080/fhir/Patient?_getpagesoffset=20&_count=10")
//! );
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod collaborators;
pub mod config;
pub mod core;
pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use config::{SearchConfig, SearchPolicy};
pub use error::{BackendError, SearchError, SearchResult};
pub use types::{SearchBundle, SearchEntry, SearchMode, SearchRequest};

// Re-export the entry point and backend trait
pub use backends::SearchBackend;
pub use core::SearchOrchestrator;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
