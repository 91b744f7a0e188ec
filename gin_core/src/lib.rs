//! # Repository Sidecar Core
//!
//! Shared types and traits for the search-indexing and annex subsystems.
//!
//! This crate provides:
//! - The read-only [`Repository`] view the sidecar subsystems work from
//! - Wire types for the search service ([`IndexRequest`], [`search`])
//! - The [`RepositoryStore`] seam plus an in-memory implementation

pub mod search;
pub mod store;
pub mod traits;
pub mod types;

pub use search::{SearchKind, SearchRequest, SearchResults};
pub use store::InMemoryRepositoryStore;
pub use traits::RepositoryStore;
pub use types::{IndexRequest, Repository};
