//! # Sync Bridge
//!
//! Keeps the annex sidecar and the search index in step with repository
//! lifecycle events.

pub mod bridge;
pub mod error;
pub mod events;

pub use bridge::SyncBridge;
pub use error::{Result, SyncError};
pub use events::{EventOutcome, RepositoryEvent};
