//! # Search Service Dispatch
//!
//! Keeps the external search service in step with repository changes.
//!
//! - [`cipher`]: pre-shared-key payload encryption
//! - [`IndexDispatcher`]: fire-and-forget index request per repository
//! - [`IndexRebuilder`]: full reindex over every known repository
//! - [`SearchClient`]: encrypted search queries

pub mod cipher;
pub mod dispatcher;
pub mod rebuilder;
pub mod search;

pub use cipher::{EncryptionKey, decrypt, encrypt};
pub use dispatcher::IndexDispatcher;
pub use rebuilder::{IndexRebuilder, ScheduledRebuild};
pub use search::SearchClient;
