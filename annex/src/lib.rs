//! # Annex Sidecar Lifecycle
//!
//! Brings a repository's git-annex sidecar into a known configuration and
//! keeps its content synchronized.
//!
//! The sidecar's state lives entirely in its own on-disk metadata. Nothing
//! here tracks it: every operation is written so that re-running it on an
//! already configured repository is harmless.
//!
//! All operations block on external processes. Async callers run them on a
//! blocking worker, and must not run two of them on the same path at once.

pub mod lifecycle;
pub mod permissions;
pub mod tool;

pub use lifecycle::{
    ANNEX_VERSION, AnnexLifecycle, DEFAULT_BACKEND, SYNC_ATTEMPTS, SetupReport, SetupStep,
    StepFailure, TeardownReport
};
pub use permissions::{RemediationFailure, RemediationReport, remediate_permissions};
pub use tool::{AnnexTool, CommandResult, GitAnnex};
