//! Shared test fixtures for the gin sidecar workspace.
//!
//! - Repository and configuration builders
//! - [`ScriptedAnnexTool`]: an in-process annex tool that records every call
//!   and fails on demand
//! - One-time tracing setup for tests that want log output

mod fixtures;
mod scripted;

pub use fixtures::*;
pub use scripted::{AnnexOp, RecordedCall, ScriptedAnnexTool};
use std::sync::Once;
use std::sync::atomic::{AtomicU32, Ordering};

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);
static TRACING: Once = Once::new();

pub fn unique_id(prefix: &str) -> String {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}", prefix, id)
}

/// Install a test-writer subscriber once per process, honouring `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
