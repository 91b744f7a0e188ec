use annex::{AnnexTool, CommandResult};
use errors::AnnexCommandError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

/// Operations of [`AnnexTool`], used to script failures and query calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnexOp {
    Init,
    Upgrade,
    AddUnlocked,
    Backend,
    SizeFilter,
    Sync,
    Uninit
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub op: AnnexOp,
    pub path: PathBuf,
    /// The arguments the real tool would have been given.
    pub args: Vec<String>
}

/// In-process [`AnnexTool`] that records calls instead of running them.
///
/// Every operation succeeds unless scripted to fail with
/// [`fail`](Self::fail) or [`fail_always`](Self::fail_always).
#[derive(Debug, Default)]
pub struct ScriptedAnnexTool {
    calls: Mutex<Vec<RecordedCall>>,
    failures: Mutex<HashMap<AnnexOp, usize>>,
    delay: Option<Duration>,
    active: AtomicUsize,
    max_active: AtomicUsize
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedAnnexTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `times` calls of `op` fail.
    pub fn fail(self, op: AnnexOp, times: usize) -> Self {
        lock(&self.failures).insert(op, times);
        self
    }

    pub fn fail_always(self, op: AnnexOp) -> Self {
        self.fail(op, usize::MAX)
    }

    /// Block every call for `delay`, to widen overlap windows.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn ops(&self) -> Vec<AnnexOp> {
        lock(&self.calls).iter().map(|c| c.op).collect()
    }

    pub fn count(&self, op: AnnexOp) -> usize {
        lock(&self.calls).iter().filter(|c| c.op == op).count()
    }

    /// Highest number of calls that were running at the same time.
    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn record(&self, op: AnnexOp, path: &Path, args: Vec<String>) -> CommandResult {
        let running = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }

        let command = format!("git {}", args.join(" "));
        lock(&self.calls).push(RecordedCall {
            op,
            path: path.to_path_buf(),
            args
        });

        let fails = {
            let mut failures = lock(&self.failures);
            match failures.get_mut(&op) {
                Some(remaining) if *remaining > 0 => {
                    if *remaining != usize::MAX {
                        *remaining -= 1;
                    }
                    true
                }
                _ => false
            }
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        if fails {
            Err(AnnexCommandError {
                command,
                reason: "exit status: 1".to_string(),
                message: format!("scripted {op:?} failure")
            })
        } else {
            Ok(String::new())
        }
    }
}

fn with_args(base: &[&str], args: &[&str]) -> Vec<String> {
    base.iter().chain(args).map(|s| (*s).to_string()).collect()
}

impl AnnexTool for ScriptedAnnexTool {
    fn init(&self, path: &Path, args: &[&str]) -> CommandResult {
        self.record(AnnexOp::Init, path, with_args(&["annex", "init"], args))
    }

    fn upgrade(&self, path: &Path) -> CommandResult {
        self.record(AnnexOp::Upgrade, path, with_args(&["annex", "upgrade"], &[]))
    }

    fn set_add_unlocked(&self, path: &Path) -> CommandResult {
        self.record(
            AnnexOp::AddUnlocked,
            path,
            with_args(&["config", "annex.addunlocked", "true"], &[])
        )
    }

    fn set_backend(&self, path: &Path, backend: &str) -> CommandResult {
        self.record(
            AnnexOp::Backend,
            path,
            with_args(&["config", "annex.backends", backend], &[])
        )
    }

    fn set_size_filter(&self, path: &Path, bytes: u64) -> CommandResult {
        let filter = format!("largerthan={bytes}");
        self.record(
            AnnexOp::SizeFilter,
            path,
            with_args(&["config", "annex.largefiles", &filter], &[])
        )
    }

    fn sync(&self, path: &Path, args: &[&str]) -> CommandResult {
        self.record(AnnexOp::Sync, path, with_args(&["annex", "sync"], args))
    }

    fn uninit(&self, path: &Path) -> CommandResult {
        self.record(AnnexOp::Uninit, path, with_args(&["annex", "uninit"], &[]))
    }
}
