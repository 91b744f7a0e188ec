use crate::permissions::{RemediationReport, remediate_permissions};
use crate::tool::{AnnexTool, CommandResult, GitAnnex};
use config::AnnexConfig;
use errors::{AnnexCommandError, AnnexError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Repository layout version passed to `git annex init`.
pub const ANNEX_VERSION: &str = "7";

/// Content hashing backend configured on every repository.
pub const DEFAULT_BACKEND: &str = "MD5";

/// Total sync attempts: the first run plus one blind retry.
pub const SYNC_ATTEMPTS: u32 = 2;

/// One step of [`AnnexLifecycle::setup`], in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetupStep {
    Init,
    Upgrade,
    AddUnlocked,
    Backend,
    SizeFilter
}

impl SetupStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Upgrade => "upgrade",
            Self::AddUnlocked => "addunlocked",
            Self::Backend => "backend",
            Self::SizeFilter => "size_filter"
        }
    }
}

impl fmt::Display for SetupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub step: SetupStep,
    pub error: AnnexCommandError
}

/// What a completed [`AnnexLifecycle::setup`] run did.
///
/// Setup only fails outright when `init` fails. Every later step is
/// attempted regardless, and its failure lands here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupReport {
    pub path: PathBuf,
    pub completed: Vec<SetupStep>,
    pub failures: Vec<StepFailure>
}

impl SetupReport {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            completed: Vec::new(),
            failures: Vec::new()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// The failures as typed errors, for callers that propagate them.
    pub fn errors(&self) -> Vec<AnnexError> {
        self.failures
            .iter()
            .map(|f| AnnexError::StepFailed {
                step: f.step.to_string(),
                path: self.path.display().to_string(),
                source: f.error.clone()
            })
            .collect()
    }
}

/// What [`AnnexLifecycle::teardown`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownReport {
    pub path: PathBuf,
    /// Set when `uninit` failed. The repository may still be deleted.
    pub uninit_error: Option<AnnexCommandError>,
    /// Present only when `uninit` failed and the permission walk ran.
    pub remediation: Option<RemediationReport>
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.uninit_error.is_none()
    }
}

/// Drives the annex sidecar of a repository through setup, sync and
/// teardown.
///
/// Stateless apart from its configuration; every call reads the current
/// state from disk through the tool.
#[derive(Clone)]
pub struct AnnexLifecycle {
    tool: Arc<dyn AnnexTool>,
    min_size_bytes: u64,
    file_mode: u32,
    dir_mode: u32
}

impl fmt::Debug for AnnexLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnexLifecycle")
            .field("min_size_bytes", &self.min_size_bytes)
            .field("file_mode", &format_args!("{:o}", self.file_mode))
            .field("dir_mode", &format_args!("{:o}", self.dir_mode))
            .finish_non_exhaustive()
    }
}

impl AnnexLifecycle {
    pub fn new(tool: Arc<dyn AnnexTool>, config: &AnnexConfig) -> Self {
        Self {
            tool,
            min_size_bytes: config.min_size_bytes(),
            file_mode: config.file_mode,
            dir_mode: config.dir_mode
        }
    }

    /// Lifecycle backed by the configured `git` binary.
    pub fn from_config(config: &AnnexConfig) -> Self {
        Self::new(Arc::new(GitAnnex::new(config.binary.clone())), config)
    }

    pub fn min_size_bytes(&self) -> u64 {
        self.min_size_bytes
    }

    /// Initialize and configure the annex sidecar at `path`.
    ///
    /// Runs, in order: `init --version=7`, `upgrade`, unlocked mode, the MD5
    /// backend and the size filter. Safe to run again on a repository that
    /// is already set up.
    pub fn setup(&self, path: &Path) -> Result<SetupReport, AnnexError> {
        info!(
            path = %path.display(),
            min_size_bytes = self.min_size_bytes,
            "Running annex setup (with filesize filter)"
        );

        let version = format!("--version={ANNEX_VERSION}");
        if let Err(e) = self.tool.init(path, &[&version]) {
            error!(path = %path.display(), error = %e, "Annex init failed");
            step_failed(SetupStep::Init);
            return Err(AnnexError::InitFailed {
                path: path.display().to_string(),
                source: e
            });
        }

        let mut report = SetupReport::new(path);
        report.completed.push(SetupStep::Init);

        self.run_step(&mut report, SetupStep::Upgrade, || self.tool.upgrade(path));
        self.run_step(&mut report, SetupStep::AddUnlocked, || {
            self.tool.set_add_unlocked(path)
        });
        self.run_step(&mut report, SetupStep::Backend, || {
            self.tool.set_backend(path, DEFAULT_BACKEND)
        });
        self.run_step(&mut report, SetupStep::SizeFilter, || {
            self.tool.set_size_filter(path, self.min_size_bytes)
        });

        if report.is_complete() {
            debug!(path = %path.display(), "Annex setup complete");
        } else {
            warn!(
                path = %path.display(),
                failed = report.failures.len(),
                "Annex setup finished with failed steps"
            );
        }
        Ok(report)
    }

    fn run_step(
        &self,
        report: &mut SetupReport,
        step: SetupStep,
        run: impl FnOnce() -> CommandResult
    ) {
        match run() {
            Ok(_) => report.completed.push(step),
            Err(e) => {
                error!(step = %step, path = %report.path.display(), error = %e, "Annex setup step failed");
                step_failed(step);
                report.failures.push(StepFailure { step, error: e });
            }
        }
    }

    /// Synchronize annexed content at `path`.
    ///
    /// A failed sync is retried once, blindly: the same command, with no
    /// delay and no inspection of the error. The error of the second
    /// attempt is the one returned.
    pub fn sync(&self, path: &Path) -> Result<(), AnnexError> {
        trace!(path = %path.display(), "Synchronizing annex content");

        let mut attempt = 1;
        loop {
            match self.tool.sync(path, &["--content"]) {
                Ok(_) => return Ok(()),
                Err(e) if attempt < SYNC_ATTEMPTS => {
                    warn!(path = %path.display(), attempt, error = %e, "Annex sync failed, retrying");
                    attempt += 1;
                }
                Err(e) => {
                    error!(path = %path.display(), attempt, error = %e, "Annex sync failed");
                    step_failed_label("sync");
                    return Err(AnnexError::SyncFailed {
                        path: path.display().to_string(),
                        source: e
                    });
                }
            }
        }
    }

    /// Remove the annex sidecar at `path` ahead of repository deletion.
    ///
    /// When `uninit` fails, every file and directory under `path` is made
    /// owner and group writable so the subsequent delete can proceed.
    /// Nothing here fails the caller: problems are logged and reported.
    pub fn teardown(&self, path: &Path) -> TeardownReport {
        trace!(path = %path.display(), "Uninit annex");

        match self.tool.uninit(path) {
            Ok(_) => TeardownReport {
                path: path.to_path_buf(),
                uninit_error: None,
                remediation: None
            },
            Err(e) => {
                error!(path = %path.display(), error = %e, "Annex uninit failed");
                step_failed_label("uninit");

                let remediation = remediate_permissions(path, self.file_mode, self.dir_mode);
                if !remediation.failures.is_empty() {
                    warn!(
                        path = %path.display(),
                        failed = remediation.failures.len(),
                        "Some permissions could not be changed"
                    );
                }
                TeardownReport {
                    path: path.to_path_buf(),
                    uninit_error: Some(e),
                    remediation: Some(remediation)
                }
            }
        }
    }
}

fn step_failed(step: SetupStep) {
    step_failed_label(step.as_str());
}

fn step_failed_label(step: &'static str) {
    metrics::counter!("gin_annex_step_failures_total", "step" => step).increment(1);
}
