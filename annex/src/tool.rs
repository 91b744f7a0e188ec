use errors::AnnexCommandError;
use std::path::Path;
use std::process::Command;
use tracing::trace;

/// Output of a successful invocation, or the failure with whatever the tool
/// printed.
pub type CommandResult = Result<String, AnnexCommandError>;

/// The large-file-storage command line tool, one method per operation the
/// lifecycle needs.
///
/// Every call runs against the repository at `path` and blocks until the
/// tool exits.
pub trait AnnexTool: Send + Sync {
    fn init(&self, path: &Path, args: &[&str]) -> CommandResult;

    fn upgrade(&self, path: &Path) -> CommandResult;

    /// Make newly annexed files appear as regular files instead of symlinks.
    fn set_add_unlocked(&self, path: &Path) -> CommandResult;

    fn set_backend(&self, path: &Path, backend: &str) -> CommandResult;

    /// Keep files of `bytes` or less in git instead of the annex.
    fn set_size_filter(&self, path: &Path, bytes: u64) -> CommandResult;

    fn sync(&self, path: &Path, args: &[&str]) -> CommandResult;

    fn uninit(&self, path: &Path) -> CommandResult;
}

/// [`AnnexTool`] backed by `git annex` and `git config` subprocesses.
#[derive(Debug, Clone)]
pub struct GitAnnex {
    binary: String
}

impl Default for GitAnnex {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitAnnex {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into()
        }
    }

    fn run(&self, path: &Path, args: &[&str]) -> CommandResult {
        let command = format!("{} {}", self.binary, args.join(" "));
        trace!(path = %path.display(), command = %command, "Running annex command");

        let output = Command::new(&self.binary)
            .args(args)
            .current_dir(path)
            .output()
            .map_err(|e| AnnexCommandError {
                command: command.clone(),
                reason: e.to_string(),
                message: String::new()
            })?;

        let mut message = String::from_utf8_lossy(&output.stdout).into_owned();
        message.push_str(&String::from_utf8_lossy(&output.stderr));
        let message = message.trim().to_string();

        if output.status.success() {
            Ok(message)
        } else {
            Err(AnnexCommandError {
                command,
                reason: output.status.to_string(),
                message
            })
        }
    }
}

impl AnnexTool for GitAnnex {
    fn init(&self, path: &Path, args: &[&str]) -> CommandResult {
        let mut full = vec!["annex", "init"];
        full.extend_from_slice(args);
        self.run(path, &full)
    }

    fn upgrade(&self, path: &Path) -> CommandResult {
        self.run(path, &["annex", "upgrade"])
    }

    fn set_add_unlocked(&self, path: &Path) -> CommandResult {
        self.run(path, &["config", "annex.addunlocked", "true"])
    }

    fn set_backend(&self, path: &Path, backend: &str) -> CommandResult {
        self.run(path, &["config", "annex.backends", backend])
    }

    fn set_size_filter(&self, path: &Path, bytes: u64) -> CommandResult {
        let filter = format!("largerthan={bytes}");
        self.run(path, &["config", "annex.largefiles", &filter])
    }

    fn sync(&self, path: &Path, args: &[&str]) -> CommandResult {
        let mut full = vec!["annex", "sync"];
        full.extend_from_slice(args);
        self.run(path, &full)
    }

    fn uninit(&self, path: &Path) -> CommandResult {
        self.run(path, &["annex", "uninit"])
    }
}
