//! Permission remediation after a failed `uninit`.
//!
//! Annexed content is stored read-only, which blocks recursive deletion of
//! the repository. The walk below makes the tree writable again.

use errors::AnnexError;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{error, trace};
use walkdir::WalkDir;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemediationReport {
    pub files: usize,
    pub directories: usize,
    /// One entry per path that could not be visited or changed.
    pub failures: Vec<RemediationFailure>
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediationFailure {
    pub path: String,
    pub reason: String
}

impl RemediationFailure {
    pub fn into_error(self) -> AnnexError {
        AnnexError::PermissionRemediation {
            path: self.path,
            reason: self.reason
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Modes {
    file: u32,
    dir: u32
}

impl RemediationReport {
    fn record_failure(&mut self, path: &Path, reason: impl ToString) {
        let path = path.display().to_string();
        let reason = reason.to_string();
        error!(path = %path, error = %reason, "Failed to change permissions");
        self.failures.push(RemediationFailure { path, reason });
    }
}

/// Set `file_mode` on every regular file and `dir_mode` on every directory
/// under `root`, `root` included.
///
/// Symlinks are neither followed nor changed. A failure on one path is
/// recorded and the walk moves on.
pub fn remediate_permissions(root: &Path, file_mode: u32, dir_mode: u32) -> RemediationReport {
    remediate_with(root, file_mode, dir_mode, set_mode)
}

pub(crate) fn remediate_with(
    root: &Path,
    file_mode: u32,
    dir_mode: u32,
    mut chmod: impl FnMut(&Path, u32) -> io::Result<()>
) -> RemediationReport {
    let modes = Modes {
        file: file_mode,
        dir: dir_mode
    };
    let mut report = RemediationReport::default();

    match fs::symlink_metadata(root) {
        Ok(meta) if meta.is_dir() => {
            // A directory is changed before it is read, so an unreadable
            // root still gets walked.
            apply(&mut report, &mut chmod, root, modes.dir, true);
            walk(&mut report, &mut chmod, root, modes);
        }
        Ok(meta) if meta.is_file() => {
            apply(&mut report, &mut chmod, root, modes.file, false);
        }
        Ok(_) => trace!(path = %root.display(), "Not a file or directory, skipping"),
        Err(e) => report.record_failure(root, e)
    }

    report
}

fn walk(
    report: &mut RemediationReport,
    chmod: &mut impl FnMut(&Path, u32) -> io::Result<()>,
    dir: &Path,
    modes: Modes
) {
    for entry in WalkDir::new(dir).min_depth(1) {
        match entry {
            Ok(entry) => {
                let file_type = entry.file_type();
                if file_type.is_dir() {
                    apply(report, chmod, entry.path(), modes.dir, true);
                } else if file_type.is_file() {
                    apply(report, chmod, entry.path(), modes.file, false);
                }
            }
            Err(e) => {
                // walkdir opens a directory before yielding it. When that
                // fails, change the directory and walk it on its own.
                let Some(path) = e.path().map(Path::to_path_buf) else {
                    report.record_failure(dir, e);
                    continue;
                };
                let is_dir = fs::symlink_metadata(&path).is_ok_and(|m| m.is_dir());
                if is_dir && path != dir && apply(report, chmod, &path, modes.dir, true) {
                    walk(report, chmod, &path, modes);
                } else {
                    report.record_failure(&path, e);
                }
            }
        }
    }
}

fn apply(
    report: &mut RemediationReport,
    chmod: &mut impl FnMut(&Path, u32) -> io::Result<()>,
    path: &Path,
    mode: u32,
    is_dir: bool
) -> bool {
    match chmod(path, mode) {
        Ok(()) => {
            if is_dir {
                report.directories += 1;
            } else {
                report.files += 1;
            }
            true
        }
        Err(e) => {
            report.record_failure(path, e);
            false
        }
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_readonly(mode & 0o200 == 0);
    fs::set_permissions(path, permissions)
}
