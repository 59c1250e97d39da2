//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the patcher needs from external systems.
//! The `railstart-adapters` crate provides implementations.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::RailstartResult;

/// Port for filesystem operations.
///
/// Implemented by:
/// - `railstart_adapters::filesystem::LocalFilesystem` (production)
/// - `railstart_adapters::filesystem::MemoryFilesystem` (testing)
///
/// Paths are absolute; the patch service resolves project-relative paths
/// against its configured root before calling in.
pub trait Filesystem: Send + Sync {
    /// Read a whole file as UTF-8.
    fn read_to_string(&self, path: &Path) -> RailstartResult<String>;

    /// Replace a file's content. Implementations write atomically where
    /// they can, so a failed write never leaves a truncated file.
    fn write_file(&self, path: &Path, content: &str) -> RailstartResult<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> RailstartResult<()>;

    /// Remove a file. Returns `false` if it did not exist.
    fn remove_file(&self, path: &Path) -> RailstartResult<bool>;

    /// Copy a file, replacing the destination. The parent must exist.
    fn copy_file(&self, from: &Path, to: &Path) -> RailstartResult<()>;

    /// Files under `dir`, sorted by path. Directories are not listed.
    fn list_files(&self, dir: &Path, recursive: bool) -> RailstartResult<Vec<PathBuf>>;
}

/// An external process to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I, cwd: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: cwd.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// How a process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
}

impl CommandStatus {
    pub fn success() -> Self {
        Self { code: Some(0) }
    }

    pub fn failure(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// A finished process with its captured output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub status: CommandStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Port for launching external processes (generators, package managers, git).
///
/// Implemented by:
/// - `railstart_adapters::process::SystemRunner` (production)
/// - `railstart_adapters::process::RecordingRunner` (testing)
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner: Send + Sync {
    /// Run to completion with inherited stdio.
    ///
    /// A non-zero exit is *not* an error here; callers decide what it means.
    fn run(&self, invocation: &Invocation) -> RailstartResult<CommandStatus>;

    /// Run to completion capturing stdout and stderr.
    fn capture(&self, invocation: &Invocation) -> RailstartResult<CapturedOutput>;
}
