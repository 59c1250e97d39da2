//! Explicit settings threaded through every patch operation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::ConstraintPolicy;

/// Where and how the patcher operates.
///
/// Nothing in the core reads the environment or the process working
/// directory; everything it needs arrives through this struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchConfig {
    /// Project root. All mutation paths are relative to it.
    pub root: PathBuf,
    /// Directory holding template-owned files for copy mutations.
    pub template_root: Option<PathBuf>,
    /// Dependency manifest, relative to `root`.
    pub manifest: PathBuf,
    /// Package manifest, relative to `root`.
    pub package_manifest: PathBuf,
    /// Rails executable. A bare name is looked up on `PATH`, anything with
    /// a directory component is resolved against `root`.
    pub rails_bin: PathBuf,
    pub skip_git: bool,
    pub dry_run: bool,
    pub command_timeout: Option<Duration>,
    pub constraint_policy: ConstraintPolicy,
}

impl PatchConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            template_root: None,
            manifest: PathBuf::from("Gemfile"),
            package_manifest: PathBuf::from("package.json"),
            rails_bin: PathBuf::from("bin/rails"),
            skip_git: false,
            dry_run: false,
            command_timeout: None,
            constraint_policy: ConstraintPolicy::default(),
        }
    }

    pub fn with_template_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_root = Some(dir.into());
        self
    }

    pub fn with_rails_bin(mut self, bin: impl Into<PathBuf>) -> Self {
        self.rails_bin = bin.into();
        self
    }

    pub fn skip_git(mut self, skip: bool) -> Self {
        self.skip_git = skip;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn constraint_policy(mut self, policy: ConstraintPolicy) -> Self {
        self.constraint_policy = policy;
        self
    }

    /// Absolute location of a project-relative path.
    pub fn project_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// Program string used to launch the rails executable.
    pub fn rails_program(&self) -> String {
        if self.rails_bin.components().count() > 1 && self.rails_bin.is_relative() {
            self.root.join(&self.rails_bin).display().to_string()
        } else {
            self.rails_bin.display().to_string()
        }
    }
}
