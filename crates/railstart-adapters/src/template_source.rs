//! Where template-owned files come from.
//!
//! Either a local directory, or a git repository cloned into a temporary
//! directory that is removed when the checkout is dropped.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{info, instrument};

use railstart_core::{
    application::{
        ApplicationError,
        ports::{CommandRunner, Invocation},
    },
    error::{RailstartError, RailstartResult},
};

/// Directory inside a cloned repository that holds the jumpstart files.
pub const REPOSITORY_SUBDIR: &str = "templates/jumpstart";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Directory(PathBuf),
    Git { url: String, branch: Option<String> },
}

/// A usable template root. Holds the clone alive for git sources.
#[derive(Debug)]
pub struct TemplateCheckout {
    root: PathBuf,
    _clone: Option<TempDir>,
}

impl TemplateCheckout {
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TemplateSource {
    /// Make the templates available on disk.
    ///
    /// Local directories must exist. Git sources are cloned with the given
    /// runner; if the repository has a `templates/jumpstart` directory, that
    /// becomes the root, otherwise the repository root does.
    #[instrument(skip(runner))]
    pub fn checkout(&self, runner: &dyn CommandRunner) -> RailstartResult<TemplateCheckout> {
        match self {
            Self::Directory(dir) => {
                if !dir.is_dir() {
                    return Err(ApplicationError::SourceMissing { path: dir.clone() }.into());
                }
                Ok(TemplateCheckout {
                    root: dir.clone(),
                    _clone: None,
                })
            }
            Self::Git { url, branch } => {
                let clone = tempfile::Builder::new()
                    .prefix("railstart-")
                    .tempdir()
                    .map_err(|e| RailstartError::Internal {
                        message: format!("cannot create temporary directory: {e}"),
                    })?;

                let invocation = clone_invocation(url, branch.as_deref(), clone.path());
                info!(command = %invocation, "Cloning templates");
                let status = runner.run(&invocation)?;
                if !status.is_success() {
                    return Err(ApplicationError::ShellCommandFailed {
                        command: invocation.to_string(),
                        code: status.code,
                    }
                    .into());
                }

                let nested = clone.path().join(REPOSITORY_SUBDIR);
                let root = if nested.is_dir() {
                    nested
                } else {
                    clone.path().to_path_buf()
                };
                Ok(TemplateCheckout {
                    root,
                    _clone: Some(clone),
                })
            }
        }
    }
}

fn clone_invocation(url: &str, branch: Option<&str>, into: &Path) -> Invocation {
    let mut args = vec!["clone".to_string(), "--quiet".to_string(), "--depth=1".to_string()];
    if let Some(branch) = branch {
        args.push("--branch".into());
        args.push(branch.into());
    }
    args.push(url.into());
    args.push(into.display().to_string());

    let cwd = into.parent().unwrap_or(into);
    Invocation::new("git", args, cwd)
}
