//! Application layer errors.
//!
//! These errors represent failures while touching the outside world (files,
//! processes), not patch logic. Patch logic errors are `DomainError` from
//! `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur while applying mutations.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// The dependency or package manifest could not be read or parsed.
    #[error("Cannot read manifest {path}: {reason}")]
    ManifestUnreadable { path: PathBuf, reason: String },

    /// A template-owned file or directory to copy does not exist.
    #[error("Template source missing: {path}")]
    SourceMissing { path: PathBuf },

    /// No template root was configured but a copy was requested.
    #[error("No template directory configured for copying {path}")]
    TemplateRootNotConfigured { path: PathBuf },

    /// A dynamic file target (newest migration, glob) matched nothing.
    #[error("No file matches {target}")]
    TargetNotResolved { target: String },

    /// A framework generator exited unsuccessfully.
    #[error("Generator `{generator}` failed with {}", exit_label(.code))]
    GeneratorFailed {
        generator: String,
        code: Option<i32>,
    },

    /// An external command exited unsuccessfully.
    #[error("Command `{command}` failed with {}", exit_label(.code))]
    ShellCommandFailed { command: String, code: Option<i32> },

    /// An external program could not be started at all.
    #[error("Cannot start `{program}`: {reason}")]
    CommandUnavailable { program: String, reason: String },

    /// An external command ran past the configured timeout and was killed.
    #[error("Command `{command}` timed out after {seconds}s")]
    CommandTimedOut { command: String, seconds: u64 },

    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// An adapter's internal lock was poisoned.
    #[error("Adapter state lock poisoned")]
    LockPoisoned,
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ManifestUnreadable { path, .. } => vec![
                format!("Check that {} exists and is readable", path.display()),
                "Run railstart from the root of a freshly generated Rails app".into(),
            ],
            Self::SourceMissing { path } => vec![
                format!("Template file not found: {}", path.display()),
                "Point --templates at a complete template directory".into(),
            ],
            Self::TemplateRootNotConfigured { .. } => vec![
                "Pass --templates DIR or set templates.path in the config file".into(),
            ],
            Self::GeneratorFailed { generator, .. } => vec![
                format!("`{}` did not succeed; its output is shown above", generator),
                "Make sure `bundle install` completed and the gem is in the Gemfile".into(),
            ],
            Self::ShellCommandFailed { command, .. } => vec![
                format!("`{}` did not succeed; its output is shown above", command),
                "Check that the tool is installed and in your PATH".into(),
            ],
            Self::CommandUnavailable { program, .. } => vec![
                format!("Install `{}` or add it to your PATH", program),
            ],
            Self::CommandTimedOut { .. } => vec![
                "Raise patcher.command_timeout_secs or unset it".into(),
            ],
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
            ],
            _ => vec!["Check the error details above".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ManifestUnreadable { .. }
            | Self::SourceMissing { .. }
            | Self::TargetNotResolved { .. } => ErrorCategory::NotFound,
            Self::TemplateRootNotConfigured { .. } => ErrorCategory::Configuration,
            Self::GeneratorFailed { .. }
            | Self::ShellCommandFailed { .. }
            | Self::CommandUnavailable { .. }
            | Self::CommandTimedOut { .. } => ErrorCategory::ExternalCommand,
            Self::FilesystemError { .. } | Self::LockPoisoned => ErrorCategory::Internal,
        }
    }
}
