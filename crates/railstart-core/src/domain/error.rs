// ============================================================================
// domain/error.rs - PATCH DOMAIN ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (reports keep a copy of tolerated failures)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Anchor Errors
    // ========================================================================
    #[error("Anchor {anchor} not found in {file}")]
    AnchorNotFound { file: String, anchor: String },

    #[error("Anchor {anchor} matches {count} locations in {file} (lines {lines:?})")]
    AmbiguousAnchor {
        file: String,
        anchor: String,
        count: usize,
        lines: Vec<usize>,
    },

    #[error("Invalid anchor pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    // ========================================================================
    // Manifest Errors
    // ========================================================================
    #[error(
        "Dependency '{name}' is declared with {declared} but {requested} was requested"
    )]
    ConstraintMismatch {
        name: String,
        declared: String,
        requested: String,
    },

    #[error("Invalid dependency name '{name}': {reason}")]
    InvalidDependency { name: String, reason: String },

    #[error("Malformed package manifest: {reason}")]
    MalformedPackageManifest { reason: String },

    // ========================================================================
    // Recipe Errors
    // ========================================================================
    #[error("Invalid recipe: {0}")]
    InvalidRecipe(String),

    #[error("Duplicate step name in recipe: {name}")]
    DuplicateStep { name: String },

    #[error("Absolute paths not allowed: {path}")]
    AbsolutePathNotAllowed { path: String },

    #[error("Path leaves the project root: {path}")]
    PathOutsideRoot { path: String },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::AnchorNotFound { file, anchor } => vec![
                format!("{} no longer contains {}", file, anchor),
                "The framework generator output may have changed".into(),
                "Start again from a freshly generated project".into(),
            ],
            Self::AmbiguousAnchor { file, lines, .. } => vec![
                format!("The anchor matches several lines of {}: {:?}", file, lines),
                "Use a more specific anchor so exactly one line matches".into(),
            ],
            Self::ConstraintMismatch { name, .. } => vec![
                format!("Edit the declaration of '{}' in the Gemfile by hand", name),
                "Or set patcher.constraint_policy = \"warn\" to continue".into(),
            ],
            Self::InvalidPattern { .. } => vec![
                "Check the regular expression syntax in the recipe".into(),
            ],
            Self::InvalidRecipe(msg) | Self::MalformedPackageManifest { reason: msg } => vec![
                format!("Details: {}", msg),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AnchorNotFound { .. } => ErrorCategory::NotFound,
            Self::AmbiguousAnchor { .. } | Self::ConstraintMismatch { .. } => {
                ErrorCategory::Conflict
            }
            Self::InvalidPattern { .. }
            | Self::InvalidDependency { .. }
            | Self::InvalidRecipe(_)
            | Self::DuplicateStep { .. }
            | Self::AbsolutePathNotAllowed { .. }
            | Self::PathOutsideRoot { .. } => ErrorCategory::Validation,
            Self::MalformedPackageManifest { .. } => ErrorCategory::Internal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    NotFound,
    Internal,
}
