//! Core domain layer for railstart.
//!
//! Pure patching logic: given file contents, decide what the patched file
//! looks like (or that it already is patched). All I/O happens behind the
//! ports in `crate::application`.
//!
//! - **No I/O**: no filesystem, process, or environment access
//! - **Idempotent by inspection**: every text mutation decides from the
//!   current contents whether there is anything left to do
//! - **Immutable values**: all domain objects are Clone + PartialEq

pub mod anchor;
pub mod dependency;
pub mod error;
pub mod flash;
pub mod mutation;
pub mod package;
pub mod patch;
pub mod recipe;
pub mod report;

mod validation;

// Re-exports for convenience
pub use anchor::{Anchor, AnchorPattern, AnchorSpan, Position, SpanKind};
pub use dependency::{
    ConstraintPolicy, Declaration, DependencyEdit, DependencySource, DependencySpec,
    append_declaration, plan_declaration,
};
pub use error::{DomainError, ErrorCategory};
pub use flash::{FlashMessage, Notification, Severity, ToastOptions};
pub use mutation::{FileTarget, GeneratorKind, GeneratorSpec, Mutation, ShellSpec};
pub use package::PackageScript;
pub use patch::{TextInsertion, TextReplacement};
pub use recipe::{FailurePolicy, Recipe, Step};
pub use report::{MutationReport, Outcome, RunReport, StepReport, StepStatus};
pub use validation::DomainValidator;
