//! Application layer for railstart.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (PatchService)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Config**: Explicit settings for a patch run
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! patching rules itself. Those live in `crate::domain`.

pub mod config;
pub mod error;
pub mod ports;
pub mod services;

pub use config::PatchConfig;
pub use error::ApplicationError;
pub use ports::{CapturedOutput, CommandRunner, CommandStatus, Filesystem, Invocation};
pub use services::{PatchService, RunObserver};
