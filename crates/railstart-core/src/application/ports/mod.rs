//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `railstart-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `Filesystem`: File operations on the project and template trees
//!   - `CommandRunner`: Generators, package managers, version control
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (Defined in CLI layer, implemented by services)

pub mod output;

pub use output::{CapturedOutput, CommandRunner, CommandStatus, Filesystem, Invocation};

#[cfg(test)]
pub use output::MockCommandRunner;
