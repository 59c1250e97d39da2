//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "apply a mutation" or "run a recipe".

pub mod patch_service;

pub use patch_service::{PatchService, RunObserver};
