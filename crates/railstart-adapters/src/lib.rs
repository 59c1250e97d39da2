//! Infrastructure adapters for railstart.
//!
//! This crate implements the ports defined in `railstart-core::application::ports`.
//! It contains all external dependencies and I/O operations, plus the
//! recipes the CLI ships with.

pub mod builtin_recipe;
pub mod filesystem;
pub mod process;
pub mod recipe_loader;
pub mod template_source;

// Re-export commonly used adapters
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use process::{RecordingRunner, SystemRunner};
pub use recipe_loader::{LoadedRecipe, RecipeLoader};
pub use template_source::{TemplateCheckout, TemplateSource};
