//! One module per subcommand. Each exposes an `execute` entry point.

pub mod apply;
pub mod completions;
pub mod config;
pub mod flash;
pub mod init;
pub mod new;
pub mod plan;
