//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "railstart",
    bin_name = "railstart",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "\u{26a1} Bootstrap Rails applications",
    long_about = "railstart creates a Rails application and patches it into a \
                  ready-to-develop project: authentication, authorization, \
                  background jobs, notifications and a Tailwind/Bootstrap \
                  front end. Every patch is idempotent, so a project can be \
                  re-patched safely.",
    after_help = "EXAMPLES:\n\
        \x20 railstart new blog\n\
        \x20 railstart apply ./blog --skip-git\n\
        \x20 railstart plan --format json\n\
        \x20 railstart flash alert \"Bad login\"",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a Rails application and patch it.
    #[command(
        visible_alias = "n",
        about = "Create a new Rails application",
        after_help = "EXAMPLES:\n\
            \x20 railstart new blog\n\
            \x20 railstart new blog --yes --skip-git\n\
            \x20 railstart new blog --templates-git https://github.com/me/jumpstart.git"
    )]
    New(NewArgs),

    /// Patch an existing Rails application.
    #[command(
        visible_alias = "a",
        about = "Apply the recipe to an existing application",
        after_help = "EXAMPLES:\n\
            \x20 railstart apply\n\
            \x20 railstart apply ./blog --dry-run\n\
            \x20 railstart apply ./blog --recipe ./my-recipe/recipe.toml"
    )]
    Apply(ApplyArgs),

    /// Show the steps a recipe would run.
    #[command(
        about = "List recipe steps",
        after_help = "EXAMPLES:\n\
            \x20 railstart plan\n\
            \x20 railstart plan --format json"
    )]
    Plan(PlanArgs),

    /// Show which toast a flash message becomes.
    #[command(
        about = "Map a flash message to a notification",
        after_help = "EXAMPLES:\n\
            \x20 railstart flash notice \"Signed in\"\n\
            \x20 railstart flash alert \"Bad login\" --json"
    )]
    Flash(FlashArgs),

    /// Initialise a railstart configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 railstart init           # user config directory\n\
            \x20 railstart init --local   # .railstart.toml in CWD"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 railstart completions bash > ~/.local/share/bash-completion/completions/railstart\n\
            \x20 railstart completions zsh  > ~/.zfunc/_railstart\n\
            \x20 railstart completions fish > ~/.config/fish/completions/railstart.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the railstart configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 railstart config get patcher.rails_bin\n\
            \x20 railstart config list\n\
            \x20 railstart config path"
    )]
    Config(ConfigCommands),
}

// ── shared patch options ──────────────────────────────────────────────────────

/// Options shared by `new` and `apply`.
#[derive(Debug, Clone, Args)]
pub struct PatchArgs {
    /// Skip `git init` and the initial commit.
    #[arg(
        long = "skip-git",
        env = "SKIP_GIT",
        help = "Do not initialise a git repository or commit"
    )]
    pub skip_git: bool,

    /// Report what would change without touching the tree.
    #[arg(long = "dry-run", help = "Show what would change without changing it")]
    pub dry_run: bool,

    /// Recipe manifest (or a directory containing `recipe.toml`).
    #[arg(
        short = 'r',
        long = "recipe",
        value_name = "FILE",
        help = "Recipe manifest to run instead of the built-in one"
    )]
    pub recipe: Option<PathBuf>,

    /// Directory holding the template-owned files.
    #[arg(
        short = 't',
        long = "templates",
        value_name = "DIR",
        conflicts_with = "templates_git",
        help = "Template directory"
    )]
    pub templates: Option<PathBuf>,

    /// Clone the template files from a git repository.
    #[arg(
        long = "templates-git",
        value_name = "URL",
        help = "Git repository holding the template files"
    )]
    pub templates_git: Option<String>,

    /// Branch of `--templates-git` to clone.
    #[arg(
        long = "branch",
        value_name = "BRANCH",
        requires = "templates_git",
        help = "Branch to clone"
    )]
    pub branch: Option<String>,
}

// ── new ───────────────────────────────────────────────────────────────────────

/// Arguments for `railstart new`.
#[derive(Debug, Args)]
pub struct NewArgs {
    /// Application name, passed to `rails new`.
    #[arg(value_name = "NAME", help = "Application name")]
    pub name: String,

    /// Skip the confirmation prompt.
    #[arg(
        short = 'y',
        long = "yes",
        help = "Skip confirmation and create immediately"
    )]
    pub yes: bool,

    #[command(flatten)]
    pub patch: PatchArgs,
}

// ── apply ─────────────────────────────────────────────────────────────────────

/// Arguments for `railstart apply`.
#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Root of the Rails application.
    #[arg(
        value_name = "PATH",
        default_value = ".",
        help = "Application directory"
    )]
    pub path: PathBuf,

    #[command(flatten)]
    pub patch: PatchArgs,
}

// ── plan ──────────────────────────────────────────────────────────────────────

/// Arguments for `railstart plan`.
#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Recipe manifest (or a directory containing `recipe.toml`).
    #[arg(
        short = 'r',
        long = "recipe",
        value_name = "FILE",
        help = "Recipe manifest to describe instead of the built-in one"
    )]
    pub recipe: Option<PathBuf>,

    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: PlanFormat,
}

/// Output format for the `plan` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlanFormat {
    /// One row per step, mutations indented below.
    Table,
    /// JSON document.
    Json,
}

// ── flash ─────────────────────────────────────────────────────────────────────

/// Arguments for `railstart flash`.
#[derive(Debug, Args)]
pub struct FlashArgs {
    /// Flash key, e.g. `notice` or `alert`.
    #[arg(value_name = "KEY")]
    pub key: String,

    /// Flash message.
    #[arg(value_name = "MESSAGE")]
    pub message: String,

    /// Print the notification as JSON.
    #[arg(long = "json", help = "Print JSON instead of text")]
    pub json: bool,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `railstart init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Write to `.railstart.toml` in the current directory.
    #[arg(
        long = "local",
        help = "Create local configuration in current directory"
    )]
    pub local: bool,

    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `railstart completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `railstart config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `patcher.rails_bin`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the user configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_new_command() {
        let cli = Cli::parse_from(["railstart", "new", "blog", "--yes", "--skip-git"]);
        match cli.command {
            Commands::New(args) => {
                assert_eq!(args.name, "blog");
                assert!(args.yes);
                assert!(args.patch.skip_git);
                assert!(!args.patch.dry_run);
            }
            other => panic!("expected New command, got {other:?}"),
        }
    }

    #[test]
    fn apply_defaults_to_current_directory() {
        let cli = Cli::parse_from(["railstart", "apply"]);
        match cli.command {
            Commands::Apply(args) => assert_eq!(args.path, PathBuf::from(".")),
            other => panic!("expected Apply command, got {other:?}"),
        }
    }

    #[test]
    fn branch_requires_templates_git() {
        assert!(Cli::try_parse_from(["railstart", "apply", "--branch", "main"]).is_err());
        assert!(
            Cli::try_parse_from([
                "railstart",
                "apply",
                "--templates-git",
                "https://example.com/t.git",
                "--branch",
                "main",
            ])
            .is_ok()
        );
    }

    #[test]
    fn templates_and_templates_git_conflict() {
        let result = Cli::try_parse_from([
            "railstart",
            "apply",
            "--templates",
            "./t",
            "--templates-git",
            "https://example.com/t.git",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn plan_format_parses() {
        let cli = Cli::parse_from(["railstart", "plan", "--format", "json"]);
        match cli.command {
            Commands::Plan(args) => assert_eq!(args.format, PlanFormat::Json),
            other => panic!("expected Plan command, got {other:?}"),
        }
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        let result = Cli::try_parse_from(["railstart", "--quiet", "--verbose", "plan"]);
        assert!(result.is_err());
    }
}
