//! Implementation of the `railstart new` command.
//!
//! Runs `rails new NAME` with the configured arguments, then patches the
//! fresh application exactly as `railstart apply` would.

use std::path::Path;

use semver::Version;
use tracing::{debug, info, instrument, warn};

use railstart_adapters::SystemRunner;
use railstart_core::application::{ApplicationError, CommandRunner, Invocation};

use crate::{
    cli::{GlobalArgs, NewArgs},
    commands::apply,
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
    patching,
};

/// Oldest Rails release the recipe is written against.
const MINIMUM_RAILS: Version = Version::new(6, 0, 0);

/// Execute the `railstart new` command.
///
/// Dispatch sequence:
/// 1. Validate the application name and make sure the directory is free
/// 2. Confirm with the user unless `--yes`, `--quiet` or `--dry-run`
/// 3. Probe `rails --version` (warn below 6.0)
/// 4. Run `rails new`
/// 5. Apply the recipe to the new directory
/// 6. Print next-steps guidance
#[instrument(skip_all, fields(app = %args.name))]
pub fn execute(
    args: NewArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    validate_app_name(&args.name)?;

    let cwd = std::env::current_dir().with_cli_context(|| "cannot read current directory")?;
    let app_dir = cwd.join(&args.name);
    if app_dir.exists() {
        return Err(CliError::ProjectExists { path: app_dir });
    }

    let rails_new = rails_new_invocation(&args.name, &cwd, &config);

    if args.patch.dry_run {
        output.info(&format!("Dry run: would run `{rails_new}`"))?;
        output.info("Then apply the recipe; see `railstart plan` for its steps.")?;
        return Ok(());
    }

    if !global.quiet && !args.yes {
        show_configuration(&args, &rails_new, &app_dir, &output)?;
        if !output.confirm("Continue?")? {
            return Err(CliError::Cancelled);
        }
    }

    let runner = SystemRunner::new();
    preflight(&runner, &config, &cwd, &output)?;

    output.header(&format!("Creating '{}'...", args.name))?;
    info!(command = %rails_new, "Running rails new");
    let status = runner.run(&rails_new)?;
    if !status.is_success() {
        return Err(ApplicationError::ShellCommandFailed {
            command: rails_new.to_string(),
            code: status.code,
        }
        .into());
    }

    let builtin = apply::patch_project(&app_dir, &args.patch, &config, &output)?;
    output.success(&format!("Application '{}' created!", args.name))?;
    if builtin {
        patching::print_next_steps(Some(&args.name), &output)?;
    }
    Ok(())
}

fn rails_new_invocation(name: &str, cwd: &Path, config: &AppConfig) -> Invocation {
    let args = ["new".to_string(), name.to_string()]
        .into_iter()
        .chain(config.rails.new_args.iter().cloned());
    Invocation::new(&config.rails.command, args, cwd)
        .with_timeout(config.patcher.command_timeout())
}

// ── Preflight ─────────────────────────────────────────────────────────────────

/// Check that Rails is installed and recent enough.
///
/// Old versions only produce a warning; a missing `rails` is an error.
fn preflight(
    runner: &dyn CommandRunner,
    config: &AppConfig,
    cwd: &Path,
    output: &OutputManager,
) -> CliResult<()> {
    let probe = Invocation::new(&config.rails.command, ["--version"], cwd)
        .with_timeout(config.patcher.command_timeout());
    let captured = runner.capture(&probe)?;
    if !captured.status.is_success() {
        return Err(ApplicationError::ShellCommandFailed {
            command: probe.to_string(),
            code: captured.status.code,
        }
        .into());
    }

    match parse_rails_version(&captured.stdout) {
        Some(version) if version < MINIMUM_RAILS => {
            warn!(%version, "Rails is older than 6.0");
            output.warning(&format!(
                "Rails {version} detected; this recipe expects Rails {MINIMUM_RAILS} or newer"
            ))?;
        }
        Some(version) => debug!(%version, "Rails version ok"),
        None => {
            warn!(stdout = %captured.stdout.trim(), "Could not parse Rails version");
            output.warning("Could not determine the installed Rails version")?;
        }
    }
    Ok(())
}

/// Parse `rails --version` output such as `Rails 7.1.3` or `Rails 7.2.0.beta1`.
fn parse_rails_version(stdout: &str) -> Option<Version> {
    let raw = stdout.split_whitespace().find(|w| {
        w.chars().next().is_some_and(|c| c.is_ascii_digit())
    })?;

    let mut parts = raw.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    let patch = parts
        .next()
        .map_or(Some(0), |p| {
            p.chars()
                .take_while(char::is_ascii_digit)
                .collect::<String>()
                .parse()
                .ok()
        })?;
    Some(Version::new(major, minor, patch))
}

// ── Validation ────────────────────────────────────────────────────────────────

fn validate_app_name(name: &str) -> CliResult<()> {
    let invalid = |reason: &str| {
        Err(CliError::InvalidProjectName {
            name: name.into(),
            reason: reason.into(),
        })
    };

    let Some(first) = name.chars().next() else {
        return invalid("name cannot be empty");
    };
    if name.contains('/') || name.contains('\\') {
        return invalid("name cannot contain path separators");
    }
    if !first.is_ascii_alphabetic() {
        return invalid("name must start with a letter");
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return invalid(&format!("'{bad}' is not allowed"));
    }
    Ok(())
}

// ── UI helpers ────────────────────────────────────────────────────────────────

fn show_configuration(
    args: &NewArgs,
    rails_new: &Invocation,
    app_dir: &Path,
    out: &OutputManager,
) -> CliResult<()> {
    out.header("Configuration")?;
    out.print(&format!("  Application:  {}", args.name))?;
    out.print(&format!("  Location:     {}", app_dir.display()))?;
    out.print(&format!("  Command:      {rails_new}"))?;
    out.print(&format!(
        "  Recipe:       {}",
        args.patch
            .recipe
            .as_ref()
            .map_or_else(|| "built-in".to_string(), |p| p.display().to_string())
    ))?;
    out.print(&format!(
        "  Git:          {}",
        if args.patch.skip_git { "skipped" } else { "init + commit" }
    ))?;
    out.print("")?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
