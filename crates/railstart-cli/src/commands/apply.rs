//! Implementation of the `railstart apply` command.
//!
//! Patches an existing Rails application in place. Safe to repeat: a second
//! run only re-runs the commands.

use std::path::Path;

use tracing::{info, instrument};

use railstart_adapters::SystemRunner;

use crate::{
    cli::{ApplyArgs, PatchArgs},
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
    patching::{self, TemplateSearch},
};

/// Execute the `railstart apply` command.
#[instrument(skip_all, fields(path = %args.path.display()))]
pub fn execute(args: ApplyArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    if !args.path.is_dir() {
        return Err(CliError::ProjectNotFound { path: args.path });
    }
    let root = std::fs::canonicalize(&args.path)
        .with_cli_context(|| format!("cannot resolve {}", args.path.display()))?;

    let builtin = patch_project(&root, &args.patch, &config, &output)?;
    if builtin && !args.patch.dry_run {
        patching::print_next_steps(None, &output)?;
    }
    Ok(())
}

/// Run the selected recipe against `root` and print the report.
///
/// Returns whether the built-in recipe was used.
pub fn patch_project(
    root: &Path,
    patch: &PatchArgs,
    config: &AppConfig,
    output: &OutputManager,
) -> CliResult<bool> {
    let selected = patching::select_recipe(patch.recipe.as_deref())?;
    let source = patching::resolve_templates(
        patch,
        selected.template_root.as_deref(),
        config,
        &TemplateSearch::from_env(),
    );
    let checkout = patching::checkout_templates(source, selected.builtin, &SystemRunner::new())?;
    let template_root = checkout.as_ref().map(|c| c.root());

    let patch_config = patching::patch_config(root, template_root, patch, config)?;
    info!(
        root = %root.display(),
        recipe = %selected.recipe.name,
        dry_run = patch_config.dry_run,
        skip_git = patch_config.skip_git,
        "Applying recipe"
    );

    if patch_config.dry_run {
        output.info(&format!(
            "Dry run: nothing under {} will change",
            root.display()
        ))?;
    } else {
        output.header(&format!(
            "Applying '{}' to {}",
            selected.recipe.name,
            root.display()
        ))?;
    }

    let report = patching::run_recipe(patch_config, &selected.recipe, output)?;
    patching::print_report(&report, output)?;
    Ok(selected.builtin)
}
