//! Shared plumbing for `new` and `apply`: choosing the recipe and template
//! source, building the patch service and rendering its report.

use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use tracing::{debug, info, instrument};

use railstart_adapters::{
    LocalFilesystem, RecipeLoader, SystemRunner, TemplateCheckout, TemplateSource,
    builtin_recipe,
};
use railstart_core::{
    application::{PatchConfig, PatchService, RunObserver},
    domain::{ConstraintPolicy, Mutation, Outcome, Recipe, RunReport, Step, StepReport, StepStatus},
};

use crate::{
    cli::{OutputFormat, PatchArgs},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Environment variable naming a template directory.
pub const TEMPLATES_ENV: &str = "RAILSTART_TEMPLATES_DIR";

/// Default template directory, relative to the working directory or the
/// executable.
pub const DEFAULT_TEMPLATES: &str = "templates/jumpstart";

/// A recipe plus the template root declared next to it, if any.
pub struct SelectedRecipe {
    pub recipe: Recipe,
    pub template_root: Option<PathBuf>,
    pub builtin: bool,
}

/// The recipe given with `--recipe`, or the built-in one.
pub fn select_recipe(path: Option<&Path>) -> CliResult<SelectedRecipe> {
    match path {
        Some(path) => {
            let loaded = RecipeLoader::new().load(path)?;
            info!(recipe = %loaded.recipe.name, path = %path.display(), "Loaded recipe");
            Ok(SelectedRecipe {
                recipe: loaded.recipe,
                template_root: loaded.template_root,
                builtin: false,
            })
        }
        None => Ok(SelectedRecipe {
            recipe: builtin_recipe::jumpstart()?,
            template_root: None,
            builtin: true,
        }),
    }
}

/// Places a template directory may come from, other than flags.
#[derive(Debug, Default)]
pub struct TemplateSearch {
    pub env_dir: Option<PathBuf>,
    pub cwd: Option<PathBuf>,
    pub exe_dir: Option<PathBuf>,
}

impl TemplateSearch {
    /// Read the search locations from the process environment.
    pub fn from_env() -> Self {
        Self {
            env_dir: std::env::var_os(TEMPLATES_ENV).map(PathBuf::from),
            cwd: std::env::current_dir().ok(),
            exe_dir: std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf)),
        }
    }
}

/// Pick the template source.
///
/// Flags win, then a `templates` entry in the recipe manifest, then the
/// config file, then [`TEMPLATES_ENV`], then `./templates/jumpstart`, then
/// `templates/jumpstart` next to the executable. `Ok(None)` means nothing
/// was found; whether that is fatal depends on the recipe.
pub fn resolve_templates(
    args: &PatchArgs,
    recipe_templates: Option<&Path>,
    config: &AppConfig,
    search: &TemplateSearch,
) -> Option<TemplateSource> {
    if let Some(url) = &args.templates_git {
        return Some(TemplateSource::Git {
            url: url.clone(),
            branch: args.branch.clone(),
        });
    }
    if let Some(dir) = &args.templates {
        return Some(TemplateSource::Directory(dir.clone()));
    }
    if let Some(dir) = recipe_templates {
        return Some(TemplateSource::Directory(dir.to_path_buf()));
    }
    if let Some(url) = &config.templates.git {
        return Some(TemplateSource::Git {
            url: url.clone(),
            branch: config.templates.branch.clone(),
        });
    }
    if let Some(dir) = &config.templates.path {
        return Some(TemplateSource::Directory(dir.clone()));
    }
    if let Some(dir) = &search.env_dir {
        return Some(TemplateSource::Directory(dir.clone()));
    }

    [search.cwd.as_deref(), search.exe_dir.as_deref()]
        .into_iter()
        .flatten()
        .map(|base| base.join(DEFAULT_TEMPLATES))
        .find(|dir| dir.is_dir())
        .map(TemplateSource::Directory)
}

/// Check out the template source, if one was found.
///
/// The built-in recipe copies files, so it refuses to start without one.
pub fn checkout_templates(
    source: Option<TemplateSource>,
    builtin: bool,
    runner: &SystemRunner,
) -> CliResult<Option<TemplateCheckout>> {
    match source {
        Some(source) => {
            debug!(?source, "Template source");
            Ok(Some(source.checkout(runner)?))
        }
        None if builtin => Err(CliError::TemplatesNotFound {
            searched: format!(
                "--templates, templates.path, {TEMPLATES_ENV}, ./{DEFAULT_TEMPLATES}"
            ),
        }),
        None => Ok(None),
    }
}

/// Build the patch configuration for `root` from flags and config.
pub fn patch_config(
    root: &Path,
    template_root: Option<&Path>,
    args: &PatchArgs,
    config: &AppConfig,
) -> CliResult<PatchConfig> {
    let policy: ConstraintPolicy = config.patcher.constraint_policy.parse()?;
    let mut patch = PatchConfig::new(root)
        .with_rails_bin(&config.patcher.rails_bin)
        .skip_git(args.skip_git || config.patcher.skip_git)
        .dry_run(args.dry_run)
        .command_timeout(config.patcher.command_timeout())
        .constraint_policy(policy);
    if let Some(dir) = template_root {
        patch = patch.with_template_root(dir);
    }
    Ok(patch)
}

/// Run `recipe` against the project described by `patch`, showing progress.
#[instrument(skip_all, fields(root = %patch.root.display(), recipe = %recipe.name))]
pub fn run_recipe(
    patch: PatchConfig,
    recipe: &Recipe,
    output: &OutputManager,
) -> CliResult<RunReport> {
    let service = PatchService::new(
        patch,
        Box::new(LocalFilesystem::new()),
        Box::new(SystemRunner::new()),
    );

    let bar = output.progress(recipe.steps.len());
    let mut observer = ProgressObserver {
        bar: bar.clone(),
        output,
        echo: output.format() != OutputFormat::Json,
    };
    let result = service.run_observed(recipe, &mut observer);
    bar.finish_and_clear();
    Ok(result?)
}

/// Print the summary of a finished run.
pub fn print_report(report: &RunReport, output: &OutputManager) -> CliResult<()> {
    if output.format() == OutputFormat::Json {
        return output.json(report);
    }

    if report.dry_run {
        output.header("Planned changes:")?;
        for step in &report.steps {
            for mutation in &step.mutations {
                if mutation.outcome == Outcome::Planned {
                    output.print(&format!("  [{}] {}", step.name, mutation.mutation))?;
                }
            }
        }
    }

    // Warnings and tolerated failures were already echoed by the observer.
    let elapsed = report.finished_at - report.started_at;
    output.success(&format!(
        "{}: {} applied, {} unchanged in {:.1}s",
        report.recipe,
        report.applied_count(),
        report.unchanged_count(),
        elapsed.num_milliseconds() as f64 / 1000.0,
    ))?;
    Ok(())
}

/// Print what to do after a successful run of the built-in recipe.
pub fn print_next_steps(app_dir: Option<&str>, output: &OutputManager) -> CliResult<()> {
    if output.is_quiet() || output.format() == OutputFormat::Json {
        return Ok(());
    }
    output.print("")?;
    output.header("Next steps:")?;
    if let Some(dir) = app_dir {
        output.print(&format!("  cd {dir}"))?;
    }
    for line in builtin_recipe::NEXT_STEPS {
        output.print(&format!("  {line}"))?;
    }
    Ok(())
}

/// Drives the progress bar and echoes finished steps.
struct ProgressObserver<'a> {
    bar: ProgressBar,
    output: &'a OutputManager,
    echo: bool,
}

impl RunObserver for ProgressObserver<'_> {
    fn step_started(&mut self, index: usize, total: usize, step: &Step) {
        debug!(index, total, step = %step.name, "Step started");
        self.bar.set_message(step.name.clone());
    }

    fn mutation_finished(&mut self, mutation: &Mutation, outcome: &Outcome) {
        if let Outcome::Warned(message) = outcome {
            let output = self.output;
            self.bar.suspend(|| {
                let _ = output.warning(&format!("{mutation}: {message}"));
            });
        }
    }

    fn step_finished(&mut self, report: &StepReport) {
        self.bar.inc(1);
        if !self.echo {
            return;
        }
        let output = self.output;
        self.bar.suspend(|| {
            let _ = match &report.status {
                StepStatus::Completed => output.success(&report.name),
                StepStatus::Skipped => output.detail(&format!("- {} (skipped)", report.name)),
                StepStatus::Tolerated(message) => {
                    output.warning(&format!("{} failed: {message}", report.name))
                }
            };
            if let Some(note) = &report.note {
                let _ = output.info(note);
            }
        });
    }
}
