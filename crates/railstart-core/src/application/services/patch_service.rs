//! Patch Service - applies mutations and runs recipes.
//!
//! Every operation re-reads the files it touches and decides from their
//! current contents whether anything is left to do. Running a recipe twice
//! therefore changes nothing the second time, apart from commands, which
//! always run.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::{
    application::{
        ApplicationError, PatchConfig,
        ports::{CommandRunner, Filesystem, Invocation},
    },
    domain::{
        DependencyEdit, DependencySpec, DomainError, DomainValidator as validator, FailurePolicy,
        FileTarget, GeneratorSpec, Mutation, MutationReport, Outcome, PackageScript, Recipe,
        RunReport, ShellSpec, Step, StepReport, StepStatus, TextInsertion, TextReplacement,
        append_declaration, plan_declaration,
    },
    error::{RailstartError, RailstartResult},
};

/// Progress callbacks for a recipe run.
///
/// All methods default to no-ops; the CLI uses them to drive a progress bar.
pub trait RunObserver {
    fn step_started(&mut self, _index: usize, _total: usize, _step: &Step) {}
    fn mutation_finished(&mut self, _mutation: &Mutation, _outcome: &Outcome) {}
    fn step_finished(&mut self, _report: &StepReport) {}
}

impl RunObserver for () {}

/// Applies mutations to the project tree at `config.root`.
pub struct PatchService {
    config: PatchConfig,
    filesystem: Box<dyn Filesystem>,
    runner: Box<dyn CommandRunner>,
}

impl PatchService {
    pub fn new(
        config: PatchConfig,
        filesystem: Box<dyn Filesystem>,
        runner: Box<dyn CommandRunner>,
    ) -> Self {
        Self {
            config,
            filesystem,
            runner,
        }
    }

    pub fn config(&self) -> &PatchConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Recipe execution
    // -------------------------------------------------------------------------

    /// Run every step of `recipe` in order.
    pub fn run(&self, recipe: &Recipe) -> RailstartResult<RunReport> {
        self.run_observed(recipe, &mut ())
    }

    /// Run `recipe`, reporting progress to `observer`.
    ///
    /// A failing step stops the run with [`RailstartError::StepFailed`]
    /// unless its policy is [`FailurePolicy::Continue`]. Steps that already
    /// ran are not undone.
    #[instrument(skip_all, fields(recipe = %recipe.name, dry_run = self.config.dry_run))]
    pub fn run_observed(
        &self,
        recipe: &Recipe,
        observer: &mut dyn RunObserver,
    ) -> RailstartResult<RunReport> {
        validator::validate_recipe(recipe)?;

        let started_at = Utc::now();
        let total = recipe.steps.len();
        let mut steps = Vec::with_capacity(total);
        info!(steps = total, "Running recipe");

        for (index, step) in recipe.steps.iter().enumerate() {
            observer.step_started(index, total, step);

            if step.vcs && self.config.skip_git {
                info!(step = %step.name, "Skipping version control step");
                let report = StepReport {
                    name: step.name.clone(),
                    status: StepStatus::Skipped,
                    mutations: Vec::new(),
                    note: None,
                };
                observer.step_finished(&report);
                steps.push(report);
                continue;
            }

            let mut mutations = Vec::with_capacity(step.mutations.len());
            let status = match self.run_step(step, &mut mutations, observer) {
                Ok(()) => StepStatus::Completed,
                Err(err) if step.on_failure == FailurePolicy::Continue => {
                    warn!(step = %step.name, error = %err, "Step failed, continuing");
                    StepStatus::Tolerated(err.to_string())
                }
                Err(err) => {
                    return Err(RailstartError::StepFailed {
                        step: step.name.clone(),
                        source: Box::new(err),
                    });
                }
            };

            let report = StepReport {
                name: step.name.clone(),
                note: match status {
                    StepStatus::Completed => step.note.clone(),
                    _ => None,
                },
                status,
                mutations,
            };
            observer.step_finished(&report);
            steps.push(report);
        }

        let report = RunReport {
            recipe: recipe.name.clone(),
            started_at,
            finished_at: Utc::now(),
            dry_run: self.config.dry_run,
            steps,
        };
        info!(
            applied = report.applied_count(),
            unchanged = report.unchanged_count(),
            "Recipe finished"
        );
        Ok(report)
    }

    #[instrument(skip_all, fields(step = %step.name))]
    fn run_step(
        &self,
        step: &Step,
        reports: &mut Vec<MutationReport>,
        observer: &mut dyn RunObserver,
    ) -> RailstartResult<()> {
        for mutation in &step.mutations {
            let outcome = self.apply(mutation)?;
            debug!(mutation = %mutation, ?outcome, "Mutation done");
            observer.mutation_finished(mutation, &outcome);
            reports.push(MutationReport {
                mutation: mutation.to_string(),
                outcome,
            });
        }
        Ok(())
    }

    /// Apply a single mutation.
    pub fn apply(&self, mutation: &Mutation) -> RailstartResult<Outcome> {
        mutation.validate()?;
        match mutation {
            Mutation::AddDependency(spec) => self.add_dependency(spec),
            Mutation::InsertText(insertion) => self.insert_text(insertion),
            Mutation::ReplaceText(replacement) => self.replace_text(replacement),
            Mutation::RemoveFile(path) => self.remove_file(path),
            Mutation::CopyFile {
                source,
                destination,
                overwrite,
            } => self.copy_file(source, destination, *overwrite),
            Mutation::CopyDirectory {
                source,
                destination,
                overwrite,
            } => self.copy_directory(source, destination, *overwrite),
            Mutation::SetPackageScript(script) => self.set_package_script(script),
            Mutation::RunGenerator(spec) => self.run_generator(spec),
            Mutation::RunShell(spec) => self.run_shell(spec),
        }
    }

    // -------------------------------------------------------------------------
    // File mutations
    // -------------------------------------------------------------------------

    /// Declare a dependency in the manifest unless it is already declared.
    #[instrument(skip_all, fields(dependency = %spec.name))]
    pub fn add_dependency(&self, spec: &DependencySpec) -> RailstartResult<Outcome> {
        let path = self.config.project_path(&self.config.manifest);
        if self.config.dry_run && !self.filesystem.exists(&path) {
            return Ok(Outcome::Planned);
        }
        let manifest = self.read_manifest(&path)?;

        match plan_declaration(&manifest, spec, self.config.constraint_policy)? {
            DependencyEdit::Present => Ok(Outcome::Unchanged),
            DependencyEdit::Mismatch { declared } => {
                let requested = spec.constraint.as_deref().unwrap_or_default();
                warn!(%declared, %requested, "Dependency already declared with another constraint");
                Ok(Outcome::Warned(format!(
                    "{} is declared as '{}', keeping it (requested '{}')",
                    spec.name, declared, requested
                )))
            }
            DependencyEdit::Append(line) => {
                self.write(&path, &append_declaration(&manifest, &line))
            }
        }
    }

    /// Insert text next to an anchor unless the text is already present.
    #[instrument(skip_all, fields(target = %insertion.target))]
    pub fn insert_text(&self, insertion: &TextInsertion) -> RailstartResult<Outcome> {
        let Some(path) = self.resolve(&insertion.target)? else {
            return Ok(Outcome::Planned);
        };
        let contents = self.filesystem.read_to_string(&path)?;

        match insertion.apply_to(&self.relative(&path), &contents) {
            Ok(None) => Ok(Outcome::Unchanged),
            Ok(Some(patched)) => self.write(&path, &patched),
            // Generators that would add the anchor do not run in a dry run.
            Err(DomainError::AnchorNotFound { anchor, .. }) if self.config.dry_run => {
                Ok(Outcome::Warned(format!(
                    "anchor {anchor} is not in {} yet",
                    self.relative(&path)
                )))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Replace every match of a pattern unless the replacement is present.
    #[instrument(skip_all, fields(target = %replacement.target))]
    pub fn replace_text(&self, replacement: &TextReplacement) -> RailstartResult<Outcome> {
        let Some(path) = self.resolve(&replacement.target)? else {
            return Ok(Outcome::Planned);
        };
        let contents = self.filesystem.read_to_string(&path)?;

        match replacement.apply_to(&contents) {
            None => Ok(Outcome::Unchanged),
            Some(patched) => self.write(&path, &patched),
        }
    }

    /// Remove a project file. Missing files are not an error.
    #[instrument(skip(self))]
    pub fn remove_file(&self, path: &Path) -> RailstartResult<Outcome> {
        let full = self.config.project_path(path);
        if self.config.dry_run {
            return Ok(if self.filesystem.exists(&full) {
                Outcome::Planned
            } else {
                Outcome::Unchanged
            });
        }
        if self.filesystem.remove_file(&full)? {
            Ok(Outcome::Applied)
        } else {
            Ok(Outcome::Unchanged)
        }
    }

    /// Copy a template-owned file into the project.
    #[instrument(skip(self))]
    pub fn copy_file(
        &self,
        source: &Path,
        destination: &Path,
        overwrite: bool,
    ) -> RailstartResult<Outcome> {
        let from = self.template_path(source)?;
        if !self.filesystem.exists(&from) || self.filesystem.is_dir(&from) {
            return Err(ApplicationError::SourceMissing { path: from }.into());
        }
        let to = self.config.project_path(destination);
        let changed = self.copy_one(&from, &to, overwrite)?;
        Ok(self.outcome(changed))
    }

    /// Copy every file under a template directory into the project.
    #[instrument(skip(self))]
    pub fn copy_directory(
        &self,
        source: &Path,
        destination: &Path,
        overwrite: bool,
    ) -> RailstartResult<Outcome> {
        let from = self.template_path(source)?;
        if !self.filesystem.is_dir(&from) {
            return Err(ApplicationError::SourceMissing { path: from }.into());
        }
        let to = self.config.project_path(destination);

        let mut changed = false;
        for file in self.filesystem.list_files(&from, true)? {
            let relative = file.strip_prefix(&from).map_err(|e| RailstartError::Internal {
                message: format!("listed file outside {}: {}", from.display(), e),
            })?;
            changed |= self.copy_one(&file, &to.join(relative), overwrite)?;
        }
        Ok(self.outcome(changed))
    }

    /// Set `scripts.<name>` in the package manifest.
    #[instrument(skip_all, fields(script = %script.name))]
    pub fn set_package_script(&self, script: &PackageScript) -> RailstartResult<Outcome> {
        let path = self.config.project_path(&self.config.package_manifest);
        if self.config.dry_run && !self.filesystem.exists(&path) {
            return Ok(Outcome::Planned);
        }
        let manifest = self.read_manifest(&path)?;

        let patched = script
            .apply_to(&manifest)
            .map_err(|e| ApplicationError::ManifestUnreadable {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        match patched {
            None => Ok(Outcome::Unchanged),
            Some(patched) => self.write(&path, &patched),
        }
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    /// Run a framework generator through the rails executable.
    #[instrument(skip_all, fields(generator = %spec))]
    pub fn run_generator(&self, spec: &GeneratorSpec) -> RailstartResult<Outcome> {
        if self.config.dry_run {
            return Ok(Outcome::Planned);
        }
        let invocation = Invocation::new(self.config.rails_program(), spec.argv(), &self.config.root)
            .with_timeout(self.config.command_timeout);
        info!(command = %invocation, "Running generator");

        let status = self.runner.run(&invocation)?;
        if !status.is_success() {
            return Err(ApplicationError::GeneratorFailed {
                generator: spec.to_string(),
                code: status.code,
            }
            .into());
        }
        Ok(Outcome::Applied)
    }

    /// Run an external program in the project root.
    #[instrument(skip_all, fields(command = %spec))]
    pub fn run_shell(&self, spec: &ShellSpec) -> RailstartResult<Outcome> {
        if self.config.dry_run {
            return Ok(Outcome::Planned);
        }
        let invocation = Invocation::new(&spec.program, spec.args.clone(), &self.config.root)
            .with_timeout(self.config.command_timeout);
        info!(command = %invocation, "Running command");

        let status = self.runner.run(&invocation)?;
        if !status.is_success() {
            return Err(ApplicationError::ShellCommandFailed {
                command: spec.to_string(),
                code: status.code,
            }
            .into());
        }
        Ok(Outcome::Applied)
    }

    // -------------------------------------------------------------------------
    // Internal Helpers
    // -------------------------------------------------------------------------

    /// Absolute path of a file target.
    ///
    /// Returns `None` only in dry-run mode when the target does not exist
    /// yet; an earlier step (usually a generator) would have created it.
    fn resolve(&self, target: &FileTarget) -> RailstartResult<Option<PathBuf>> {
        let resolved = match target {
            FileTarget::Path(path) => {
                let full = self.config.project_path(path);
                self.filesystem.exists(&full).then_some(full)
            }
            FileTarget::Latest { dir } => {
                let dir = self.config.project_path(dir);
                self.list_or_empty(&dir, false)?
                    .into_iter()
                    .max_by(|a, b| a.file_name().cmp(&b.file_name()))
            }
            FileTarget::FirstMatching { dir, suffix } => {
                let dir = self.config.project_path(dir);
                self.list_or_empty(&dir, true)?.into_iter().find(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.ends_with(suffix.as_str()))
                })
            }
        };

        match resolved {
            Some(path) => Ok(Some(path)),
            None if self.config.dry_run => Ok(None),
            None => match target {
                // Let the read report the missing file with its path.
                FileTarget::Path(path) => Ok(Some(self.config.project_path(path))),
                other => Err(ApplicationError::TargetNotResolved {
                    target: other.to_string(),
                }
                .into()),
            },
        }
    }

    fn list_or_empty(&self, dir: &Path, recursive: bool) -> RailstartResult<Vec<PathBuf>> {
        if !self.filesystem.is_dir(dir) {
            return Ok(Vec::new());
        }
        self.filesystem.list_files(dir, recursive)
    }

    fn template_path(&self, source: &Path) -> RailstartResult<PathBuf> {
        match &self.config.template_root {
            Some(root) => Ok(root.join(source)),
            None => Err(ApplicationError::TemplateRootNotConfigured {
                path: source.to_path_buf(),
            }
            .into()),
        }
    }

    /// Copy one file. Returns whether the destination changed (or would).
    fn copy_one(&self, from: &Path, to: &Path, overwrite: bool) -> RailstartResult<bool> {
        if self.filesystem.exists(to) {
            if !overwrite {
                debug!(path = %to.display(), "Destination exists, not overwriting");
                return Ok(false);
            }
            if self.same_contents(from, to) {
                return Ok(false);
            }
        }
        if self.config.dry_run {
            return Ok(true);
        }
        if let Some(parent) = to.parent() {
            self.filesystem.create_dir_all(parent)?;
        }
        self.filesystem.copy_file(from, to)?;
        Ok(true)
    }

    fn same_contents(&self, a: &Path, b: &Path) -> bool {
        match (
            self.filesystem.read_to_string(a),
            self.filesystem.read_to_string(b),
        ) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    fn read_manifest(&self, path: &Path) -> RailstartResult<String> {
        self.filesystem.read_to_string(path).map_err(|e| {
            ApplicationError::ManifestUnreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn write(&self, path: &Path, contents: &str) -> RailstartResult<Outcome> {
        if self.config.dry_run {
            return Ok(Outcome::Planned);
        }
        self.filesystem.write_file(path, contents)?;
        Ok(Outcome::Applied)
    }

    fn outcome(&self, changed: bool) -> Outcome {
        match (changed, self.config.dry_run) {
            (false, _) => Outcome::Unchanged,
            (true, true) => Outcome::Planned,
            (true, false) => Outcome::Applied,
        }
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.config.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{CapturedOutput, CommandStatus, MockCommandRunner};
    use crate::domain::{Anchor, ConstraintPolicy, DomainError, Position};
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    // ========================================================================
    // Test doubles
    // ========================================================================

    #[derive(Clone, Default)]
    struct FakeFs {
        files: Arc<Mutex<BTreeMap<PathBuf, String>>>,
    }

    impl FakeFs {
        fn with(self, path: &str, contents: &str) -> Self {
            self.files
                .lock()
                .unwrap()
                .insert(PathBuf::from(path), contents.to_string());
            self
        }

        fn get(&self, path: &str) -> Option<String> {
            self.files.lock().unwrap().get(Path::new(path)).cloned()
        }
    }

    fn missing(path: &Path) -> RailstartError {
        ApplicationError::FilesystemError {
            path: path.to_path_buf(),
            reason: "not found".into(),
        }
        .into()
    }

    impl Filesystem for FakeFs {
        fn read_to_string(&self, path: &Path) -> RailstartResult<String> {
            self.files
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| missing(path))
        }

        fn write_file(&self, path: &Path, content: &str) -> RailstartResult<()> {
            self.files
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), content.to_string());
            Ok(())
        }

        fn exists(&self, path: &Path) -> bool {
            self.files.lock().unwrap().contains_key(path) || self.is_dir(path)
        }

        fn is_dir(&self, path: &Path) -> bool {
            self.files
                .lock()
                .unwrap()
                .keys()
                .any(|p| p != path && p.starts_with(path))
        }

        fn create_dir_all(&self, _path: &Path) -> RailstartResult<()> {
            Ok(())
        }

        fn remove_file(&self, path: &Path) -> RailstartResult<bool> {
            Ok(self.files.lock().unwrap().remove(path).is_some())
        }

        fn copy_file(&self, from: &Path, to: &Path) -> RailstartResult<()> {
            let contents = self.read_to_string(from)?;
            self.write_file(to, &contents)
        }

        fn list_files(&self, dir: &Path, recursive: bool) -> RailstartResult<Vec<PathBuf>> {
            Ok(self
                .files
                .lock()
                .unwrap()
                .keys()
                .filter(|p| {
                    if recursive {
                        p.starts_with(dir) && *p != dir
                    } else {
                        p.parent() == Some(dir)
                    }
                })
                .cloned()
                .collect())
        }
    }

    const GEMFILE: &str = "source \"https://rubygems.org\"\n\ngem \"rails\", \"~> 7.1.0\"\n";
    const ROUTES: &str = "Rails.application.routes.draw do\n  root to: \"home#index\"\nend\n";

    fn config() -> PatchConfig {
        PatchConfig::new("/app").with_template_root("/tpl")
    }

    fn service(fs: &FakeFs) -> PatchService {
        service_with(fs, config(), MockCommandRunner::new())
    }

    fn service_with(fs: &FakeFs, config: PatchConfig, runner: MockCommandRunner) -> PatchService {
        PatchService::new(config, Box::new(fs.clone()), Box::new(runner))
    }

    fn sidekiq_route() -> TextInsertion {
        TextInsertion::new(
            "config/routes.rb",
            Anchor::line("Rails.application.routes.draw do"),
            "  mount Sidekiq::Web => '/sidekiq'",
            Position::After,
        )
    }

    // ========================================================================
    // add_dependency
    // ========================================================================

    #[test]
    fn add_dependency_appends_once() {
        let fs = FakeFs::default().with("/app/Gemfile", GEMFILE);
        let svc = service(&fs);
        let spec = DependencySpec::new("pundit").version("~> 2.1");

        assert_eq!(svc.add_dependency(&spec).unwrap(), Outcome::Applied);
        assert_eq!(svc.add_dependency(&spec).unwrap(), Outcome::Unchanged);

        let gemfile = fs.get("/app/Gemfile").unwrap();
        assert_eq!(gemfile.matches("gem \"pundit\", \"~> 2.1\"").count(), 1);
        assert!(gemfile.starts_with(GEMFILE));
    }

    #[test]
    fn add_dependency_missing_manifest() {
        let fs = FakeFs::default();
        let err = service(&fs)
            .add_dependency(&DependencySpec::new("devise"))
            .unwrap_err();
        assert!(matches!(
            err,
            RailstartError::Application(ApplicationError::ManifestUnreadable { .. })
        ));
    }

    #[test]
    fn constraint_mismatch_follows_policy() {
        let fs = FakeFs::default().with("/app/Gemfile", GEMFILE);
        let spec = DependencySpec::new("rails").version("~> 6.1");

        let outcome = service(&fs).add_dependency(&spec).unwrap();
        assert!(matches!(outcome, Outcome::Warned(ref m) if m.contains("~> 7.1.0")));
        assert_eq!(fs.get("/app/Gemfile").unwrap(), GEMFILE);

        let strict = service_with(
            &fs,
            config().constraint_policy(ConstraintPolicy::Fail),
            MockCommandRunner::new(),
        );
        assert!(matches!(
            strict.add_dependency(&spec),
            Err(RailstartError::Domain(DomainError::ConstraintMismatch { .. }))
        ));
    }

    // ========================================================================
    // insert_text / replace_text
    // ========================================================================

    #[test]
    fn insert_text_is_idempotent() {
        let fs = FakeFs::default().with("/app/config/routes.rb", ROUTES);
        let svc = service(&fs);

        assert_eq!(svc.insert_text(&sidekiq_route()).unwrap(), Outcome::Applied);
        let once = fs.get("/app/config/routes.rb").unwrap();
        assert_eq!(
            once,
            "Rails.application.routes.draw do\n  mount Sidekiq::Web => '/sidekiq'\n  root to: \"home#index\"\nend\n"
        );

        assert_eq!(svc.insert_text(&sidekiq_route()).unwrap(), Outcome::Unchanged);
        assert_eq!(fs.get("/app/config/routes.rb").unwrap(), once);
    }

    #[test]
    fn missing_anchor_leaves_file_untouched() {
        let fs = FakeFs::default().with("/app/config/routes.rb", "# empty\n");
        let err = service(&fs).insert_text(&sidekiq_route()).unwrap_err();
        assert!(matches!(
            err,
            RailstartError::Domain(DomainError::AnchorNotFound { ref file, .. }) if file == "config/routes.rb"
        ));
        assert_eq!(fs.get("/app/config/routes.rb").unwrap(), "# empty\n");
    }

    #[test]
    fn insert_into_newest_migration() {
        let fs = FakeFs::default()
            .with("/app/db/migrate/20240101000000_create_users.rb", "class A\nend\n")
            .with("/app/db/migrate/20240202000000_add_slug.rb", "class B\nend\n");
        let insertion = TextInsertion::new(
            FileTarget::latest("db/migrate"),
            Anchor::line("class B"),
            "  # slug",
            Position::After,
        );
        assert_eq!(service(&fs).insert_text(&insertion).unwrap(), Outcome::Applied);
        assert!(
            fs.get("/app/db/migrate/20240202000000_add_slug.rb")
                .unwrap()
                .contains("# slug")
        );
    }

    #[test]
    fn unresolved_dynamic_target() {
        let fs = FakeFs::default();
        let replacement = TextReplacement::new(
            FileTarget::first_matching("db/migrate", "friendly_id_slugs.rb"),
            "(?m)ActiveRecord::Migration$",
            "ActiveRecord::Migration[5.2]",
        )
        .unwrap();
        assert!(matches!(
            service(&fs).replace_text(&replacement),
            Err(RailstartError::Application(ApplicationError::TargetNotResolved { .. }))
        ));
    }

    #[test]
    fn replace_text_once() {
        let fs = FakeFs::default().with(
            "/app/db/migrate/1_create_friendly_id_slugs.rb",
            "class CreateFriendlyIdSlugs < ActiveRecord::Migration\nend\n",
        );
        let replacement = TextReplacement::new(
            FileTarget::first_matching("db/migrate", "friendly_id_slugs.rb"),
            "(?m)ActiveRecord::Migration$",
            "ActiveRecord::Migration[5.2]",
        )
        .unwrap();
        let svc = service(&fs);
        assert_eq!(svc.replace_text(&replacement).unwrap(), Outcome::Applied);
        assert_eq!(svc.replace_text(&replacement).unwrap(), Outcome::Unchanged);
        assert!(
            fs.get("/app/db/migrate/1_create_friendly_id_slugs.rb")
                .unwrap()
                .contains("< ActiveRecord::Migration[5.2]\n")
        );
    }

    // ========================================================================
    // Files
    // ========================================================================

    #[test]
    fn remove_file_twice() {
        let fs = FakeFs::default().with("/app/Procfile.dev", "web: x\n");
        let svc = service(&fs);
        assert_eq!(svc.remove_file(Path::new("Procfile.dev")).unwrap(), Outcome::Applied);
        assert_eq!(svc.remove_file(Path::new("Procfile.dev")).unwrap(), Outcome::Unchanged);
    }

    #[test]
    fn paths_above_the_root_are_refused() {
        let fs = FakeFs::default().with("/outside.txt", "keep\n");
        let err = service(&fs)
            .apply(&Mutation::remove("../outside.txt"))
            .unwrap_err();
        assert!(matches!(
            err,
            RailstartError::Domain(DomainError::PathOutsideRoot { .. })
        ));
        assert_eq!(fs.get("/outside.txt").as_deref(), Some("keep\n"));
    }

    #[test]
    fn copy_file_requires_source() {
        let fs = FakeFs::default();
        let err = service(&fs)
            .copy_file(Path::new("Procfile"), Path::new("Procfile"), true)
            .unwrap_err();
        assert!(matches!(
            err,
            RailstartError::Application(ApplicationError::SourceMissing { .. })
        ));
    }

    #[test]
    fn copy_file_without_template_root() {
        let fs = FakeFs::default();
        let svc = service_with(&fs, PatchConfig::new("/app"), MockCommandRunner::new());
        assert!(matches!(
            svc.copy_file(Path::new("Procfile"), Path::new("Procfile"), true),
            Err(RailstartError::Application(
                ApplicationError::TemplateRootNotConfigured { .. }
            ))
        ));
    }

    #[test]
    fn copy_file_respects_overwrite() {
        let fs = FakeFs::default()
            .with("/tpl/Procfile", "web: new\n")
            .with("/app/Procfile", "web: old\n");
        let svc = service(&fs);

        let keep = svc
            .copy_file(Path::new("Procfile"), Path::new("Procfile"), false)
            .unwrap();
        assert_eq!(keep, Outcome::Unchanged);
        assert_eq!(fs.get("/app/Procfile").unwrap(), "web: old\n");

        let replace = svc
            .copy_file(Path::new("Procfile"), Path::new("Procfile"), true)
            .unwrap();
        assert_eq!(replace, Outcome::Applied);
        assert_eq!(
            svc.copy_file(Path::new("Procfile"), Path::new("Procfile"), true)
                .unwrap(),
            Outcome::Unchanged
        );
    }

    #[test]
    fn copy_directory_copies_tree() {
        let fs = FakeFs::default()
            .with("/tpl/app/controllers/home_controller.rb", "class Home\nend\n")
            .with("/tpl/app/views/home/index.html.erb", "<h1>Hi</h1>\n");
        let svc = service(&fs);

        let outcome = svc
            .copy_directory(Path::new("app"), Path::new("app"), true)
            .unwrap();
        assert_eq!(outcome, Outcome::Applied);
        assert!(fs.get("/app/app/controllers/home_controller.rb").is_some());
        assert!(fs.get("/app/app/views/home/index.html.erb").is_some());
    }

    #[test]
    fn package_script_set_once() {
        let fs = FakeFs::default().with("/app/package.json", "{\"name\": \"app\"}\n");
        let svc = service(&fs);
        let script = PackageScript::new("build", "node esbuild.config.mjs");

        assert_eq!(svc.set_package_script(&script).unwrap(), Outcome::Applied);
        assert_eq!(svc.set_package_script(&script).unwrap(), Outcome::Unchanged);
    }

    #[test]
    fn package_script_rejects_non_object() {
        let fs = FakeFs::default().with("/app/package.json", "[]");
        assert!(matches!(
            service(&fs).set_package_script(&PackageScript::new("build", "x")),
            Err(RailstartError::Application(ApplicationError::ManifestUnreadable { .. }))
        ));
    }

    // ========================================================================
    // Commands
    // ========================================================================

    #[test]
    fn generator_runs_through_rails_bin() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|inv| {
                inv.program == "/app/bin/rails"
                    && inv.args == ["generate", "pundit:install"]
                    && inv.cwd == Path::new("/app")
            })
            .times(1)
            .returning(|_| Ok(CommandStatus::success()));

        let svc = service_with(&FakeFs::default(), config(), runner);
        let spec = GeneratorSpec::generate("pundit:install", Vec::<String>::new());
        assert_eq!(svc.run_generator(&spec).unwrap(), Outcome::Applied);
    }

    #[test]
    fn generator_failure_carries_exit_code() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .returning(|_| Ok(CommandStatus::failure(3)));

        let svc = service_with(&FakeFs::default(), config(), runner);
        let err = svc
            .run_generator(&GeneratorSpec::task("sitemap:install"))
            .unwrap_err();
        assert!(matches!(
            err,
            RailstartError::Application(ApplicationError::GeneratorFailed { code: Some(3), .. })
        ));
    }

    #[test]
    fn shell_timeout_is_passed_to_runner() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|inv| inv.timeout == Some(std::time::Duration::from_secs(9)))
            .returning(|_| Ok(CommandStatus::success()));
        runner.expect_capture().never().returning(|_| {
            Ok(CapturedOutput {
                status: CommandStatus::success(),
                stdout: String::new(),
                stderr: String::new(),
            })
        });

        let config = config().command_timeout(Some(std::time::Duration::from_secs(9)));
        let svc = service_with(&FakeFs::default(), config, runner);
        let spec = ShellSpec::parse("yarn add toastr").unwrap();
        assert_eq!(svc.run_shell(&spec).unwrap(), Outcome::Applied);
    }

    // ========================================================================
    // Recipes
    // ========================================================================

    fn recipe() -> Recipe {
        Recipe::new("test", "")
            .step(
                Step::new("gems")
                    .with(Mutation::AddDependency(DependencySpec::new("sidekiq").version("~> 6.2"))),
            )
            .step(Step::new("routes").with(Mutation::InsertText(sidekiq_route())))
            .step(
                Step::new("git init")
                    .version_control()
                    .with(Mutation::shell("git init").unwrap()),
            )
            .step(
                Step::new("commit")
                    .version_control()
                    .tolerate_failure()
                    .with(Mutation::shell("git commit -m init").unwrap()),
            )
    }

    fn project() -> FakeFs {
        FakeFs::default()
            .with("/app/Gemfile", GEMFILE)
            .with("/app/config/routes.rb", ROUTES)
    }

    #[test]
    fn run_tolerates_continue_steps() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|inv| inv.program == "git" && inv.args[0] == "init")
            .returning(|_| Ok(CommandStatus::success()));
        runner
            .expect_run()
            .withf(|inv| inv.program == "git" && inv.args[0] == "commit")
            .returning(|_| Ok(CommandStatus::failure(1)));

        let fs = project();
        let report = service_with(&fs, config(), runner).run(&recipe()).unwrap();

        assert_eq!(report.steps.len(), 4);
        assert_eq!(report.steps[2].status, StepStatus::Completed);
        assert!(matches!(report.steps[3].status, StepStatus::Tolerated(_)));
        assert_eq!(report.tolerated().count(), 1);
        assert_eq!(report.applied_count(), 3);
    }

    #[test]
    fn skip_git_skips_vcs_steps() {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().never();

        let fs = project();
        let svc = service_with(&fs, config().skip_git(true), runner);
        let report = svc.run(&recipe()).unwrap();

        assert_eq!(report.steps[2].status, StepStatus::Skipped);
        assert_eq!(report.steps[3].status, StepStatus::Skipped);

        // Second run changes nothing.
        let again = svc.run(&recipe()).unwrap();
        assert_eq!(again.applied_count(), 0);
        assert_eq!(again.unchanged_count(), 2);
    }

    #[test]
    fn failing_step_aborts_with_its_name() {
        let fs = FakeFs::default()
            .with("/app/Gemfile", GEMFILE)
            .with("/app/config/routes.rb", "# no draw block\n");
        let svc = service_with(&fs, config().skip_git(true), MockCommandRunner::new());

        let err = svc.run(&recipe()).unwrap_err();
        match err {
            RailstartError::StepFailed { ref step, .. } => assert_eq!(step, "routes"),
            other => panic!("unexpected error: {other}"),
        }
        // The first step stays applied.
        assert!(fs.get("/app/Gemfile").unwrap().contains("sidekiq"));
    }

    #[test]
    fn dry_run_writes_nothing() {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().never();

        let fs = project();
        let report = service_with(&fs, config().dry_run(true), runner)
            .run(&recipe())
            .unwrap();

        assert!(report.dry_run);
        assert_eq!(fs.get("/app/Gemfile").unwrap(), GEMFILE);
        assert_eq!(fs.get("/app/config/routes.rb").unwrap(), ROUTES);
        assert!(
            report.steps.iter()
                .flat_map(|s| &s.mutations)
                .all(|m| m.outcome == Outcome::Planned)
        );
    }

    #[test]
    fn dry_run_warns_on_anchor_an_earlier_step_would_add() {
        let fs = FakeFs::default().with("/app/config/routes.rb", "# no draw block\n");
        let svc = service_with(&fs, config().dry_run(true), MockCommandRunner::new());

        let outcome = svc.insert_text(&sidekiq_route()).unwrap();
        assert!(matches!(outcome, Outcome::Warned(ref m) if m.contains("config/routes.rb")));
        assert_eq!(fs.get("/app/config/routes.rb").unwrap(), "# no draw block\n");
    }

    #[test]
    fn invalid_recipe_is_rejected_before_running() {
        let fs = project();
        let err = service(&fs).run(&Recipe::new("empty", "")).unwrap_err();
        assert!(matches!(err, RailstartError::Domain(DomainError::InvalidRecipe(_))));
    }

    #[derive(Default)]
    struct Counter {
        started: usize,
        finished: usize,
        mutations: usize,
    }

    impl RunObserver for Counter {
        fn step_started(&mut self, _index: usize, _total: usize, _step: &Step) {
            self.started += 1;
        }
        fn mutation_finished(&mut self, _mutation: &Mutation, _outcome: &Outcome) {
            self.mutations += 1;
        }
        fn step_finished(&mut self, _report: &StepReport) {
            self.finished += 1;
        }
    }

    #[test]
    fn observer_sees_every_step() {
        let fs = project();
        let svc = service_with(&fs, config().skip_git(true), MockCommandRunner::new());
        let mut counter = Counter::default();
        svc.run_observed(&recipe(), &mut counter).unwrap();
        assert_eq!(counter.started, 4);
        assert_eq!(counter.finished, 4);
        assert_eq!(counter.mutations, 2);
    }
}
