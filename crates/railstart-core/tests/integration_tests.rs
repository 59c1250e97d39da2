//! Integration tests for railstart-core, driven through the public prelude.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use railstart_core::application::ApplicationError;
use railstart_core::prelude::*;

#[derive(Clone, Default)]
struct Tree {
    files: Arc<Mutex<BTreeMap<PathBuf, String>>>,
}

impl Tree {
    fn with(self, path: &str, contents: &str) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(PathBuf::from("/blog").join(path), contents.into());
        self
    }

    fn read(&self, path: &str) -> String {
        self.files.lock().unwrap()[&PathBuf::from("/blog").join(path)].clone()
    }

    fn snapshot(&self) -> BTreeMap<PathBuf, String> {
        self.files.lock().unwrap().clone()
    }
}

impl Filesystem for Tree {
    fn read_to_string(&self, path: &Path) -> RailstartResult<String> {
        self.files.lock().unwrap().get(path).cloned().ok_or_else(|| {
            ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "not found".into(),
            }
            .into()
        })
    }

    fn write_file(&self, path: &Path, content: &str) -> RailstartResult<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.into());
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
                    p.starts_with(dir)
                } else {
                    p.parent() == Some(dir)
                }
            })
            .cloned()
            .collect())
    }
}

#[derive(Clone, Default)]
struct Commands {
    seen: Arc<Mutex<Vec<String>>>,
}

impl CommandRunner for Commands {
    fn run(&self, invocation: &Invocation) -> RailstartResult<CommandStatus> {
        self.seen.lock().unwrap().push(invocation.to_string());
        Ok(CommandStatus::success())
    }

    fn capture(&self, invocation: &Invocation) -> RailstartResult<CapturedOutput> {
        Ok(CapturedOutput {
            status: self.run(invocation)?,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

fn blog() -> Tree {
    Tree::default()
        .with("Gemfile", "source \"https://rubygems.org\"\n\ngem \"rails\"\n")
        .with("config/routes.rb", "Rails.application.routes.draw do\nend\n")
        .with("package.json", "{\n  \"name\": \"blog\"\n}\n")
}

fn recipe() -> Recipe {
    Recipe::new("blog", "posts and a build script")
        .step(
            Step::new("gems")
                .with(Mutation::AddDependency(
                    DependencySpec::new("pundit").version("~> 2.1"),
                ))
                .with(Mutation::AddDependency(
                    DependencySpec::new("whenever").without_require(),
                )),
        )
        .step(Step::new("routes").with(Mutation::InsertText(TextInsertion::new(
            "config/routes.rb",
            Anchor::line("Rails.application.routes.draw do"),
            "  resources :posts",
            Position::After,
        ))))
        .step(
            Step::new("scripts").with(Mutation::SetPackageScript(PackageScript::new(
                "build",
                "node esbuild.config.mjs",
            ))),
        )
        .step(
            Step::new("commit")
                .with(Mutation::RunShell(ShellSpec::new("git", ["commit", "-m", "posts"])))
                .version_control(),
        )
}

fn service(tree: &Tree, commands: &Commands, skip_git: bool) -> PatchService {
    PatchService::new(
        PatchConfig::new("/blog").skip_git(skip_git),
        Box::new(tree.clone()),
        Box::new(commands.clone()),
    )
}

#[test]
fn test_recipe_patches_every_file() {
    let tree = blog();
    let commands = Commands::default();

    let report = service(&tree, &commands, false).run(&recipe()).unwrap();

    assert_eq!(report.recipe, "blog");
    assert_eq!(report.steps.len(), 4);
    assert!(report.steps.iter().all(|s| s.status == StepStatus::Completed));

    let gemfile = tree.read("Gemfile");
    assert!(gemfile.contains("gem \"pundit\", \"~> 2.1\"\n"));
    assert!(gemfile.contains("gem \"whenever\", require: false\n"));
    assert_eq!(
        tree.read("config/routes.rb"),
        "Rails.application.routes.draw do\n  resources :posts\nend\n"
    );
    assert!(tree.read("package.json").contains("\"build\": \"node esbuild.config.mjs\""));
    assert_eq!(*commands.seen.lock().unwrap(), vec!["git commit -m posts"]);
}

#[test]
fn test_second_run_is_a_no_op() {
    let tree = blog();
    let commands = Commands::default();
    let svc = service(&tree, &commands, true);

    svc.run(&recipe()).unwrap();
    let first = tree.snapshot();

    let report = svc.run(&recipe()).unwrap();
    assert_eq!(tree.snapshot(), first);
    assert_eq!(report.applied_count(), 0);
    assert!(commands.seen.lock().unwrap().is_empty());
}

#[test]
fn test_dry_run_touches_nothing() {
    let tree = blog();
    let before = tree.snapshot();

    let report = PatchService::new(
        PatchConfig::new("/blog").dry_run(true),
        Box::new(tree.clone()),
        Box::new(Commands::default()),
    )
    .run(&recipe())
    .unwrap();

    assert!(report.dry_run);
    assert_eq!(tree.snapshot(), before);
    assert!(
        report
            .steps
            .iter()
            .flat_map(|s| &s.mutations)
            .all(|m| m.outcome == Outcome::Planned)
    );
}

#[test]
fn test_missing_anchor_stops_the_run() {
    let tree = blog().with("config/routes.rb", "# no routes block\n");
    let err = service(&tree, &Commands::default(), true)
        .run(&recipe())
        .unwrap_err();

    match err {
        RailstartError::StepFailed { ref step, .. } => assert_eq!(step, "routes"),
        other => panic!("unexpected error: {other}"),
    }
    // Steps after the failure never ran.
    assert!(!tree.read("package.json").contains("build"));
}

#[test]
fn test_flash_keys_map_to_toasts() {
    let cases = [
        ("notice", Severity::Success),
        ("success", Severity::Success),
        ("info", Severity::Info),
        ("warning", Severity::Warning),
        ("alert", Severity::Error),
        ("error", Severity::Error),
        ("timedout", Severity::Success),
    ];
    for (key, severity) in cases {
        let toast = FlashMessage::new(key, "Saved").notify().unwrap();
        assert_eq!(toast.severity, severity, "{key}");
    }
    assert_eq!(FlashMessage::new("notice", "").notify(), None);
}
