//! Loads recipes from `recipe.toml` manifests.
//!
//! # `recipe.toml` format
//!
//! ```toml
//! [recipe]
//! name        = "api-only"
//! description = "Pundit and Sidekiq on a plain API app"   # optional
//! templates   = "files"      # optional; template root, relative to this file
//!
//! [[steps]]
//! name       = "gems"
//! on_failure = "abort"       # abort | continue (default: abort)
//! vcs        = false         # skipped when git is disabled (default: false)
//! note       = "..."         # optional; shown after the step
//!
//! [[steps.mutations]]
//! kind    = "add_dependency"
//! name    = "pundit"
//! version = "~> 2.1"          # optional
//! require = false             # optional
//! github  = "heartcombo/responders"   # or git = "<url>"; optional
//! branch  = "main"            # optional
//!
//! [[steps.mutations]]
//! kind     = "insert_text"
//! file     = "config/routes.rb"   # or { latest = "db/migrate" }
//!                                 # or { dir = "db/migrate", suffix = "_slugs.rb" }
//! anchor   = { line = "Rails.application.routes.draw do" }
//!          # { substring = ".." } | { pattern = ".." } | "end"
//! position = "after"              # before | after (default: after)
//! text     = "  resources :posts"
//! ```
//!
//! Other kinds: `replace_text` (`file`, `pattern`, `replacement`),
//! `remove_file` (`path`), `copy_file` / `copy_directory` (`source`,
//! `destination`, `overwrite`), `set_package_script` (`name`, `command`),
//! `generate` (`name`, `args`), `task` (`name`), `shell` (`command`).

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{debug, instrument};

use railstart_core::domain::{
    Anchor, DependencySpec, DomainError, FailurePolicy, FileTarget, GeneratorSpec, Mutation,
    PackageScript, Position, Recipe, ShellSpec, Step, TextInsertion, TextReplacement,
};

pub const MANIFEST_FILE: &str = "recipe.toml";

// ── Manifest types ────────────────────────────────────────────────────────────

/// Deserialised representation of a `recipe.toml` file.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RecipeManifest {
    pub recipe: RecipeSection,
    #[serde(default)]
    pub steps: Vec<StepEntry>,
}

/// `[recipe]` section.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RecipeSection {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub templates: Option<PathBuf>,
}

/// One `[[steps]]` entry.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct StepEntry {
    pub name: String,
    #[serde(default)]
    pub on_failure: Option<String>,
    #[serde(default)]
    pub vcs: bool,
    pub note: Option<String>,
    #[serde(default)]
    pub mutations: Vec<MutationEntry>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum MutationEntry {
    AddDependency {
        name: String,
        version: Option<String>,
        require: Option<bool>,
        github: Option<String>,
        git: Option<String>,
        branch: Option<String>,
    },
    InsertText {
        file: TargetEntry,
        anchor: AnchorEntry,
        #[serde(default)]
        position: Option<String>,
        text: String,
    },
    ReplaceText {
        file: TargetEntry,
        pattern: String,
        replacement: String,
    },
    RemoveFile {
        path: PathBuf,
    },
    CopyFile {
        source: PathBuf,
        destination: Option<PathBuf>,
        #[serde(default = "default_overwrite")]
        overwrite: bool,
    },
    CopyDirectory {
        source: PathBuf,
        destination: Option<PathBuf>,
        #[serde(default = "default_overwrite")]
        overwrite: bool,
    },
    SetPackageScript {
        name: String,
        command: String,
    },
    Generate {
        name: String,
        #[serde(default)]
        args: Vec<String>,
    },
    Task {
        name: String,
    },
    Shell {
        command: String,
    },
}

fn default_overwrite() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum TargetEntry {
    Path(PathBuf),
    Latest { latest: PathBuf },
    Matching { dir: PathBuf, suffix: String },
}

#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum AnchorEntry {
    /// Only `"end"` is accepted.
    Keyword(String),
    Line { line: String },
    Substring { substring: String },
    Pattern { pattern: String },
}

// ── Conversion ────────────────────────────────────────────────────────────────

/// A recipe plus the template directory its manifest points at.
#[derive(Debug, Clone)]
pub struct LoadedRecipe {
    pub recipe: Recipe,
    pub template_root: Option<PathBuf>,
}

/// Reads `recipe.toml` files into domain [`Recipe`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecipeLoader;

impl RecipeLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a manifest from `path`. A directory is read as `<dir>/recipe.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidRecipe`] if the file cannot be read or
    /// parsed, and any validation error of the resulting recipe (invalid
    /// patterns included).
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(&self, path: &Path) -> Result<LoadedRecipe, DomainError> {
        let manifest_path = if path.is_dir() {
            path.join(MANIFEST_FILE)
        } else {
            path.to_path_buf()
        };

        let raw = fs::read_to_string(&manifest_path).map_err(|e| {
            DomainError::InvalidRecipe(format!(
                "failed to read '{}': {e}",
                manifest_path.display()
            ))
        })?;

        let mut loaded = self.parse(&raw).map_err(|e| match e {
            DomainError::InvalidRecipe(msg) => {
                DomainError::InvalidRecipe(format!("{}: {msg}", manifest_path.display()))
            }
            other => other,
        })?;

        // Template roots are relative to the manifest, not the caller.
        if let Some(templates) = loaded.template_root.take() {
            let base = manifest_path.parent().unwrap_or(Path::new("."));
            loaded.template_root = Some(base.join(templates));
        }

        debug!(
            recipe = %loaded.recipe.name,
            steps = loaded.recipe.steps.len(),
            "loaded recipe"
        );
        Ok(loaded)
    }

    /// Parse manifest text.
    pub fn parse(&self, raw: &str) -> Result<LoadedRecipe, DomainError> {
        let manifest: RecipeManifest = toml::from_str(raw)
            .map_err(|e| DomainError::InvalidRecipe(format!("failed to parse: {e}")))?;

        let mut recipe = Recipe::new(manifest.recipe.name, manifest.recipe.description);
        for entry in manifest.steps {
            recipe = recipe.step(convert_step(entry)?);
        }
        recipe.validate()?;

        Ok(LoadedRecipe {
            recipe,
            template_root: manifest.recipe.templates,
        })
    }
}

fn convert_step(entry: StepEntry) -> Result<Step, DomainError> {
    let mut step = Step::new(entry.name);
    step.on_failure = match entry.on_failure.as_deref() {
        Some(policy) => policy.parse::<FailurePolicy>()?,
        None => FailurePolicy::Abort,
    };
    step.vcs = entry.vcs;
    step.note = entry.note;

    for mutation in entry.mutations {
        step = step.with(convert_mutation(mutation)?);
    }
    Ok(step)
}

fn convert_mutation(entry: MutationEntry) -> Result<Mutation, DomainError> {
    let mutation = match entry {
        MutationEntry::AddDependency {
            name,
            version,
            require,
            github,
            git,
            branch,
        } => {
            let mut spec = DependencySpec::new(name);
            if let Some(version) = version {
                spec = spec.version(version);
            }
            if require == Some(false) {
                spec = spec.without_require();
            }
            spec = match (github, git) {
                (Some(_), Some(_)) => {
                    return Err(DomainError::InvalidRecipe(format!(
                        "dependency '{}' sets both github and git",
                        spec.name
                    )));
                }
                (Some(repo), None) => spec.github(repo, branch.as_deref()),
                (None, Some(url)) => spec.git(url, branch.as_deref()),
                (None, None) => spec,
            };
            Mutation::AddDependency(spec)
        }
        MutationEntry::InsertText {
            file,
            anchor,
            position,
            text,
        } => {
            let position = match position.as_deref() {
                Some(p) => p.parse::<Position>()?,
                None => Position::After,
            };
            Mutation::InsertText(TextInsertion::new(
                convert_target(file),
                convert_anchor(anchor)?,
                text,
                position,
            ))
        }
        MutationEntry::ReplaceText {
            file,
            pattern,
            replacement,
        } => Mutation::ReplaceText(TextReplacement::new(
            convert_target(file),
            &pattern,
            replacement,
        )?),
        MutationEntry::RemoveFile { path } => Mutation::RemoveFile(path),
        MutationEntry::CopyFile {
            source,
            destination,
            overwrite,
        } => Mutation::CopyFile {
            destination: destination.unwrap_or_else(|| source.clone()),
            source,
            overwrite,
        },
        MutationEntry::CopyDirectory {
            source,
            destination,
            overwrite,
        } => Mutation::CopyDirectory {
            destination: destination.unwrap_or_else(|| source.clone()),
            source,
            overwrite,
        },
        MutationEntry::SetPackageScript { name, command } => {
            Mutation::SetPackageScript(PackageScript::new(name, command))
        }
        MutationEntry::Generate { name, args } => {
            Mutation::RunGenerator(GeneratorSpec::generate(name, args))
        }
        MutationEntry::Task { name } => Mutation::RunGenerator(GeneratorSpec::task(name)),
        MutationEntry::Shell { command } => Mutation::RunShell(ShellSpec::parse(&command)?),
    };
    Ok(mutation)
}

fn convert_target(entry: TargetEntry) -> FileTarget {
    match entry {
        TargetEntry::Path(path) => FileTarget::Path(path),
        TargetEntry::Latest { latest } => FileTarget::latest(latest),
        TargetEntry::Matching { dir, suffix } => FileTarget::first_matching(dir, suffix),
    }
}

fn convert_anchor(entry: AnchorEntry) -> Result<Anchor, DomainError> {
    match entry {
        AnchorEntry::Keyword(word) if word == "end" => Ok(Anchor::EndOfFile),
        AnchorEntry::Keyword(word) => Err(DomainError::InvalidRecipe(format!(
            "unknown anchor '{word}', expected \"end\" or a table such as {{ line = \"..\" }}"
        ))),
        AnchorEntry::Line { line } => Ok(Anchor::line(line)),
        AnchorEntry::Substring { substring } => Ok(Anchor::substring(substring)),
        AnchorEntry::Pattern { pattern } => Anchor::pattern(&pattern),
    }
}
