//! Mutations: the atomic actions a recipe applies to a project tree.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::domain::{
    dependency::DependencySpec,
    error::DomainError,
    package::PackageScript,
    patch::{TextInsertion, TextReplacement},
};

/// Which file a text mutation edits, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileTarget {
    /// A fixed path.
    Path(PathBuf),
    /// The file with the greatest name directly inside `dir`.
    ///
    /// Migration file names start with a timestamp, so this is the newest
    /// migration.
    Latest { dir: PathBuf },
    /// The first file (sorted by path) under `dir` whose name ends with `suffix`.
    FirstMatching { dir: PathBuf, suffix: String },
}

impl FileTarget {
    pub fn latest(dir: impl Into<PathBuf>) -> Self {
        Self::Latest { dir: dir.into() }
    }

    pub fn first_matching(dir: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self::FirstMatching {
            dir: dir.into(),
            suffix: suffix.into(),
        }
    }

    fn base(&self) -> &Path {
        match self {
            Self::Path(p) => p,
            Self::Latest { dir } | Self::FirstMatching { dir, .. } => dir,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        ensure_relative(self.base())
    }
}

impl fmt::Display for FileTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Latest { dir } => write!(f, "newest file in {}", dir.display()),
            Self::FirstMatching { dir, suffix } => {
                write!(f, "{}/**/*{}", dir.display(), suffix)
            }
        }
    }
}

impl From<&str> for FileTarget {
    fn from(s: &str) -> Self {
        Self::Path(PathBuf::from(s))
    }
}

impl From<String> for FileTarget {
    fn from(s: String) -> Self {
        Self::Path(PathBuf::from(s))
    }
}

impl From<PathBuf> for FileTarget {
    fn from(p: PathBuf) -> Self {
        Self::Path(p)
    }
}

/// How a framework generator is invoked through the rails binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorKind {
    /// `rails generate <name> <args>`
    Generate,
    /// `rails <name> <args>` (a task such as `sitemap:install`)
    Task,
}

/// A host-framework generator or task call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorSpec {
    pub kind: GeneratorKind,
    pub name: String,
    pub args: Vec<String>,
}

impl GeneratorSpec {
    pub fn generate<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: GeneratorKind::Generate,
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn task(name: impl Into<String>) -> Self {
        Self {
            kind: GeneratorKind::Task,
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Arguments passed to the rails binary.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 2);
        if self.kind == GeneratorKind::Generate {
            argv.push("generate".to_string());
        }
        argv.push(self.name.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

impl fmt::Display for GeneratorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rails {}", self.argv().join(" "))
    }
}

/// An external program run in the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl ShellSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a command line on whitespace. No quoting is supported.
    pub fn parse(command_line: &str) -> Result<Self, DomainError> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next().ok_or_else(|| {
            DomainError::InvalidRecipe("shell command is empty".into())
        })?;
        Ok(Self::new(program, parts))
    }
}

impl fmt::Display for ShellSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// A single action applied to the project tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    AddDependency(DependencySpec),
    InsertText(TextInsertion),
    ReplaceText(TextReplacement),
    RemoveFile(PathBuf),
    CopyFile {
        source: PathBuf,
        destination: PathBuf,
        overwrite: bool,
    },
    CopyDirectory {
        source: PathBuf,
        destination: PathBuf,
        overwrite: bool,
    },
    SetPackageScript(PackageScript),
    RunGenerator(GeneratorSpec),
    RunShell(ShellSpec),
}

impl Mutation {
    /// Copy a template-owned file to the same relative path, overwriting.
    pub fn copy(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::CopyFile {
            source: path.clone(),
            destination: path,
            overwrite: true,
        }
    }

    pub fn remove(path: impl Into<PathBuf>) -> Self {
        Self::RemoveFile(path.into())
    }

    pub fn shell(command_line: &str) -> Result<Self, DomainError> {
        ShellSpec::parse(command_line).map(Self::RunShell)
    }

    /// `true` for mutations that launch an external process.
    pub fn is_command(&self) -> bool {
        matches!(self, Self::RunGenerator(_) | Self::RunShell(_))
    }

    /// Short label used in logs and plans.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddDependency(_) => "add-dependency",
            Self::InsertText(_) => "insert-text",
            Self::ReplaceText(_) => "replace-text",
            Self::RemoveFile(_) => "remove-file",
            Self::CopyFile { .. } => "copy-file",
            Self::CopyDirectory { .. } => "copy-directory",
            Self::SetPackageScript(_) => "set-package-script",
            Self::RunGenerator(_) => "run-generator",
            Self::RunShell(_) => "run-shell",
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        match self {
            Self::AddDependency(spec) => spec.validate(),
            Self::InsertText(insertion) => insertion.validate(),
            Self::ReplaceText(replacement) => replacement.target.validate(),
            Self::RemoveFile(path) => ensure_relative(path),
            Self::CopyFile {
                source,
                destination,
                ..
            }
            | Self::CopyDirectory {
                source,
                destination,
                ..
            } => {
                ensure_relative(source)?;
                ensure_relative(destination)
            }
            Self::SetPackageScript(script) if script.name.is_empty() => Err(
                DomainError::InvalidRecipe("package script name is empty".into()),
            ),
            Self::SetPackageScript(_) => Ok(()),
            Self::RunGenerator(spec) if spec.name.trim().is_empty() => Err(
                DomainError::InvalidRecipe("generator name is empty".into()),
            ),
            Self::RunGenerator(_) => Ok(()),
            Self::RunShell(spec) if spec.program.trim().is_empty() => Err(
                DomainError::InvalidRecipe("shell program is empty".into()),
            ),
            Self::RunShell(_) => Ok(()),
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddDependency(spec) => write!(f, "add dependency {spec}"),
            Self::InsertText(i) => write!(f, "insert into {} {} {}", i.target, i.position, i.anchor),
            Self::ReplaceText(r) => {
                write!(f, "replace /{}/ in {}", r.pattern.as_str(), r.target)
            }
            Self::RemoveFile(p) => write!(f, "remove {}", p.display()),
            Self::CopyFile { destination, .. } => write!(f, "copy {}", destination.display()),
            Self::CopyDirectory { destination, .. } => {
                write!(f, "copy directory {}", destination.display())
            }
            Self::SetPackageScript(s) => write!(f, "set package script {}", s.name),
            Self::RunGenerator(spec) => write!(f, "run {spec}"),
            Self::RunShell(spec) => write!(f, "run {spec}"),
        }
    }
}

fn ensure_relative(path: &Path) -> Result<(), DomainError> {
    if path.is_absolute() {
        return Err(DomainError::AbsolutePathNotAllowed {
            path: path.display().to_string(),
        });
    }
    if path.components().any(|c| c == Component::ParentDir) {
        return Err(DomainError::PathOutsideRoot {
            path: path.display().to_string(),
        });
    }
    Ok(())
}
