//! Dependency declarations in a line-based manifest (the `Gemfile`).

use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::domain::error::DomainError;

/// Where a dependency is fetched from when it is not a registry release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencySource {
    /// `github: "owner/repo"` with an optional branch.
    GitHub { repo: String, branch: Option<String> },
    /// `git: "url"` with an optional branch.
    Git { url: String, branch: Option<String> },
}

/// A single dependency declaration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    pub name: String,
    pub constraint: Option<String>,
    pub source: Option<DependencySource>,
    /// `Some(false)` renders `require: false`.
    pub require: Option<bool>,
}

impl DependencySpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: None,
            source: None,
            require: None,
        }
    }

    pub fn version(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }

    pub fn github(mut self, repo: impl Into<String>, branch: Option<&str>) -> Self {
        self.source = Some(DependencySource::GitHub {
            repo: repo.into(),
            branch: branch.map(str::to_string),
        });
        self
    }

    pub fn git(mut self, url: impl Into<String>, branch: Option<&str>) -> Self {
        self.source = Some(DependencySource::Git {
            url: url.into(),
            branch: branch.map(str::to_string),
        });
        self
    }

    pub fn without_require(mut self) -> Self {
        self.require = Some(false);
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let valid = !self.name.is_empty()
            && self
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(DomainError::InvalidDependency {
                name: self.name.clone(),
                reason: "names may only contain letters, digits, '-', '_' and '.'".into(),
            });
        }
        Ok(())
    }

    /// Render the manifest line, without a trailing newline.
    pub fn declaration(&self) -> String {
        let mut line = format!("gem \"{}\"", self.name);
        if let Some(constraint) = &self.constraint {
            line.push_str(&format!(", \"{constraint}\""));
        }
        if self.require == Some(false) {
            line.push_str(", require: false");
        }
        match &self.source {
            Some(DependencySource::GitHub { repo, branch }) => {
                line.push_str(&format!(", github: \"{repo}\""));
                if let Some(branch) = branch {
                    line.push_str(&format!(", branch: \"{branch}\""));
                }
            }
            Some(DependencySource::Git { url, branch }) => {
                line.push_str(&format!(", git: \"{url}\""));
                if let Some(branch) = branch {
                    line.push_str(&format!(", branch: \"{branch}\""));
                }
            }
            None => {}
        }
        line
    }

    /// Find an existing declaration of this dependency in `manifest`.
    pub fn find_declaration(&self, manifest: &str) -> Option<Declaration> {
        let re = declaration_regex(&self.name);
        manifest.lines().enumerate().find_map(|(idx, line)| {
            re.captures(line).map(|caps| Declaration {
                line: idx + 1,
                constraint: caps.get(1).map(|m| m.as_str().to_string()),
            })
        })
    }
}

impl fmt::Display for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.constraint {
            Some(c) => write!(f, "{} ({})", self.name, c),
            None => write!(f, "{}", self.name),
        }
    }
}

fn declaration_regex(name: &str) -> Regex {
    // The name is escaped, so the pattern is always valid.
    Regex::new(&format!(
        r#"^\s*gem\s+['"]{}['"](?:\s*,\s*['"]([~><=!]*\s*\d[^'"]*)['"])?"#,
        regex::escape(name)
    ))
    .expect("escaped dependency pattern is valid")
}

/// An existing declaration found in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// 1-based line number.
    pub line: usize,
    pub constraint: Option<String>,
}

/// What to do when a dependency is already declared with another constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConstraintPolicy {
    /// Keep the existing declaration and report a warning.
    #[default]
    Warn,
    /// Fail with [`DomainError::ConstraintMismatch`].
    Fail,
}

impl FromStr for ConstraintPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "warn" => Ok(Self::Warn),
            "fail" => Ok(Self::Fail),
            other => Err(DomainError::InvalidRecipe(format!(
                "constraint policy must be 'warn' or 'fail', got '{other}'"
            ))),
        }
    }
}

/// Result of planning a dependency declaration against a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyEdit {
    /// Append this line.
    Append(String),
    /// Already declared with a compatible (or no) constraint.
    Present,
    /// Declared with a different constraint; carries the declared one.
    Mismatch { declared: String },
}

/// Decide how `spec` changes `manifest`.
pub fn plan_declaration(
    manifest: &str,
    spec: &DependencySpec,
    policy: ConstraintPolicy,
) -> Result<DependencyEdit, DomainError> {
    spec.validate()?;

    let Some(existing) = spec.find_declaration(manifest) else {
        return Ok(DependencyEdit::Append(spec.declaration()));
    };

    let requested = match &spec.constraint {
        Some(c) => c.trim(),
        None => return Ok(DependencyEdit::Present),
    };

    let declared = existing.constraint.as_deref().map(str::trim);
    if declared == Some(requested) {
        return Ok(DependencyEdit::Present);
    }

    let declared = declared.unwrap_or("no constraint").to_string();
    match policy {
        ConstraintPolicy::Warn => Ok(DependencyEdit::Mismatch { declared }),
        ConstraintPolicy::Fail => Err(DomainError::ConstraintMismatch {
            name: spec.name.clone(),
            declared,
            requested: requested.to_string(),
        }),
    }
}

/// Append a declaration line, keeping the manifest newline-terminated.
pub fn append_declaration(manifest: &str, line: &str) -> String {
    let mut out = String::with_capacity(manifest.len() + line.len() + 2);
    out.push_str(manifest);
    if !manifest.is_empty() && !manifest.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(line);
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEMFILE: &str = "source \"https://rubygems.org\"\n\ngem 'rails', '~> 7.1.0'\ngem \"puma\"\n";

    #[test]
    fn declaration_renders_all_options() {
        let spec = DependencySpec::new("responders").github("heartcombo/responders", Some("main"));
        assert_eq!(
            spec.declaration(),
            r#"gem "responders", github: "heartcombo/responders", branch: "main""#
        );

        let spec = DependencySpec::new("whenever").without_require();
        assert_eq!(spec.declaration(), r#"gem "whenever", require: false"#);

        let spec = DependencySpec::new("pundit").version("~> 2.1");
        assert_eq!(spec.declaration(), r#"gem "pundit", "~> 2.1""#);
    }

    #[test]
    fn finds_single_and_double_quoted_declarations() {
        let rails = DependencySpec::new("rails").find_declaration(GEMFILE).unwrap();
        assert_eq!(rails.line, 3);
        assert_eq!(rails.constraint.as_deref(), Some("~> 7.1.0"));

        let puma = DependencySpec::new("puma").find_declaration(GEMFILE).unwrap();
        assert_eq!(puma.constraint, None);
    }

    #[test]
    fn prefix_names_do_not_match() {
        assert!(DependencySpec::new("rail").find_declaration(GEMFILE).is_none());
        assert!(DependencySpec::new("pum").find_declaration(GEMFILE).is_none());
    }

    #[test]
    fn commented_declarations_do_not_count() {
        let manifest = "# gem \"pundit\"\n";
        assert!(DependencySpec::new("pundit").find_declaration(manifest).is_none());
    }

    #[test]
    fn absent_dependency_is_appended() {
        let spec = DependencySpec::new("pundit").version("~> 2.1");
        let edit = plan_declaration(GEMFILE, &spec, ConstraintPolicy::Warn).unwrap();
        assert_eq!(edit, DependencyEdit::Append(r#"gem "pundit", "~> 2.1""#.into()));
    }

    #[test]
    fn same_constraint_is_present() {
        let spec = DependencySpec::new("rails").version("~> 7.1.0");
        assert_eq!(
            plan_declaration(GEMFILE, &spec, ConstraintPolicy::Fail).unwrap(),
            DependencyEdit::Present
        );
    }

    #[test]
    fn unconstrained_request_accepts_any_declaration() {
        let spec = DependencySpec::new("rails");
        assert_eq!(
            plan_declaration(GEMFILE, &spec, ConstraintPolicy::Fail).unwrap(),
            DependencyEdit::Present
        );
    }

    #[test]
    fn constraint_mismatch_follows_policy() {
        let spec = DependencySpec::new("rails").version("~> 6.0");
        assert_eq!(
            plan_declaration(GEMFILE, &spec, ConstraintPolicy::Warn).unwrap(),
            DependencyEdit::Mismatch {
                declared: "~> 7.1.0".into()
            }
        );
        assert!(matches!(
            plan_declaration(GEMFILE, &spec, ConstraintPolicy::Fail),
            Err(DomainError::ConstraintMismatch { .. })
        ));
    }

    #[test]
    fn invalid_names_are_rejected() {
        let spec = DependencySpec::new("bad name");
        assert!(matches!(
            plan_declaration(GEMFILE, &spec, ConstraintPolicy::Warn),
            Err(DomainError::InvalidDependency { .. })
        ));
    }

    #[test]
    fn append_keeps_newline_termination() {
        assert_eq!(append_declaration("a", "b"), "a\nb\n");
        assert_eq!(append_declaration("a\n", "b"), "a\nb\n");
        assert_eq!(append_declaration("", "b"), "b\n");
    }
}
