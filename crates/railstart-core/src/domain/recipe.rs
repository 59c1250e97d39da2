//! Recipes: hand-ordered lists of named steps.
//!
//! Order is the contract. Later steps assume that the files produced or
//! patched by earlier ones exist, so steps are never reordered or inferred.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::domain::{error::DomainError, mutation::Mutation};

/// What happens to the rest of the recipe when a step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the whole recipe.
    #[default]
    Abort,
    /// Log the failure and move on to the next step.
    Continue,
}

impl FromStr for FailurePolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "continue" => Ok(Self::Continue),
            other => Err(DomainError::InvalidRecipe(format!(
                "on_failure must be 'abort' or 'continue', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => write!(f, "abort"),
            Self::Continue => write!(f, "continue"),
        }
    }
}

/// One named step of a recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub name: String,
    pub mutations: Vec<Mutation>,
    pub on_failure: FailurePolicy,
    /// Version-control steps are skipped when git is disabled.
    pub vcs: bool,
    /// Shown to the user after the step completes.
    pub note: Option<String>,
}

impl Step {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mutations: Vec::new(),
            on_failure: FailurePolicy::Abort,
            vcs: false,
            note: None,
        }
    }

    pub fn with(mut self, mutation: Mutation) -> Self {
        self.mutations.push(mutation);
        self
    }

    pub fn with_all(mut self, mutations: impl IntoIterator<Item = Mutation>) -> Self {
        self.mutations.extend(mutations);
        self
    }

    pub fn tolerate_failure(mut self) -> Self {
        self.on_failure = FailurePolicy::Continue;
        self
    }

    pub fn version_control(mut self) -> Self {
        self.vcs = true;
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// A complete bootstrap sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Recipe {
    pub name: String,
    pub description: String,
    pub steps: Vec<Step>,
}

impl Recipe {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn mutation_count(&self) -> usize {
        self.steps.iter().map(|s| s.mutations.len()).sum()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.steps.is_empty() {
            return Err(DomainError::InvalidRecipe(format!(
                "recipe '{}' has no steps",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.name.as_str()) {
                return Err(DomainError::DuplicateStep {
                    name: step.name.clone(),
                });
            }
            if step.mutations.is_empty() {
                return Err(DomainError::InvalidRecipe(format!(
                    "step '{}' has no mutations",
                    step.name
                )));
            }
            for mutation in &step.mutations {
                mutation.validate()?;
            }
        }

        Ok(())
    }
}
