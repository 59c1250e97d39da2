use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result of applying one mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum Outcome {
    /// The tree changed (or the command ran successfully).
    Applied,
    /// The mutation was already present.
    Unchanged,
    /// Dry run: the mutation would have changed the tree.
    Planned,
    /// Left as-is, with something the user should look at.
    Warned(String),
}

impl Outcome {
    pub fn changed(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    /// Not run (version-control step with git disabled).
    Skipped,
    /// Failed under a `continue` policy.
    Tolerated(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct MutationReport {
    pub mutation: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub name: String,
    #[serde(flatten)]
    pub status: StepStatus,
    pub mutations: Vec<MutationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Summary of a recipe run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub recipe: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub steps: Vec<StepReport>,
}

impl RunReport {
    pub fn applied_count(&self) -> usize {
        self.outcomes().filter(|o| o.changed()).count()
    }

    pub fn unchanged_count(&self) -> usize {
        self.outcomes()
            .filter(|o| matches!(o, Outcome::Unchanged))
            .count()
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.outcomes()
            .filter_map(|o| match o {
                Outcome::Warned(msg) => Some(msg.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn tolerated(&self) -> impl Iterator<Item = (&str, &str)> {
        self.steps.iter().filter_map(|s| match &s.status {
            StepStatus::Tolerated(msg) => Some((s.name.as_str(), msg.as_str())),
            _ => None,
        })
    }

    fn outcomes(&self) -> impl Iterator<Item = &Outcome> {
        self.steps
            .iter()
            .flat_map(|s| s.mutations.iter().map(|m| &m.outcome))
    }
}
