//! `railstart plan` - describe a recipe without touching anything.

use serde::Serialize;

use railstart_core::domain::{FailurePolicy, Recipe};

use crate::{
    cli::{OutputFormat, PlanArgs, PlanFormat},
    error::CliResult,
    output::OutputManager,
    patching,
};

#[derive(Debug, Serialize)]
struct RecipeView<'a> {
    name: &'a str,
    description: &'a str,
    steps: Vec<StepView<'a>>,
}

#[derive(Debug, Serialize)]
struct StepView<'a> {
    name: &'a str,
    on_failure: String,
    vcs: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
    mutations: Vec<MutationView>,
}

#[derive(Debug, Serialize)]
struct MutationView {
    kind: &'static str,
    description: String,
}

fn view(recipe: &Recipe) -> RecipeView<'_> {
    RecipeView {
        name: &recipe.name,
        description: &recipe.description,
        steps: recipe
            .steps
            .iter()
            .map(|step| StepView {
                name: &step.name,
                on_failure: step.on_failure.to_string(),
                vcs: step.vcs,
                note: step.note.as_deref(),
                mutations: step
                    .mutations
                    .iter()
                    .map(|m| MutationView {
                        kind: m.kind(),
                        description: m.to_string(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Print the steps of the selected recipe.
pub fn execute(args: PlanArgs, output: OutputManager) -> CliResult<()> {
    let selected = patching::select_recipe(args.recipe.as_deref())?;
    let recipe = &selected.recipe;

    if args.format == PlanFormat::Json || output.format() == OutputFormat::Json {
        return output.json(&view(recipe));
    }

    output.header(&format!("{}: {}", recipe.name, recipe.description))?;
    for (index, step) in recipe.steps.iter().enumerate() {
        let mut flags = Vec::new();
        if step.vcs {
            flags.push("git");
        }
        if step.on_failure == FailurePolicy::Continue {
            flags.push("may fail");
        }
        let suffix = if flags.is_empty() {
            String::new()
        } else {
            format!(" ({})", flags.join(", "))
        };
        output.print(&format!("{:>3}. {}{suffix}", index + 1, step.name))?;
        for mutation in &step.mutations {
            output.detail(&format!("       {mutation}"))?;
        }
    }
    output.print("")?;
    output.info(&format!(
        "{} steps, {} mutations",
        recipe.steps.len(),
        recipe.mutation_count()
    ))?;
    Ok(())
}
