use crate::domain::{error::DomainError, mutation::Mutation, recipe::Recipe};

/// Centralized domain validation.
///
/// All validation logic lives here, not scattered across services.
pub struct DomainValidator;

impl DomainValidator {
    pub fn validate_recipe(recipe: &Recipe) -> Result<(), DomainError> {
        recipe.validate()
    }

    pub fn validate_mutation(mutation: &Mutation) -> Result<(), DomainError> {
        mutation.validate()
    }
}
