//! Engine error taxonomy

use crate::core_types::HouseholdId;
use crate::store::StoreError;
use thiserror::Error;

/// Errors returned by engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// A referenced entity does not exist
    #[error("{entity} `{id}` not found")]
    NotFound { entity: &'static str, id: String },
    /// A required input was not supplied
    #[error("missing required parameter `{0}`")]
    MissingParameter(&'static str),
    /// The backing store call failed
    #[error("store failure: {0}")]
    StoreFailure(#[from] StoreError),
}

impl EngineError {
    pub fn household_not_found(id: &HouseholdId) -> Self {
        EngineError::NotFound {
            entity: "household",
            id: id.to_string(),
        }
    }
}
