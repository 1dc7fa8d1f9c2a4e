use thiserror::Error;

use crate::domain::{Entity, ValidationError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: Entity, key: String },

    #[error("{entity} already exists: {key}")]
    AlreadyExists { entity: Entity, key: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A uniqueness constraint kept losing to concurrent writers.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(entity: Entity, key: impl ToString) -> Self {
        AppError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// The validation rule that was broken, if this is a validation failure.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            AppError::Validation(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_not_found(&self, entity: Entity) -> bool {
        matches!(self, AppError::NotFound { entity: e, .. } if *e == entity)
    }
}
