use sea_orm::DbErr;

use crate::services::validation::ValidationError;

/// Errors shared by the CRUD services (users, tags, ingredients, recipes).
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
}
