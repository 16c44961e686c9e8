use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::db::services::{MembershipError, ServiceError, ShoppingListError};
use crate::services::shopping_list_renderer::RenderError;
use crate::services::validation::ValidationError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {msg}"),
            ),
            AppError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };
        (status, Json(serde_json::json!({ "error": error_message }))).into_response()
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        error!(error = %err, "Database operation failed.");
        AppError::DatabaseError(err.to_string())
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::DbErr(e) => e.into(),
            ServiceError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            ServiceError::Conflict(msg) => AppError::Conflict(msg),
            ServiceError::Validation(e) => e.into(),
        }
    }
}

impl From<MembershipError> for AppError {
    fn from(err: MembershipError) -> Self {
        match err {
            MembershipError::DbErr(e) => e.into(),
            MembershipError::TargetNotFound(..) => AppError::NotFound(err.to_string()),
            MembershipError::AlreadyExists(_)
            | MembershipError::NotFound(_)
            | MembershipError::SelfFollow => AppError::InvalidInput(err.to_string()),
        }
    }
}

impl From<ShoppingListError> for AppError {
    fn from(err: ShoppingListError) -> Self {
        match err {
            ShoppingListError::DbErr(e) => e.into(),
            ShoppingListError::EmptyCart => AppError::InvalidInput(err.to_string()),
        }
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        error!(error = %err, "Failed to render shopping list.");
        AppError::InternalServerError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_errors_map_to_statuses() {
        let status = |err: MembershipError| AppError::from(err).into_response().status();
        assert_eq!(status(MembershipError::AlreadyExists("Favourite")), StatusCode::BAD_REQUEST);
        assert_eq!(status(MembershipError::NotFound("Favourite")), StatusCode::BAD_REQUEST);
        assert_eq!(status(MembershipError::SelfFollow), StatusCode::BAD_REQUEST);
        assert_eq!(status(MembershipError::TargetNotFound("Recipe", 7)), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invalid_credentials_is_unauthorized() {
        let response = AppError::InvalidCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_empty_cart_is_bad_request() {
        let response = AppError::from(ShoppingListError::EmptyCart).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_service_errors_map_to_statuses() {
        let status = |err: ServiceError| AppError::from(err).into_response().status();
        assert_eq!(status(ServiceError::NotFound("Tag".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(ServiceError::Conflict("taken".into())), StatusCode::CONFLICT);
        assert_eq!(
            status(ValidationError::new("slug", "bad").into()),
            StatusCode::BAD_REQUEST
        );
    }
}
