use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::db::{entities::tag, services};
use crate::services::validation::Validate;
use crate::web::models::{AuthenticatedUser, TagRequest};
use crate::web::{AppError, AppState};

// --- Route Handlers ---

async fn create_tag_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<TagRequest>,
) -> Result<(StatusCode, Json<tag::Model>), AppError> {
    payload.validate()?;
    let tag_model = services::create_tag(&app_state.db_pool, authenticated_user.id, &payload).await?;
    Ok((StatusCode::CREATED, Json(tag_model)))
}

async fn list_tags_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<tag::Model>>, AppError> {
    Ok(Json(services::list_tags(&app_state.db_pool).await?))
}

async fn get_tag_handler(
    State(app_state): State<Arc<AppState>>,
    Path(tag_id): Path<i32>,
) -> Result<Json<tag::Model>, AppError> {
    Ok(Json(services::get_tag(&app_state.db_pool, tag_id).await?))
}

async fn update_tag_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(tag_id): Path<i32>,
    Json(payload): Json<TagRequest>,
) -> Result<Json<tag::Model>, AppError> {
    payload.validate()?;
    let updated =
        services::update_tag(&app_state.db_pool, tag_id, authenticated_user.id, &payload).await?;
    Ok(Json(updated))
}

async fn delete_tag_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(tag_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    services::delete_tag(&app_state.db_pool, tag_id, authenticated_user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Router ---

pub fn create_tags_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tags_handler).post(create_tag_handler))
        .route(
            "/{tag_id}",
            get(get_tag_handler).put(update_tag_handler).delete(delete_tag_handler),
        )
}
