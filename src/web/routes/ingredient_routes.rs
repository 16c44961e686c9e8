use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::{entities::ingredient, services};
use crate::services::validation::Validate;
use crate::web::models::IngredientRequest;
use crate::web::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct IngredientSearch {
    /// Case-insensitive name prefix.
    name: Option<String>,
}

pub fn create_ingredients_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_ingredients).post(create_ingredient))
        .route("/{ingredient_id}", get(get_ingredient))
}

async fn create_ingredient(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<IngredientRequest>,
) -> Result<(StatusCode, Json<ingredient::Model>), AppError> {
    payload.validate()?;
    let created = services::create_ingredient(&app_state.db_pool, &payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_ingredients(
    State(app_state): State<Arc<AppState>>,
    Query(search): Query<IngredientSearch>,
) -> Result<Json<Vec<ingredient::Model>>, AppError> {
    let ingredients =
        services::list_ingredients(&app_state.db_pool, search.name.as_deref()).await?;
    Ok(Json(ingredients))
}

async fn get_ingredient(
    State(app_state): State<Arc<AppState>>,
    Path(ingredient_id): Path<i32>,
) -> Result<Json<ingredient::Model>, AppError> {
    Ok(Json(services::get_ingredient(&app_state.db_pool, ingredient_id).await?))
}
