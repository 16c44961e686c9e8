use axum::{
    extract::{Extension, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::db::models::{Page, PageParams, RecipeDetails, ShortRecipe};
use crate::db::services::{self, shopping_list_service, RecipeFilter};
use crate::services::shopping_list_renderer::ShoppingListFormat;
use crate::services::validation::Validate;
use crate::web::models::{AuthenticatedUser, RecipeRequest};
use crate::web::{AppError, AppState};

pub fn create_recipes_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_recipes).post(create_recipe))
        .route("/download_shopping_cart", get(download_shopping_cart))
        .route(
            "/{recipe_id}",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
        .route("/{recipe_id}/favorite", post(add_favorite).delete(remove_favorite))
        .route(
            "/{recipe_id}/shopping_cart",
            post(add_to_shopping_cart).delete(remove_from_shopping_cart),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct RecipeListQuery {
    page: Option<u64>,
    limit: Option<u64>,
    author: Option<i32>,
    /// Comma separated tag slugs.
    tags: Option<String>,
    is_favorited: Option<u8>,
    is_in_shopping_cart: Option<u8>,
}

impl RecipeListQuery {
    fn filter(&self) -> RecipeFilter {
        RecipeFilter {
            author: self.author,
            tags: self
                .tags
                .as_deref()
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|slug| !slug.is_empty())
                .map(str::to_owned)
                .collect(),
            is_favorited: self.is_favorited == Some(1),
            is_in_shopping_cart: self.is_in_shopping_cart == Some(1),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    format: Option<String>,
}

async fn list_recipes(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<RecipeListQuery>,
) -> Result<Json<Page<RecipeDetails>>, AppError> {
    let page = services::list_recipes(
        &app_state.db_pool,
        user.id,
        &query.filter(),
        PageParams::new(query.page, query.limit),
    )
    .await?;
    Ok(Json(page))
}

async fn create_recipe(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<RecipeRequest>,
) -> Result<(StatusCode, Json<RecipeDetails>), AppError> {
    payload.validate()?;
    let recipe = services::create_recipe(&app_state.db_pool, user.id, &payload).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

async fn get_recipe(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<Json<RecipeDetails>, AppError> {
    Ok(Json(services::get_recipe(&app_state.db_pool, user.id, recipe_id).await?))
}

async fn update_recipe(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
    Json(payload): Json<RecipeRequest>,
) -> Result<Json<RecipeDetails>, AppError> {
    payload.validate()?;
    let recipe = services::update_recipe(&app_state.db_pool, recipe_id, user.id, &payload).await?;
    Ok(Json(recipe))
}

async fn delete_recipe(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    services::delete_recipe(&app_state.db_pool, recipe_id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Favourites and shopping cart ---

async fn add_favorite(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<(StatusCode, Json<ShortRecipe>), AppError> {
    let recipe = services::add_favourite(&app_state.db_pool, user.id, recipe_id).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

async fn remove_favorite(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    services::remove_favourite(&app_state.db_pool, user.id, recipe_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_to_shopping_cart(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<(StatusCode, Json<ShortRecipe>), AppError> {
    let recipe = services::add_to_cart(&app_state.db_pool, user.id, recipe_id).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

async fn remove_from_shopping_cart(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(recipe_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    services::remove_from_cart(&app_state.db_pool, user.id, recipe_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn download_shopping_cart(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, AppError> {
    let format = match query.format.as_deref() {
        Some(value) => value.parse::<ShoppingListFormat>()?,
        None => ShoppingListFormat::default(),
    };
    let items = shopping_list_service::aggregate(&app_state.db_pool, user.id).await?;
    let document = format.renderer().render(&user.username, &items)?;
    info!(user_id = user.id, items = items.len(), ?format, "Shopping list downloaded.");

    let disposition = format!(
        "attachment; filename=\"{}\"",
        header_safe_filename(&document.filename)
    );
    Ok((
        [
            (header::CONTENT_TYPE, document.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    )
        .into_response())
}

/// Header values must be visible ASCII; anything else becomes `_`.
fn header_safe_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' && c != '\\' { c } else { '_' })
        .collect()
}
