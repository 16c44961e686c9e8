use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::models::{Page, PageParams, Subscription, UserProfile};
use crate::db::services;
use crate::services::validation::Validate;
use crate::web::models::{AuthenticatedUser, CreateUserRequest, UpdateUserRequest};
use crate::web::{AppError, AppState};

/// Signup. Reachable without a token.
pub fn create_public_router() -> Router<Arc<AppState>> {
    Router::new().route("/", post(create_user))
}

pub fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_users))
        .route("/me", get(get_me).patch(update_me))
        .route("/subscriptions", get(list_subscriptions))
        .route("/{user_id}", get(get_user))
        .route("/{user_id}/subscribe", post(subscribe).delete(unsubscribe))
}

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    page: Option<u64>,
    limit: Option<u64>,
    is_subscribed: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionsQuery {
    page: Option<u64>,
    limit: Option<u64>,
    recipes_limit: Option<u64>,
}

async fn create_user(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    payload.validate()?;
    let user_model = services::create_user(&app_state.db_pool, &payload).await?;
    Ok((StatusCode::CREATED, Json(UserProfile::from_model(user_model, false))))
}

async fn list_users(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Page<UserProfile>>, AppError> {
    let page = services::list_users(
        &app_state.db_pool,
        auth_user.id,
        query.is_subscribed.unwrap_or(0) == 1,
        PageParams::new(query.page, query.limit),
    )
    .await?;
    Ok(Json(page))
}

async fn get_me(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<UserProfile>, AppError> {
    let user_model = services::get_user(&app_state.db_pool, auth_user.id).await?;
    Ok(Json(UserProfile::from_model(user_model, false)))
}

async fn update_me(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserProfile>, AppError> {
    payload.validate()?;
    let updated = services::update_user(&app_state.db_pool, auth_user.id, &payload).await?;
    Ok(Json(UserProfile::from_model(updated, false)))
}

async fn list_subscriptions(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<SubscriptionsQuery>,
) -> Result<Json<Page<Subscription>>, AppError> {
    let page = services::subscriptions(
        &app_state.db_pool,
        auth_user.id,
        query.recipes_limit,
        PageParams::new(query.page, query.limit),
    )
    .await?;
    Ok(Json(page))
}

async fn get_user(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = services::get_profile(&app_state.db_pool, auth_user.id, user_id).await?;
    Ok(Json(profile))
}

async fn subscribe(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(author_id): Path<i32>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    let author = services::follow_author(&app_state.db_pool, auth_user.id, author_id).await?;
    Ok((StatusCode::CREATED, Json(UserProfile::from_model(author, true))))
}

async fn unsubscribe(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(author_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    services::unfollow_author(&app_state.db_pool, auth_user.id, author_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
