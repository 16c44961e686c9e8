use axum::{
    body::Body as AxumBody,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{DecodingKey, Validation, decode};
use sea_orm::EntityTrait;
use std::sync::Arc;
use tracing::warn;

use crate::db::entities::user;
use crate::web::models::{AuthenticatedUser, Claims};
use crate::web::{AppState, error::AppError};

/// Resolves the caller from a Bearer token or the `token` cookie.
///
/// The user named by the token must still exist.
pub async fn auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut req: Request<AxumBody>,
    next: Next,
) -> Result<Response, AppError> {
    let jwt_secret = &state.config.jwt_secret;

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|s| s.to_string())
        .or_else(|| jar.get("token").map(|c| c.value().to_string()))
        .ok_or(AppError::InvalidCredentials)?;

    let token_data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|e| {
        warn!(error = ?e, "JWT decoding error during auth middleware.");
        AppError::InvalidCredentials
    })?;

    let user_id = token_data.claims.user_id;
    let Some(user_model) = user::Entity::find_by_id(user_id).one(&state.db_pool).await? else {
        warn!(user_id, "Token refers to an unknown user.");
        return Err(AppError::InvalidCredentials);
    };

    req.extensions_mut().insert(AuthenticatedUser {
        id: user_model.id,
        username: user_model.username,
    });
    Ok(next.run(req).await)
}
