use axum::{
    http::Method,
    middleware as axum_middleware,
    routing::get,
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::server::config::ServerConfig;
use crate::web::{middleware::auth, routes::*};

pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;

pub use error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DatabaseConnection,
    pub config: Arc<ServerConfig>,
}

async fn health_check_handler() -> &'static str {
    "OK"
}

pub fn create_axum_router(db_pool: DatabaseConnection, config: Arc<ServerConfig>) -> Router {
    let app_state = Arc::new(AppState { db_pool, config });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check_handler))
        .nest(
            "/api/users",
            user_routes::create_public_router().merge(
                user_routes::create_protected_router()
                    .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth)),
            ),
        )
        .nest(
            "/api/tags",
            tag_routes::create_tags_router()
                .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth)),
        )
        .nest(
            "/api/ingredients",
            ingredient_routes::create_ingredients_router()
                .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth)),
        )
        .nest(
            "/api/recipes",
            recipe_routes::create_recipes_router()
                .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth)),
        )
        .with_state(app_state)
        .layer(cors)
}
