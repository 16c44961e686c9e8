use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::info;

use crate::db::entities::{follow, recipe, user};
use crate::db::is_unique_violation;
use crate::db::models::{Page, PageParams, ShortRecipe, Subscription, UserProfile};
use crate::db::services::membership_service;
use crate::db::services::service_error::ServiceError;
use crate::web::models::{CreateUserRequest, UpdateUserRequest};

const DUPLICATE_USER: &str = "A user with this email or username already exists.";

/// Creates a user profile. Credentials are managed by the identity provider.
pub async fn create_user(
    db: &DatabaseConnection,
    req: &CreateUserRequest,
) -> Result<user::Model, ServiceError> {
    let new_user = user::ActiveModel {
        email: Set(req.email.clone()),
        username: Set(req.username.clone()),
        first_name: Set(req.first_name.clone()),
        last_name: Set(req.last_name.clone()),
        created_at: Set(Utc::now()),
        ..Default::default() // id is assigned by the database
    };

    match new_user.insert(db).await {
        Ok(user_model) => {
            info!(user_id = user_model.id, username = %user_model.username, "User created.");
            Ok(user_model)
        }
        Err(e) if is_unique_violation(&e) => Err(ServiceError::Conflict(DUPLICATE_USER.to_string())),
        Err(e) => Err(e.into()),
    }
}

pub async fn get_user(db: &DatabaseConnection, user_id: i32) -> Result<user::Model, ServiceError> {
    user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("User with ID {user_id}")))
}

/// Returns `user_id`'s profile with `is_subscribed` computed for `viewer_id`.
pub async fn get_profile(
    db: &DatabaseConnection,
    viewer_id: i32,
    user_id: i32,
) -> Result<UserProfile, ServiceError> {
    let user_model = get_user(db, user_id).await?;
    let is_subscribed =
        membership_service::contains::<follow::Entity, _>(db, viewer_id, user_id).await?;
    Ok(UserProfile::from_model(user_model, is_subscribed))
}

/// Lists users ordered by id. `only_subscribed` keeps the authors `viewer_id` follows.
pub async fn list_users(
    db: &DatabaseConnection,
    viewer_id: i32,
    only_subscribed: bool,
    params: PageParams,
) -> Result<Page<UserProfile>, ServiceError> {
    let mut condition = Condition::all();
    if only_subscribed {
        let followed = membership_service::list::<follow::Entity, _>(db, viewer_id).await?;
        if followed.is_empty() {
            return Ok(empty_page(params));
        }
        condition = condition.add(user::Column::Id.is_in(followed));
    }

    let paginator = user::Entity::find()
        .filter(condition)
        .order_by_asc(user::Column::Id)
        .paginate(db, params.limit);
    let count = paginator.num_items().await?;
    let users = paginator.fetch_page(params.page - 1).await?;

    let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
    let followed =
        membership_service::targets_among::<follow::Entity, _>(db, viewer_id, &ids).await?;

    let results = users
        .into_iter()
        .map(|u| {
            let is_subscribed = followed.contains(&u.id);
            UserProfile::from_model(u, is_subscribed)
        })
        .collect();

    Ok(Page {
        count,
        page: params.page,
        limit: params.limit,
        results,
    })
}

/// Applies a partial profile update to `user_id`.
pub async fn update_user(
    db: &DatabaseConnection,
    user_id: i32,
    req: &UpdateUserRequest,
) -> Result<user::Model, ServiceError> {
    let mut active_user: user::ActiveModel = get_user(db, user_id).await?.into();

    if let Some(email) = &req.email {
        active_user.email = Set(email.clone());
    }
    if let Some(username) = &req.username {
        active_user.username = Set(username.clone());
    }
    if let Some(first_name) = &req.first_name {
        active_user.first_name = Set(first_name.clone());
    }
    if let Some(last_name) = &req.last_name {
        active_user.last_name = Set(last_name.clone());
    }

    if !active_user.is_changed() {
        return get_user(db, user_id).await;
    }

    match active_user.update(db).await {
        Ok(updated) => Ok(updated),
        Err(e) if is_unique_violation(&e) => Err(ServiceError::Conflict(DUPLICATE_USER.to_string())),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, FromQueryResult)]
struct AuthorRecipeCount {
    author_id: i32,
    recipes_count: i64,
}

/// Authors `viewer_id` follows, each with their newest recipes.
///
/// `recipes_limit` caps the preview list; `recipes_count` is always the full count.
pub async fn subscriptions(
    db: &DatabaseConnection,
    viewer_id: i32,
    recipes_limit: Option<u64>,
    params: PageParams,
) -> Result<Page<Subscription>, ServiceError> {
    let followed = membership_service::list::<follow::Entity, _>(db, viewer_id).await?;
    if followed.is_empty() {
        return Ok(empty_page(params));
    }

    let paginator = user::Entity::find()
        .filter(user::Column::Id.is_in(followed))
        .order_by_asc(user::Column::Id)
        .paginate(db, params.limit);
    let count = paginator.num_items().await?;
    let authors = paginator.fetch_page(params.page - 1).await?;

    let author_ids: Vec<i32> = authors.iter().map(|a| a.id).collect();

    let counts: HashMap<i32, u64> = recipe::Entity::find()
        .select_only()
        .column(recipe::Column::AuthorId)
        .column_as(Expr::col(recipe::Column::Id).count(), "recipes_count")
        .filter(recipe::Column::AuthorId.is_in(author_ids.clone()))
        .group_by(recipe::Column::AuthorId)
        .into_model::<AuthorRecipeCount>()
        .all(db)
        .await?
        .into_iter()
        .map(|row| (row.author_id, row.recipes_count.max(0) as u64))
        .collect();

    let mut recipes_by_author: HashMap<i32, Vec<ShortRecipe>> = HashMap::new();
    let recipes = recipe::Entity::find()
        .filter(recipe::Column::AuthorId.is_in(author_ids))
        .order_by_desc(recipe::Column::Id)
        .all(db)
        .await?;
    for row in recipes {
        let preview = recipes_by_author.entry(row.author_id).or_default();
        if recipes_limit.map_or(true, |limit| (preview.len() as u64) < limit) {
            preview.push(ShortRecipe::from(row));
        }
    }

    let results = authors
        .into_iter()
        .map(|author| Subscription {
            recipes: recipes_by_author.remove(&author.id).unwrap_or_default(),
            recipes_count: counts.get(&author.id).copied().unwrap_or(0),
            author: UserProfile::from_model(author, true),
        })
        .collect();

    Ok(Page {
        count,
        page: params.page,
        limit: params.limit,
        results,
    })
}

fn empty_page<T>(params: PageParams) -> Page<T> {
    Page {
        count: 0,
        page: params.page,
        limit: params.limit,
        results: Vec::new(),
    }
}
