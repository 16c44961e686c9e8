use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;

use crate::db::entities::tag;
use crate::db::is_unique_violation;
use crate::db::services::service_error::ServiceError;
use crate::web::models::TagRequest;

const DUPLICATE_SLUG: &str = "A tag with this slug already exists.";

/// Creates a new tag owned by `author_id`.
pub async fn create_tag(
    db: &DatabaseConnection,
    author_id: i32,
    req: &TagRequest,
) -> Result<tag::Model, ServiceError> {
    let new_tag = tag::ActiveModel {
        author_id: Set(author_id),
        name: Set(req.name.clone()),
        color: Set(req.color.clone()),
        slug: Set(req.slug.clone()),
        ..Default::default()
    };

    match new_tag.insert(db).await {
        Ok(tag_model) => {
            info!(tag_id = tag_model.id, slug = %tag_model.slug, "Tag created.");
            Ok(tag_model)
        }
        Err(e) if is_unique_violation(&e) => Err(ServiceError::Conflict(DUPLICATE_SLUG.to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Retrieves all tags, ordered by name.
pub async fn list_tags(db: &DatabaseConnection) -> Result<Vec<tag::Model>, ServiceError> {
    Ok(tag::Entity::find()
        .order_by_asc(tag::Column::Name)
        .all(db)
        .await?)
}

pub async fn get_tag(db: &DatabaseConnection, tag_id: i32) -> Result<tag::Model, ServiceError> {
    tag::Entity::find_by_id(tag_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Tag with ID {tag_id}")))
}

/// Updates a tag. Tags owned by someone else are reported as not found.
pub async fn update_tag(
    db: &DatabaseConnection,
    tag_id: i32,
    author_id: i32, // for authorization
    req: &TagRequest,
) -> Result<tag::Model, ServiceError> {
    let existing = tag::Entity::find_by_id(tag_id)
        .filter(tag::Column::AuthorId.eq(author_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Tag with ID {tag_id}")))?;

    let mut active_tag: tag::ActiveModel = existing.into();
    active_tag.name = Set(req.name.clone());
    active_tag.color = Set(req.color.clone());
    active_tag.slug = Set(req.slug.clone());

    match active_tag.update(db).await {
        Ok(updated) => Ok(updated),
        Err(e) if is_unique_violation(&e) => Err(ServiceError::Conflict(DUPLICATE_SLUG.to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Deletes a tag. The ON DELETE CASCADE in the DB will handle recipe_tags entries.
pub async fn delete_tag(
    db: &DatabaseConnection,
    tag_id: i32,
    author_id: i32,
) -> Result<(), ServiceError> {
    let result = tag::Entity::delete_many()
        .filter(tag::Column::Id.eq(tag_id))
        .filter(tag::Column::AuthorId.eq(author_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(ServiceError::NotFound(format!("Tag with ID {tag_id}")));
    }
    Ok(())
}
