//! Add / remove / list for the user membership tables (cart, favourites,
//! follows).
//!
//! Every join table keys on `(user, target)`, so duplicates are rejected by
//! the store. `add` inserts straight away and treats the uniqueness violation
//! as [`MembershipError::AlreadyExists`]; two concurrent adds of the same pair
//! therefore end with one success and one `AlreadyExists`.

use std::collections::HashSet;

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info};

use crate::db::entities::{cart, favourite, follow, recipe, user};
use crate::db::is_unique_violation;
use crate::db::models::ShortRecipe;

#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
    #[error("{0} already exists")]
    AlreadyExists(&'static str),
    #[error("{0} does not exist")]
    NotFound(&'static str),
    #[error("You cannot follow or unfollow yourself")]
    SelfFollow,
    #[error("{0} with ID {1} not found")]
    TargetNotFound(&'static str, i32),
}

/// A join table relating a user to a target (a recipe or another user).
pub trait Membership: EntityTrait {
    /// Used in error messages, e.g. "Shopping cart entry already exists".
    const LABEL: &'static str;

    fn user_column() -> Self::Column;
    fn target_column() -> Self::Column;
    fn new_row(user_id: i32, target_id: i32) -> Self::ActiveModel;
    fn target_id(model: &Self::Model) -> i32;
}

impl Membership for cart::Entity {
    const LABEL: &'static str = "Shopping cart entry";

    fn user_column() -> cart::Column {
        cart::Column::UserId
    }
    fn target_column() -> cart::Column {
        cart::Column::RecipeId
    }
    fn new_row(user_id: i32, target_id: i32) -> cart::ActiveModel {
        cart::ActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(target_id),
        }
    }
    fn target_id(model: &cart::Model) -> i32 {
        model.recipe_id
    }
}

impl Membership for favourite::Entity {
    const LABEL: &'static str = "Favourite";

    fn user_column() -> favourite::Column {
        favourite::Column::UserId
    }
    fn target_column() -> favourite::Column {
        favourite::Column::RecipeId
    }
    fn new_row(user_id: i32, target_id: i32) -> favourite::ActiveModel {
        favourite::ActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(target_id),
        }
    }
    fn target_id(model: &favourite::Model) -> i32 {
        model.recipe_id
    }
}

impl Membership for follow::Entity {
    const LABEL: &'static str = "Subscription";

    fn user_column() -> follow::Column {
        follow::Column::UserId
    }
    fn target_column() -> follow::Column {
        follow::Column::AuthorId
    }
    fn new_row(user_id: i32, target_id: i32) -> follow::ActiveModel {
        follow::ActiveModel {
            user_id: Set(user_id),
            author_id: Set(target_id),
        }
    }
    fn target_id(model: &follow::Model) -> i32 {
        model.author_id
    }
}

// --- Generic operations ---

pub async fn add<E, C>(db: &C, user_id: i32, target_id: i32) -> Result<(), MembershipError>
where
    E: Membership,
    E::Model: IntoActiveModel<E::ActiveModel>,
    C: ConnectionTrait,
{
    match E::insert(E::new_row(user_id, target_id))
        .exec_without_returning(db)
        .await
    {
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => Err(MembershipError::AlreadyExists(E::LABEL)),
        Err(err) => Err(err.into()),
    }
}

pub async fn remove<E, C>(db: &C, user_id: i32, target_id: i32) -> Result<(), MembershipError>
where
    E: Membership,
    C: ConnectionTrait,
{
    let result = E::delete_many()
        .filter(E::user_column().eq(user_id))
        .filter(E::target_column().eq(target_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(MembershipError::NotFound(E::LABEL));
    }
    Ok(())
}

/// All target ids of `user_id`, ascending.
pub async fn list<E, C>(db: &C, user_id: i32) -> Result<Vec<i32>, DbErr>
where
    E: Membership,
    C: ConnectionTrait,
{
    let rows = E::find()
        .filter(E::user_column().eq(user_id))
        .order_by_asc(E::target_column())
        .all(db)
        .await?;
    Ok(rows.iter().map(E::target_id).collect())
}

pub async fn contains<E, C>(db: &C, user_id: i32, target_id: i32) -> Result<bool, DbErr>
where
    E: Membership,
    C: ConnectionTrait,
{
    let row = E::find()
        .filter(E::user_column().eq(user_id))
        .filter(E::target_column().eq(target_id))
        .one(db)
        .await?;
    Ok(row.is_some())
}

/// The subset of `candidates` that `user_id` is a member of.
pub async fn targets_among<E, C>(
    db: &C,
    user_id: i32,
    candidates: &[i32],
) -> Result<HashSet<i32>, DbErr>
where
    E: Membership,
    C: ConnectionTrait,
{
    if candidates.is_empty() {
        return Ok(HashSet::new());
    }
    let rows = E::find()
        .filter(E::user_column().eq(user_id))
        .filter(E::target_column().is_in(candidates.iter().copied()))
        .all(db)
        .await?;
    Ok(rows.iter().map(E::target_id).collect())
}

// --- Recipe memberships (cart, favourites) ---

async fn add_recipe_membership<E>(
    db: &DatabaseConnection,
    user_id: i32,
    recipe_id: i32,
) -> Result<ShortRecipe, MembershipError>
where
    E: Membership,
    E::Model: IntoActiveModel<E::ActiveModel>,
{
    let txn = db.begin().await?;
    let recipe = recipe::Entity::find_by_id(recipe_id)
        .one(&txn)
        .await?
        .ok_or(MembershipError::TargetNotFound("Recipe", recipe_id))?;
    add::<E, _>(&txn, user_id, recipe_id).await?;
    txn.commit().await?;

    info!(user_id, recipe_id, membership = E::LABEL, "Membership added.");
    Ok(recipe.into())
}

async fn remove_recipe_membership<E>(
    db: &DatabaseConnection,
    user_id: i32,
    recipe_id: i32,
) -> Result<(), MembershipError>
where
    E: Membership,
{
    let txn = db.begin().await?;
    if recipe::Entity::find_by_id(recipe_id).one(&txn).await?.is_none() {
        return Err(MembershipError::TargetNotFound("Recipe", recipe_id));
    }
    remove::<E, _>(&txn, user_id, recipe_id).await?;
    txn.commit().await?;

    info!(user_id, recipe_id, membership = E::LABEL, "Membership removed.");
    Ok(())
}

pub async fn add_to_cart(
    db: &DatabaseConnection,
    user_id: i32,
    recipe_id: i32,
) -> Result<ShortRecipe, MembershipError> {
    add_recipe_membership::<cart::Entity>(db, user_id, recipe_id).await
}

pub async fn remove_from_cart(
    db: &DatabaseConnection,
    user_id: i32,
    recipe_id: i32,
) -> Result<(), MembershipError> {
    remove_recipe_membership::<cart::Entity>(db, user_id, recipe_id).await
}

pub async fn list_cart(db: &DatabaseConnection, user_id: i32) -> Result<Vec<i32>, MembershipError> {
    Ok(list::<cart::Entity, _>(db, user_id).await?)
}

pub async fn add_favourite(
    db: &DatabaseConnection,
    user_id: i32,
    recipe_id: i32,
) -> Result<ShortRecipe, MembershipError> {
    add_recipe_membership::<favourite::Entity>(db, user_id, recipe_id).await
}

pub async fn remove_favourite(
    db: &DatabaseConnection,
    user_id: i32,
    recipe_id: i32,
) -> Result<(), MembershipError> {
    remove_recipe_membership::<favourite::Entity>(db, user_id, recipe_id).await
}

pub async fn list_favourites(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<i32>, MembershipError> {
    Ok(list::<favourite::Entity, _>(db, user_id).await?)
}

// --- Follows ---

/// Subscribes `user_id` to `author_id` and returns the author.
pub async fn follow_author(
    db: &DatabaseConnection,
    user_id: i32,
    author_id: i32,
) -> Result<user::Model, MembershipError> {
    if user_id == author_id {
        return Err(MembershipError::SelfFollow);
    }

    let txn = db.begin().await?;
    let author = user::Entity::find_by_id(author_id)
        .one(&txn)
        .await?
        .ok_or(MembershipError::TargetNotFound("User", author_id))?;
    add::<follow::Entity, _>(&txn, user_id, author_id).await?;
    txn.commit().await?;

    info!(user_id, author_id, "User subscribed to author.");
    Ok(author)
}

pub async fn unfollow_author(
    db: &DatabaseConnection,
    user_id: i32,
    author_id: i32,
) -> Result<(), MembershipError> {
    if user_id == author_id {
        return Err(MembershipError::SelfFollow);
    }

    let txn = db.begin().await?;
    if user::Entity::find_by_id(author_id).one(&txn).await?.is_none() {
        return Err(MembershipError::TargetNotFound("User", author_id));
    }
    remove::<follow::Entity, _>(&txn, user_id, author_id).await?;
    txn.commit().await?;

    debug!(user_id, author_id, "User unsubscribed from author.");
    Ok(())
}

pub async fn list_following(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<i32>, MembershipError> {
    Ok(list::<follow::Entity, _>(db, user_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{memory_db, seed_recipe, seed_user};

    #[tokio::test]
    async fn test_cart_add_twice_reports_already_exists() {
        let db = memory_db().await;
        let user = seed_user(&db, "cook").await;
        let recipe = seed_recipe(&db, user.id, "Omelette", &[]).await;

        let short = add_to_cart(&db, user.id, recipe.id).await.unwrap();
        assert_eq!(short.id, recipe.id);

        let err = add_to_cart(&db, user.id, recipe.id).await.unwrap_err();
        assert!(matches!(err, MembershipError::AlreadyExists(_)), "got {err:?}");
        assert_eq!(list_cart(&db, user.id).await.unwrap(), vec![recipe.id]);
    }

    #[tokio::test]
    async fn test_remove_absent_entry_reports_not_found() {
        let db = memory_db().await;
        let user = seed_user(&db, "cook").await;
        let recipe = seed_recipe(&db, user.id, "Omelette", &[]).await;

        let err = remove_from_cart(&db, user.id, recipe.id).await.unwrap_err();
        assert!(matches!(err, MembershipError::NotFound(_)), "got {err:?}");

        add_to_cart(&db, user.id, recipe.id).await.unwrap();
        remove_from_cart(&db, user.id, recipe.id).await.unwrap();
        assert!(list_cart(&db, user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_recipe_is_target_not_found() {
        let db = memory_db().await;
        let user = seed_user(&db, "cook").await;

        let err = add_favourite(&db, user.id, 999).await.unwrap_err();
        assert!(matches!(err, MembershipError::TargetNotFound("Recipe", 999)));
        let err = remove_favourite(&db, user.id, 999).await.unwrap_err();
        assert!(matches!(err, MembershipError::TargetNotFound("Recipe", 999)));
    }

    #[tokio::test]
    async fn test_cart_and_favourites_are_independent() {
        let db = memory_db().await;
        let user = seed_user(&db, "cook").await;
        let recipe = seed_recipe(&db, user.id, "Omelette", &[]).await;

        add_favourite(&db, user.id, recipe.id).await.unwrap();
        assert!(contains::<favourite::Entity, _>(&db, user.id, recipe.id).await.unwrap());
        assert!(!contains::<cart::Entity, _>(&db, user.id, recipe.id).await.unwrap());
        assert_eq!(list_favourites(&db, user.id).await.unwrap(), vec![recipe.id]);
    }

    #[tokio::test]
    async fn test_follow_rules() {
        let db = memory_db().await;
        let reader = seed_user(&db, "reader").await;
        let author = seed_user(&db, "author").await;

        let err = follow_author(&db, reader.id, reader.id).await.unwrap_err();
        assert!(matches!(err, MembershipError::SelfFollow));

        let followed = follow_author(&db, reader.id, author.id).await.unwrap();
        assert_eq!(followed.id, author.id);
        let err = follow_author(&db, reader.id, author.id).await.unwrap_err();
        assert!(matches!(err, MembershipError::AlreadyExists(_)));
        assert_eq!(list_following(&db, reader.id).await.unwrap(), vec![author.id]);

        let err = follow_author(&db, reader.id, 4242).await.unwrap_err();
        assert!(matches!(err, MembershipError::TargetNotFound("User", 4242)));

        unfollow_author(&db, reader.id, author.id).await.unwrap();
        let err = unfollow_author(&db, reader.id, author.id).await.unwrap_err();
        assert!(matches!(err, MembershipError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_targets_among_filters_candidates() {
        let db = memory_db().await;
        let user = seed_user(&db, "cook").await;
        let first = seed_recipe(&db, user.id, "First", &[]).await;
        let second = seed_recipe(&db, user.id, "Second", &[]).await;
        add_to_cart(&db, user.id, second.id).await.unwrap();

        let in_cart = targets_among::<cart::Entity, _>(&db, user.id, &[first.id, second.id])
            .await
            .unwrap();
        assert_eq!(in_cart, HashSet::from([second.id]));
        assert!(targets_among::<cart::Entity, _>(&db, user.id, &[])
            .await
            .unwrap()
            .is_empty());
    }
}
