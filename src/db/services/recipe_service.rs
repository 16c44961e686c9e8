//! Recipe CRUD.
//!
//! Tags and ingredient lines of a recipe are always written as a whole: an
//! update deletes every `recipe_tags` and `ingredient_amounts` row of the
//! recipe and inserts the submitted lists, inside one transaction. Lines are
//! never patched one by one.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{debug, info};

use crate::db::entities::{
    cart, favourite, follow, ingredient, ingredient_amount, recipe, recipe_tag, tag, user,
};
use crate::db::models::{Page, PageParams, RecipeDetails, RecipeIngredient, UserProfile};
use crate::db::services::membership_service;
use crate::db::services::service_error::ServiceError;
use crate::services::validation::ValidationError;
use crate::web::models::RecipeRequest;

/// Filters accepted by [`list_recipes`]. All set filters must match.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub author: Option<i32>,
    /// Tag slugs; a recipe matches when it carries any of them.
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

pub async fn create_recipe(
    db: &DatabaseConnection,
    author_id: i32,
    req: &RecipeRequest,
) -> Result<RecipeDetails, ServiceError> {
    let txn = db.begin().await?;

    let recipe_model = recipe::ActiveModel {
        author_id: Set(author_id),
        name: Set(req.name.clone()),
        text: Set(req.text.clone()),
        cooking_time: Set(req.cooking_time),
        image_ref: Set(req.image_ref.clone()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    write_tags_and_ingredients(&txn, recipe_model.id, req).await?;
    txn.commit().await?;

    info!(recipe_id = recipe_model.id, author_id, "Recipe created.");
    get_recipe(db, author_id, recipe_model.id).await
}

/// Replaces a recipe wholesale. Recipes of other authors are reported as not found.
pub async fn update_recipe(
    db: &DatabaseConnection,
    recipe_id: i32,
    author_id: i32,
    req: &RecipeRequest,
) -> Result<RecipeDetails, ServiceError> {
    let txn = db.begin().await?;

    let existing = recipe::Entity::find_by_id(recipe_id)
        .filter(recipe::Column::AuthorId.eq(author_id))
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Recipe with ID {recipe_id}")))?;

    let mut active_recipe: recipe::ActiveModel = existing.into();
    active_recipe.name = Set(req.name.clone());
    active_recipe.text = Set(req.text.clone());
    active_recipe.cooking_time = Set(req.cooking_time);
    active_recipe.image_ref = Set(req.image_ref.clone());
    active_recipe.update(&txn).await?;

    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    ingredient_amount::Entity::delete_many()
        .filter(ingredient_amount::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    write_tags_and_ingredients(&txn, recipe_id, req).await?;
    txn.commit().await?;

    info!(recipe_id, author_id, "Recipe replaced.");
    get_recipe(db, author_id, recipe_id).await
}

pub async fn delete_recipe(
    db: &DatabaseConnection,
    recipe_id: i32,
    author_id: i32,
) -> Result<(), ServiceError> {
    let result = recipe::Entity::delete_many()
        .filter(recipe::Column::Id.eq(recipe_id))
        .filter(recipe::Column::AuthorId.eq(author_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(ServiceError::NotFound(format!("Recipe with ID {recipe_id}")));
    }
    info!(recipe_id, author_id, "Recipe deleted.");
    Ok(())
}

pub async fn get_recipe(
    db: &DatabaseConnection,
    viewer_id: i32,
    recipe_id: i32,
) -> Result<RecipeDetails, ServiceError> {
    let recipe_model = recipe::Entity::find_by_id(recipe_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Recipe with ID {recipe_id}")))?;

    let mut details = load_details(db, viewer_id, vec![recipe_model]).await?;
    details
        .pop()
        .ok_or_else(|| ServiceError::NotFound(format!("Recipe with ID {recipe_id}")))
}

/// Lists recipes newest first.
pub async fn list_recipes(
    db: &DatabaseConnection,
    viewer_id: i32,
    filter: &RecipeFilter,
    params: PageParams,
) -> Result<Page<RecipeDetails>, ServiceError> {
    let empty = || Page {
        count: 0,
        page: params.page,
        limit: params.limit,
        results: Vec::new(),
    };

    let mut condition = Condition::all();
    if let Some(author_id) = filter.author {
        condition = condition.add(recipe::Column::AuthorId.eq(author_id));
    }
    if !filter.tags.is_empty() {
        let tag_ids: Vec<i32> = tag::Entity::find()
            .filter(tag::Column::Slug.is_in(filter.tags.iter().cloned()))
            .all(db)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();
        let recipe_ids: BTreeSet<i32> = recipe_tag::Entity::find()
            .filter(recipe_tag::Column::TagId.is_in(tag_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|rt| rt.recipe_id)
            .collect();
        if recipe_ids.is_empty() {
            return Ok(empty());
        }
        condition = condition.add(recipe::Column::Id.is_in(recipe_ids));
    }
    if filter.is_favorited {
        let ids = membership_service::list::<favourite::Entity, _>(db, viewer_id).await?;
        if ids.is_empty() {
            return Ok(empty());
        }
        condition = condition.add(recipe::Column::Id.is_in(ids));
    }
    if filter.is_in_shopping_cart {
        let ids = membership_service::list::<cart::Entity, _>(db, viewer_id).await?;
        if ids.is_empty() {
            return Ok(empty());
        }
        condition = condition.add(recipe::Column::Id.is_in(ids));
    }

    let paginator = recipe::Entity::find()
        .filter(condition)
        .order_by_desc(recipe::Column::Id)
        .paginate(db, params.limit);
    let count = paginator.num_items().await?;
    let recipes = paginator.fetch_page(params.page - 1).await?;
    debug!(count, page = params.page, "Listed recipes.");

    Ok(Page {
        count,
        page: params.page,
        limit: params.limit,
        results: load_details(db, viewer_id, recipes).await?,
    })
}

async fn write_tags_and_ingredients(
    txn: &DatabaseTransaction,
    recipe_id: i32,
    req: &RecipeRequest,
) -> Result<(), ServiceError> {
    let tag_ids: BTreeSet<i32> = req.tags.iter().copied().collect();
    if !tag_ids.is_empty() {
        let found = tag::Entity::find()
            .filter(tag::Column::Id.is_in(tag_ids.iter().copied()))
            .all(txn)
            .await?;
        if let Some(missing) = first_missing(&tag_ids, found.iter().map(|t| t.id)) {
            return Err(ValidationError::new("tags", format!("Tag {missing} does not exist.")).into());
        }
        recipe_tag::Entity::insert_many(tag_ids.iter().map(|&tag_id| recipe_tag::ActiveModel {
            recipe_id: Set(recipe_id),
            tag_id: Set(tag_id),
        }))
        .exec_without_returning(txn)
        .await?;
    }

    if req.ingredients.is_empty() {
        return Ok(());
    }
    let ingredient_ids: BTreeSet<i32> = req.ingredients.iter().map(|line| line.id).collect();
    let found = ingredient::Entity::find()
        .filter(ingredient::Column::Id.is_in(ingredient_ids.iter().copied()))
        .all(txn)
        .await?;
    if let Some(missing) = first_missing(&ingredient_ids, found.iter().map(|i| i.id)) {
        return Err(ValidationError::new(
            "ingredients",
            format!("Ingredient {missing} does not exist."),
        )
        .into());
    }
    ingredient_amount::Entity::insert_many(req.ingredients.iter().map(|line| {
        ingredient_amount::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(line.id),
            amount: Set(line.amount),
        }
    }))
    .exec_without_returning(txn)
    .await?;

    Ok(())
}

fn first_missing(wanted: &BTreeSet<i32>, found: impl Iterator<Item = i32>) -> Option<i32> {
    let found: HashSet<i32> = found.collect();
    wanted.iter().copied().find(|id| !found.contains(id))
}

/// Resolves authors, tags, ingredient lines and the viewer's flags for a
/// batch of recipes, keeping the input order.
async fn load_details<C: ConnectionTrait>(
    db: &C,
    viewer_id: i32,
    recipes: Vec<recipe::Model>,
) -> Result<Vec<RecipeDetails>, ServiceError> {
    if recipes.is_empty() {
        return Ok(Vec::new());
    }
    let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
    let author_ids: Vec<i32> = recipes
        .iter()
        .map(|r| r.author_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let authors: HashMap<i32, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(author_ids.iter().copied()))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let followed =
        membership_service::targets_among::<follow::Entity, _>(db, viewer_id, &author_ids).await?;
    let favourited =
        membership_service::targets_among::<favourite::Entity, _>(db, viewer_id, &recipe_ids)
            .await?;
    let in_cart =
        membership_service::targets_among::<cart::Entity, _>(db, viewer_id, &recipe_ids).await?;

    let mut tags_by_recipe: HashMap<i32, Vec<tag::Model>> = HashMap::new();
    for (link, tag_model) in recipe_tag::Entity::find()
        .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.iter().copied()))
        .find_also_related(tag::Entity)
        .all(db)
        .await?
    {
        if let Some(tag_model) = tag_model {
            tags_by_recipe.entry(link.recipe_id).or_default().push(tag_model);
        }
    }

    let mut ingredients_by_recipe: HashMap<i32, Vec<RecipeIngredient>> = HashMap::new();
    for (line, ingredient_model) in ingredient_amount::Entity::find()
        .filter(ingredient_amount::Column::RecipeId.is_in(recipe_ids.iter().copied()))
        .find_also_related(ingredient::Entity)
        .all(db)
        .await?
    {
        if let Some(ingredient_model) = ingredient_model {
            ingredients_by_recipe
                .entry(line.recipe_id)
                .or_default()
                .push(RecipeIngredient::new(ingredient_model, line.amount));
        }
    }

    let mut details = Vec::with_capacity(recipes.len());
    for recipe_model in recipes {
        let author = authors.get(&recipe_model.author_id).cloned().ok_or_else(|| {
            ServiceError::NotFound(format!("Author of recipe {}", recipe_model.id))
        })?;
        let mut tags = tags_by_recipe.remove(&recipe_model.id).unwrap_or_default();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        let mut ingredients = ingredients_by_recipe
            .remove(&recipe_model.id)
            .unwrap_or_default();
        ingredients.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.measurement_unit.cmp(&b.measurement_unit))
        });

        details.push(RecipeDetails {
            id: recipe_model.id,
            author: UserProfile::from_model(author, followed.contains(&recipe_model.author_id)),
            name: recipe_model.name,
            text: recipe_model.text,
            cooking_time: recipe_model.cooking_time,
            image_ref: recipe_model.image_ref,
            tags,
            ingredients,
            is_favorited: favourited.contains(&recipe_model.id),
            is_in_shopping_cart: in_cart.contains(&recipe_model.id),
            created_at: recipe_model.created_at,
        });
    }
    Ok(details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::services::membership_service::{add_favourite, add_to_cart, follow_author};
    use crate::db::services::tag_service::create_tag;
    use crate::db::test_support::{memory_db, seed_ingredient, seed_user};
    use crate::web::models::{IngredientAmountRequest, TagRequest};

    fn request(name: &str, tags: Vec<i32>, ingredients: &[(i32, i32)]) -> RecipeRequest {
        RecipeRequest {
            name: name.to_string(),
            text: "Cook it.".to_string(),
            cooking_time: 20,
            image_ref: Some("recipes/photo.png".to_string()),
            tags,
            ingredients: ingredients
                .iter()
                .map(|&(id, amount)| IngredientAmountRequest { id, amount })
                .collect(),
        }
    }

    async fn tag(db: &DatabaseConnection, author_id: i32, slug: &str) -> tag::Model {
        let req = TagRequest {
            name: slug.to_uppercase(),
            color: "#fff".to_string(),
            slug: slug.to_string(),
        };
        create_tag(db, author_id, &req).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_returns_full_details() {
        let db = memory_db().await;
        let author = seed_user(&db, "chef").await;
        let lunch = tag(&db, author.id, "lunch").await;
        let flour = seed_ingredient(&db, "flour", "g").await;
        let egg = seed_ingredient(&db, "egg", "pcs").await;

        let created = create_recipe(
            &db,
            author.id,
            &request("Pasta", vec![lunch.id], &[(flour.id, 300), (egg.id, 3)]),
        )
        .await
        .unwrap();

        assert_eq!(created.author.id, author.id);
        assert_eq!(created.tags, vec![lunch]);
        let lines: Vec<(&str, i32)> = created
            .ingredients
            .iter()
            .map(|i| (i.name.as_str(), i.amount))
            .collect();
        assert_eq!(lines, vec![("egg", 3), ("flour", 300)]);
        assert!(!created.is_favorited);
        assert!(!created.is_in_shopping_cart);
    }

    #[tokio::test]
    async fn test_unknown_ingredient_rolls_back_the_recipe() {
        let db = memory_db().await;
        let author = seed_user(&db, "chef").await;

        let err = create_recipe(&db, author.id, &request("Ghost", vec![], &[(99, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)), "got {err:?}");

        let page = list_recipes(&db, author.id, &RecipeFilter::default(), PageParams::default())
            .await
            .unwrap();
        assert_eq!(page.count, 0);
    }

    #[tokio::test]
    async fn test_update_replaces_ingredients_wholesale() {
        let db = memory_db().await;
        let author = seed_user(&db, "chef").await;
        let flour = seed_ingredient(&db, "flour", "g").await;
        let egg = seed_ingredient(&db, "egg", "pcs").await;
        let milk = seed_ingredient(&db, "milk", "ml").await;
        let created = create_recipe(
            &db,
            author.id,
            &request("Batter", vec![], &[(flour.id, 100), (egg.id, 1)]),
        )
        .await
        .unwrap();

        let updated = update_recipe(
            &db,
            created.id,
            author.id,
            &request("Batter v2", vec![], &[(milk.id, 250)]),
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "Batter v2");
        assert_eq!(updated.ingredients.len(), 1);
        assert_eq!(updated.ingredients[0].id, milk.id);
        assert_eq!(updated.ingredients[0].amount, 250);
    }

    #[tokio::test]
    async fn test_only_author_can_update_or_delete() {
        let db = memory_db().await;
        let author = seed_user(&db, "chef").await;
        let intruder = seed_user(&db, "intruder").await;
        let flour = seed_ingredient(&db, "flour", "g").await;
        let created = create_recipe(&db, author.id, &request("Bread", vec![], &[(flour.id, 500)]))
            .await
            .unwrap();

        let err = update_recipe(&db, created.id, intruder.id, &request("Mine", vec![], &[(flour.id, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        let err = delete_recipe(&db, created.id, intruder.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        delete_recipe(&db, created.id, author.id).await.unwrap();
        assert!(matches!(
            get_recipe(&db, author.id, created.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_viewer_flags_use_recipe_and_viewer() {
        let db = memory_db().await;
        let author = seed_user(&db, "chef").await;
        let viewer = seed_user(&db, "viewer").await;
        let flour = seed_ingredient(&db, "flour", "g").await;
        let first = create_recipe(&db, author.id, &request("First", vec![], &[(flour.id, 1)]))
            .await
            .unwrap();
        let second = create_recipe(&db, author.id, &request("Second", vec![], &[(flour.id, 2)]))
            .await
            .unwrap();

        add_to_cart(&db, viewer.id, second.id).await.unwrap();
        add_favourite(&db, viewer.id, first.id).await.unwrap();
        follow_author(&db, viewer.id, author.id).await.unwrap();

        let seen_first = get_recipe(&db, viewer.id, first.id).await.unwrap();
        assert!(seen_first.is_favorited);
        assert!(!seen_first.is_in_shopping_cart);
        assert!(seen_first.author.is_subscribed);

        let seen_second = get_recipe(&db, viewer.id, second.id).await.unwrap();
        assert!(!seen_second.is_favorited);
        assert!(seen_second.is_in_shopping_cart);

        // The author's own view carries none of the viewer's flags.
        let own = get_recipe(&db, author.id, second.id).await.unwrap();
        assert!(!own.is_in_shopping_cart);
        assert!(!own.author.is_subscribed);
    }

    #[tokio::test]
    async fn test_page_far_past_the_end_is_empty() {
        let db = memory_db().await;
        let author = seed_user(&db, "chef").await;
        let flour = seed_ingredient(&db, "flour", "g").await;
        create_recipe(&db, author.id, &request("Bread", vec![], &[(flour.id, 500)]))
            .await
            .unwrap();

        let page = list_recipes(
            &db,
            author.id,
            &RecipeFilter::default(),
            PageParams::new(Some(u64::MAX / 2), Some(6)),
        )
        .await
        .unwrap();
        assert_eq!(page.count, 1);
        assert!(page.results.is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_and_ordering() {
        let db = memory_db().await;
        let author = seed_user(&db, "chef").await;
        let other = seed_user(&db, "other").await;
        let soup = tag(&db, author.id, "soup").await;
        let flour = seed_ingredient(&db, "flour", "g").await;

        let borscht = create_recipe(&db, author.id, &request("Borscht", vec![soup.id], &[(flour.id, 1)]))
            .await
            .unwrap();
        let pie = create_recipe(&db, author.id, &request("Pie", vec![], &[(flour.id, 2)]))
            .await
            .unwrap();
        let cake = create_recipe(&db, other.id, &request("Cake", vec![], &[(flour.id, 3)]))
            .await
            .unwrap();
        add_to_cart(&db, other.id, pie.id).await.unwrap();

        let all = list_recipes(&db, other.id, &RecipeFilter::default(), PageParams::default())
            .await
            .unwrap();
        let ids: Vec<i32> = all.results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![cake.id, pie.id, borscht.id]);

        let by_author = RecipeFilter {
            author: Some(author.id),
            ..Default::default()
        };
        assert_eq!(
            list_recipes(&db, other.id, &by_author, PageParams::default())
                .await
                .unwrap()
                .count,
            2
        );

        let by_tag = RecipeFilter {
            tags: vec!["soup".to_string(), "unknown".to_string()],
            ..Default::default()
        };
        let tagged = list_recipes(&db, other.id, &by_tag, PageParams::default())
            .await
            .unwrap();
        assert_eq!(tagged.results.len(), 1);
        assert_eq!(tagged.results[0].id, borscht.id);

        let carted = RecipeFilter {
            is_in_shopping_cart: true,
            ..Default::default()
        };
        let carted = list_recipes(&db, other.id, &carted, PageParams::default())
            .await
            .unwrap();
        assert_eq!(carted.count, 1);
        assert!(carted.results[0].is_in_shopping_cart);

        let favorited = RecipeFilter {
            is_favorited: true,
            ..Default::default()
        };
        assert_eq!(
            list_recipes(&db, other.id, &favorited, PageParams::default())
                .await
                .unwrap()
                .count,
            0
        );

        let second_page = list_recipes(&db, other.id, &RecipeFilter::default(), PageParams::new(Some(2), Some(2)))
            .await
            .unwrap();
        assert_eq!(second_page.count, 3);
        assert_eq!(second_page.results.len(), 1);
        assert_eq!(second_page.results[0].id, borscht.id);
    }
}
