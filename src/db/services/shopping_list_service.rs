//! Shopping list aggregation.
//!
//! Collects every ingredient line of the recipes in a user's cart and sums the
//! amounts per `(ingredient name, measurement unit)`. Two ingredients with the
//! same name but different units stay separate lines.

use std::collections::BTreeMap;

use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QuerySelect, RelationTrait, TransactionTrait,
};
use tracing::debug;

use crate::db::entities::{cart, ingredient, ingredient_amount};
use crate::db::models::ShoppingListItem;
use crate::db::services::membership_service;

#[derive(Debug, thiserror::Error)]
pub enum ShoppingListError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
    #[error("Shopping cart is empty")]
    EmptyCart,
}

/// One ingredient line of a carted recipe.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct IngredientAmountRow {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Builds the aggregated shopping list for `user_id`.
///
/// Fails with [`ShoppingListError::EmptyCart`] when the cart has no recipes.
/// Read-only; the result is sorted by name, then unit.
pub async fn aggregate(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<ShoppingListItem>, ShoppingListError> {
    let txn = db.begin().await?;

    let recipe_ids = membership_service::list::<cart::Entity, _>(&txn, user_id).await?;
    if recipe_ids.is_empty() {
        return Err(ShoppingListError::EmptyCart);
    }

    let rows = ingredient_amount::Entity::find()
        .select_only()
        .column_as(ingredient::Column::Name, "name")
        .column_as(ingredient::Column::MeasurementUnit, "measurement_unit")
        .column_as(ingredient_amount::Column::Amount, "amount")
        .join(JoinType::InnerJoin, ingredient_amount::Relation::Ingredient.def())
        .filter(ingredient_amount::Column::RecipeId.is_in(recipe_ids.iter().copied()))
        .into_model::<IngredientAmountRow>()
        .all(&txn)
        .await?;
    txn.commit().await?;

    debug!(
        user_id,
        recipes = recipe_ids.len(),
        rows = rows.len(),
        "Fetched ingredient lines for shopping list."
    );
    Ok(aggregate_rows(rows))
}

/// Groups rows by `(name, measurement_unit)` and sums the amounts.
pub fn aggregate_rows<I>(rows: I) -> Vec<ShoppingListItem>
where
    I: IntoIterator<Item = IngredientAmountRow>,
{
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for row in rows {
        *totals.entry((row.name, row.measurement_unit)).or_insert(0) += i64::from(row.amount);
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), total_amount)| ShoppingListItem {
            name,
            measurement_unit,
            total_amount,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::services::membership_service::add_to_cart;
    use crate::db::test_support::{memory_db, seed_ingredient, seed_recipe, seed_user};

    fn row(name: &str, unit: &str, amount: i32) -> IngredientAmountRow {
        IngredientAmountRow {
            name: name.to_owned(),
            measurement_unit: unit.to_owned(),
            amount,
        }
    }

    fn item(name: &str, unit: &str, total_amount: i64) -> ShoppingListItem {
        ShoppingListItem {
            name: name.to_owned(),
            measurement_unit: unit.to_owned(),
            total_amount,
        }
    }

    #[test]
    fn test_sums_per_name_and_unit_sorted_by_name() {
        let rows = vec![
            row("flour", "g", 200),
            row("egg", "pcs", 2),
            row("flour", "g", 100),
            row("milk", "ml", 50),
        ];
        assert_eq!(
            aggregate_rows(rows),
            vec![item("egg", "pcs", 2), item("flour", "g", 300), item("milk", "ml", 50)]
        );
    }

    #[test]
    fn test_same_name_different_unit_is_not_merged() {
        let rows = vec![row("sugar", "tbsp", 3), row("sugar", "g", 200)];
        assert_eq!(
            aggregate_rows(rows),
            vec![item("sugar", "g", 200), item("sugar", "tbsp", 3)]
        );
    }

    #[test]
    fn test_totals_do_not_overflow_i32() {
        let rows = vec![row("water", "ml", i32::MAX), row("water", "ml", i32::MAX)];
        assert_eq!(aggregate_rows(rows)[0].total_amount, 2 * i64::from(i32::MAX));
    }

    #[test]
    fn test_no_rows_gives_empty_list() {
        assert!(aggregate_rows(Vec::new()).is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart_is_an_error() {
        let db = memory_db().await;
        let user = seed_user(&db, "hungry").await;

        let err = aggregate(&db, user.id).await.unwrap_err();
        assert!(matches!(err, ShoppingListError::EmptyCart));
    }

    #[tokio::test]
    async fn test_aggregates_only_the_users_cart() {
        let db = memory_db().await;
        let cook = seed_user(&db, "cook").await;
        let other = seed_user(&db, "other").await;
        let flour = seed_ingredient(&db, "flour", "g").await;
        let egg = seed_ingredient(&db, "egg", "pcs").await;
        let milk = seed_ingredient(&db, "milk", "ml").await;

        let pancakes = seed_recipe(&db, cook.id, "Pancakes", &[(flour.id, 200), (egg.id, 2)]).await;
        let crepes = seed_recipe(&db, cook.id, "Crepes", &[(flour.id, 100), (milk.id, 50)]).await;
        let bread = seed_recipe(&db, cook.id, "Bread", &[(flour.id, 500)]).await;

        add_to_cart(&db, cook.id, pancakes.id).await.unwrap();
        add_to_cart(&db, cook.id, crepes.id).await.unwrap();
        add_to_cart(&db, other.id, bread.id).await.unwrap();

        let expected = vec![item("egg", "pcs", 2), item("flour", "g", 300), item("milk", "ml", 50)];
        let first = aggregate(&db, cook.id).await.unwrap();
        assert_eq!(first, expected);

        // Unchanged cart, identical output.
        let second = aggregate(&db, cook.id).await.unwrap();
        assert_eq!(first, second);

        assert_eq!(aggregate(&db, other.id).await.unwrap(), vec![item("flour", "g", 500)]);
    }

    #[tokio::test]
    async fn test_same_name_different_unit_across_recipes() {
        let db = memory_db().await;
        let cook = seed_user(&db, "baker").await;
        let sugar_g = seed_ingredient(&db, "sugar", "g").await;
        let sugar_tbsp = seed_ingredient(&db, "sugar", "tbsp").await;

        let cake = seed_recipe(&db, cook.id, "Cake", &[(sugar_g.id, 200)]).await;
        let tea = seed_recipe(&db, cook.id, "Tea", &[(sugar_tbsp.id, 3)]).await;
        add_to_cart(&db, cook.id, cake.id).await.unwrap();
        add_to_cart(&db, cook.id, tea.id).await.unwrap();

        assert_eq!(
            aggregate(&db, cook.id).await.unwrap(),
            vec![item("sugar", "g", 200), item("sugar", "tbsp", 3)]
        );
    }
}
