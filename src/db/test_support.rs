//! In-memory SQLite fixtures for the service tests.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

use crate::db::entities::{ingredient, ingredient_amount, recipe, user};
use crate::db::schema::create_tables;

pub async fn memory_db() -> DatabaseConnection {
    // A single pooled connection keeps every query on the same in-memory database.
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.expect("open in-memory sqlite");
    create_tables(&db).await.expect("create schema");
    db
}

pub async fn seed_user(db: &DatabaseConnection, username: &str) -> user::Model {
    user::ActiveModel {
        email: Set(format!("{username}@example.com")),
        username: Set(username.to_owned()),
        first_name: Set("Test".to_owned()),
        last_name: Set("User".to_owned()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert user")
}

pub async fn seed_ingredient(db: &DatabaseConnection, name: &str, unit: &str) -> ingredient::Model {
    ingredient::ActiveModel {
        name: Set(name.to_owned()),
        measurement_unit: Set(unit.to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert ingredient")
}

/// Inserts a recipe with the given `(ingredient_id, amount)` lines.
pub async fn seed_recipe(
    db: &DatabaseConnection,
    author_id: i32,
    name: &str,
    ingredients: &[(i32, i32)],
) -> recipe::Model {
    let recipe = recipe::ActiveModel {
        author_id: Set(author_id),
        name: Set(name.to_owned()),
        text: Set(format!("How to make {name}")),
        cooking_time: Set(10),
        image_ref: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert recipe");

    for &(ingredient_id, amount) in ingredients {
        ingredient_amount::ActiveModel {
            recipe_id: Set(recipe.id),
            ingredient_id: Set(ingredient_id),
            amount: Set(amount),
        }
        .insert(db)
        .await
        .expect("insert ingredient amount");
    }
    recipe
}
