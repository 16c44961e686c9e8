use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::entities::{ingredient, tag, user};

/// One line of an aggregated shopping list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

/// A user's public profile as seen by `viewer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserProfile {
    pub fn from_model(model: user::Model, is_subscribed: bool) -> Self {
        UserProfile {
            id: model.id,
            email: model.email,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            is_subscribed,
        }
    }
}

/// Ingredient line of a recipe, joined with its amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl RecipeIngredient {
    pub fn new(ingredient: ingredient::Model, amount: i32) -> Self {
        RecipeIngredient {
            id: ingredient.id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
            amount,
        }
    }
}

/// Full recipe representation returned by the recipe endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDetails {
    pub id: i32,
    pub author: UserProfile,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image_ref: Option<String>,
    pub tags: Vec<tag::Model>,
    pub ingredients: Vec<RecipeIngredient>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub created_at: DateTime<Utc>,
}

/// Compact recipe used in membership responses and subscriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortRecipe {
    pub id: i32,
    pub name: String,
    pub image_ref: Option<String>,
    pub cooking_time: i32,
}

impl From<crate::db::entities::recipe::Model> for ShortRecipe {
    fn from(recipe: crate::db::entities::recipe::Model) -> Self {
        ShortRecipe {
            id: recipe.id,
            name: recipe.name,
            image_ref: recipe.image_ref,
            cooking_time: recipe.cooking_time,
        }
    }
}

/// A followed author with a preview of their recipes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(flatten)]
    pub author: UserProfile,
    pub recipes: Vec<ShortRecipe>,
    pub recipes_count: u64,
}

/// A page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub page: u64,
    pub limit: u64,
    pub results: Vec<T>,
}

pub const DEFAULT_PAGE_LIMIT: u64 = 6;
pub const MAX_PAGE_LIMIT: u64 = 100;
/// Highest page number accepted; keeps `(page - 1) * limit` a valid SQL offset.
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_PAGE_LIMIT;

/// Page number (1-based) and size, clamped to sane bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: u64,
    pub limit: u64,
}

impl PageParams {
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        PageParams {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }
}

impl Default for PageParams {
    fn default() -> Self {
        PageParams::new(None, None)
    }
}
