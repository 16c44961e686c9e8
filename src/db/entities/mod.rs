//! SeaORM Entity Crate
//!
//! Defines the SeaORM entities that map to database tables.
//! Join tables (`recipe_tags`, `ingredient_amounts`, `carts`, `favourites`,
//! `follows`) use composite primary keys, so the store itself rejects
//! duplicate pairs.

pub mod user;
pub mod tag;
pub mod ingredient;
pub mod recipe;
pub mod recipe_tag;
pub mod ingredient_amount;
pub mod cart;
pub mod favourite;
pub mod follow;

// Prelude module for easy importing of all entities and their related types
pub mod prelude {
    pub use super::user::Entity as User;
    pub use super::user::Model as UserModel;
    pub use super::user::ActiveModel as UserActiveModel;
    pub use super::user::Column as UserColumn;

    pub use super::tag::Entity as Tag;
    pub use super::tag::Model as TagModel;
    pub use super::tag::ActiveModel as TagActiveModel;
    pub use super::tag::Column as TagColumn;

    pub use super::ingredient::Entity as Ingredient;
    pub use super::ingredient::Model as IngredientModel;
    pub use super::ingredient::ActiveModel as IngredientActiveModel;
    pub use super::ingredient::Column as IngredientColumn;

    pub use super::recipe::Entity as Recipe;
    pub use super::recipe::Model as RecipeModel;
    pub use super::recipe::ActiveModel as RecipeActiveModel;
    pub use super::recipe::Column as RecipeColumn;

    pub use super::recipe_tag::Entity as RecipeTag;
    pub use super::recipe_tag::Model as RecipeTagModel;
    pub use super::recipe_tag::ActiveModel as RecipeTagActiveModel;
    pub use super::recipe_tag::Column as RecipeTagColumn;

    pub use super::ingredient_amount::Entity as IngredientAmount;
    pub use super::ingredient_amount::Model as IngredientAmountModel;
    pub use super::ingredient_amount::ActiveModel as IngredientAmountActiveModel;
    pub use super::ingredient_amount::Column as IngredientAmountColumn;

    pub use super::cart::Entity as Cart;
    pub use super::cart::Model as CartModel;
    pub use super::cart::ActiveModel as CartActiveModel;
    pub use super::cart::Column as CartColumn;

    pub use super::favourite::Entity as Favourite;
    pub use super::favourite::Model as FavouriteModel;
    pub use super::favourite::ActiveModel as FavouriteActiveModel;
    pub use super::favourite::Column as FavouriteColumn;

    pub use super::follow::Entity as Follow;
    pub use super::follow::Model as FollowModel;
    pub use super::follow::ActiveModel as FollowActiveModel;
    pub use super::follow::Column as FollowColumn;
}
