//! The `services` module holds all data access for the HTTP layer.
//!
//! Each sub-module covers one domain area (users, tags, ingredients, recipes,
//! memberships, shopping lists). CRUD functions are re-exported here so
//! handlers can reach them as `crate::db::services::*`.

pub mod service_error;
pub mod ingredient_service;
pub mod membership_service;
pub mod recipe_service;
pub mod shopping_list_service;
pub mod tag_service;
pub mod user_service;

pub use ingredient_service::*;
pub use recipe_service::*;
pub use service_error::ServiceError;
pub use tag_service::*;
pub use user_service::*;
// The generic membership operations (`add`, `remove`, `list`) stay behind
// their module path.
pub use membership_service::{
    add_favourite, add_to_cart, follow_author, list_cart, list_favourites, list_following,
    remove_favourite, remove_from_cart, unfollow_author, MembershipError,
};
pub use shopping_list_service::ShoppingListError;
