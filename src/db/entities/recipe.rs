use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recipes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub author_id: i32,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    /// Minutes, always >= 1.
    pub cooking_time: i32,
    pub image_ref: Option<String>,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade",
        on_update = "Cascade"
    )]
    Author,

    #[sea_orm(has_many = "super::ingredient_amount::Entity")]
    IngredientAmounts,

    #[sea_orm(has_many = "super::cart::Entity")]
    Carts,

    #[sea_orm(has_many = "super::favourite::Entity")]
    Favourites,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::ingredient_amount::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IngredientAmounts.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::recipe_tag::Relation::Tag.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::recipe_tag::Relation::Recipe.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
