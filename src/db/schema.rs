use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Schema};
use tracing::{debug, info};

use crate::db::entities::prelude::*;

/// Creates every table from the entity definitions, skipping existing ones.
///
/// Parents are created before the join tables that reference them.
pub async fn create_tables<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, User).await?;
    create_table(db, &schema, Tag).await?;
    create_table(db, &schema, Ingredient).await?;
    create_table(db, &schema, Recipe).await?;
    create_table(db, &schema, RecipeTag).await?;
    create_table(db, &schema, IngredientAmount).await?;
    create_table(db, &schema, Cart).await?;
    create_table(db, &schema, Favourite).await?;
    create_table(db, &schema, Follow).await?;

    info!("Database schema is in place.");
    Ok(())
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let table_name = entity.table_name().to_owned();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(db.get_database_backend().build(&statement)).await?;
    debug!(table = %table_name, "Ensured table exists.");
    Ok(())
}
