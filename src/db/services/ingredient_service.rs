use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::info;

use crate::db::entities::ingredient;
use crate::db::services::service_error::ServiceError;
use crate::web::models::IngredientRequest;

pub async fn create_ingredient(
    db: &DatabaseConnection,
    req: &IngredientRequest,
) -> Result<ingredient::Model, ServiceError> {
    let model = ingredient::ActiveModel {
        name: Set(req.name.trim().to_owned()),
        measurement_unit: Set(req.measurement_unit.trim().to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(ingredient_id = model.id, name = %model.name, "Ingredient created.");
    Ok(model)
}

pub async fn get_ingredient(
    db: &DatabaseConnection,
    ingredient_id: i32,
) -> Result<ingredient::Model, ServiceError> {
    ingredient::Entity::find_by_id(ingredient_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Ingredient with ID {ingredient_id}")))
}

/// Lists ingredients ordered by name, optionally those whose name starts
/// with `name_prefix` (case-insensitive).
pub async fn list_ingredients(
    db: &DatabaseConnection,
    name_prefix: Option<&str>,
) -> Result<Vec<ingredient::Model>, ServiceError> {
    let mut query = ingredient::Entity::find();
    if let Some(prefix) = name_prefix.map(str::trim).filter(|p| !p.is_empty()) {
        let pattern = format!("{}%", escape_like(&prefix.to_lowercase()));
        query = query.filter(
            Expr::expr(Func::lower(Expr::col(ingredient::Column::Name)))
                .like(LikeExpr::new(pattern).escape('\\')),
        );
    }

    Ok(query
        .order_by_asc(ingredient::Column::Name)
        .order_by_asc(ingredient::Column::MeasurementUnit)
        .all(db)
        .await?)
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
