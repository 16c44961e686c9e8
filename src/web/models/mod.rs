use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::services::validation::{
    validate_amount, validate_color, validate_cooking_time, validate_email, validate_slug,
    validate_text, validate_username, Validate, ValidationError, MAX_NAME_LENGTH,
    MAX_PERSON_NAME_LENGTH,
};

// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (username)
    pub user_id: i32,
    pub exp: usize, // Expiration time (timestamp)
}

/// Struct to hold authenticated user details, to be passed as a request extension.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub username: String,
}

// --- Users ---

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_email(&self.email)?;
        validate_username(&self.username)?;
        validate_text("first_name", &self.first_name, MAX_PERSON_NAME_LENGTH)?;
        validate_text("last_name", &self.last_name, MAX_PERSON_NAME_LENGTH)?;
        Ok(())
    }
}

/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(username) = &self.username {
            validate_username(username)?;
        }
        if let Some(first_name) = &self.first_name {
            validate_text("first_name", first_name, MAX_PERSON_NAME_LENGTH)?;
        }
        if let Some(last_name) = &self.last_name {
            validate_text("last_name", last_name, MAX_PERSON_NAME_LENGTH)?;
        }
        Ok(())
    }
}

// --- Tags ---

#[derive(Debug, Serialize, Deserialize)]
pub struct TagRequest {
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl Validate for TagRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_text("name", &self.name, MAX_NAME_LENGTH)?;
        validate_color(&self.color)?;
        validate_slug(&self.slug)?;
        Ok(())
    }
}

// --- Ingredients ---

#[derive(Debug, Serialize, Deserialize)]
pub struct IngredientRequest {
    pub name: String,
    pub measurement_unit: String,
}

impl Validate for IngredientRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_text("name", &self.name, MAX_NAME_LENGTH)?;
        validate_text("measurement_unit", &self.measurement_unit, MAX_NAME_LENGTH)?;
        Ok(())
    }
}

// --- Recipes ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientAmountRequest {
    pub id: i32,
    pub amount: i32,
}

/// Body of recipe create and update. An update replaces the whole recipe,
/// including every tag and ingredient line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeRequest {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    #[serde(default)]
    pub image_ref: Option<String>,
    #[serde(default)]
    pub tags: Vec<i32>,
    pub ingredients: Vec<IngredientAmountRequest>,
}

impl Validate for RecipeRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_text("name", &self.name, MAX_NAME_LENGTH)?;
        if self.text.trim().is_empty() {
            return Err(ValidationError::new("text", "This field may not be blank."));
        }
        validate_cooking_time(self.cooking_time)?;

        if self.ingredients.is_empty() {
            return Err(ValidationError::new(
                "ingredients",
                "A recipe needs at least one ingredient.",
            ));
        }
        let mut seen = HashSet::with_capacity(self.ingredients.len());
        for line in &self.ingredients {
            validate_amount(line.amount)?;
            if !seen.insert(line.id) {
                return Err(ValidationError::new(
                    "ingredients",
                    format!("Ingredient {} is listed more than once.", line.id),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe() -> RecipeRequest {
        RecipeRequest {
            name: "Pancakes".to_string(),
            text: "Mix and fry.".to_string(),
            cooking_time: 15,
            image_ref: None,
            tags: vec![1],
            ingredients: vec![
                IngredientAmountRequest { id: 1, amount: 200 },
                IngredientAmountRequest { id: 2, amount: 2 },
            ],
        }
    }

    #[test]
    fn test_valid_recipe_passes() {
        assert!(recipe().validate().is_ok());
    }

    #[test]
    fn test_recipe_rejects_duplicate_ingredients() {
        let mut request = recipe();
        request.ingredients.push(IngredientAmountRequest { id: 1, amount: 5 });
        assert_eq!(request.validate().unwrap_err().field, "ingredients");
    }

    #[test]
    fn test_recipe_rejects_bad_numbers_and_empty_lists() {
        let mut request = recipe();
        request.cooking_time = 0;
        assert_eq!(request.validate().unwrap_err().field, "cooking_time");

        let mut request = recipe();
        request.ingredients[0].amount = 0;
        assert_eq!(request.validate().unwrap_err().field, "amount");

        let mut request = recipe();
        request.ingredients.clear();
        assert_eq!(request.validate().unwrap_err().field, "ingredients");
    }

    #[test]
    fn test_tag_request_checks_color_and_slug() {
        let tag = TagRequest {
            name: "Breakfast".to_string(),
            color: "#E26C2D".to_string(),
            slug: "breakfast".to_string(),
        };
        assert!(tag.validate().is_ok());

        let bad_color = TagRequest { color: "E26C2D".to_string(), ..tag };
        assert_eq!(bad_color.validate().unwrap_err().field, "color");
    }

    #[test]
    fn test_partial_user_update_only_checks_present_fields() {
        assert!(UpdateUserRequest::default().validate().is_ok());
        let request = UpdateUserRequest {
            username: Some("no spaces allowed".to_string()),
            ..Default::default()
        };
        assert_eq!(request.validate().unwrap_err().field, "username");
    }
}
