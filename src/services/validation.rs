//! Field validators shared by the request payloads.
//!
//! Handlers call [`Validate::validate`] explicitly before touching the store.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static SLUG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("slug pattern compiles"));
static COLOR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}){1,2}$").expect("color pattern compiles"));
static USERNAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern compiles"));

pub const MAX_USERNAME_LENGTH: usize = 150;
pub const MAX_PERSON_NAME_LENGTH: usize = 150;
pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_NAME_LENGTH: usize = 200;
pub const MAX_AMOUNT: i32 = 32767;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        ValidationError {
            field,
            message: message.into(),
        }
    }
}

/// Implemented by every payload that must be checked before it is stored.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

pub fn validate_slug(value: &str) -> Result<(), ValidationError> {
    if value.len() > MAX_NAME_LENGTH || !SLUG_PATTERN.is_match(value) {
        return Err(ValidationError::new(
            "slug",
            "Slug may only contain letters, digits, '-' and '_'.",
        ));
    }
    Ok(())
}

/// Accepts `#RGB` and `#RRGGBB`.
pub fn validate_color(value: &str) -> Result<(), ValidationError> {
    if !COLOR_PATTERN.is_match(value) {
        return Err(ValidationError::new("color", "Color must be a hex value like #1a2b3c."));
    }
    Ok(())
}

pub fn validate_username(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::new(
            "username",
            format!("Username must be at most {MAX_USERNAME_LENGTH} characters."),
        ));
    }
    if !USERNAME_PATTERN.is_match(value) {
        return Err(ValidationError::new(
            "username",
            "Username may only contain letters, digits and @/./+/-/_ characters.",
        ));
    }
    Ok(())
}

pub fn validate_email(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::new(
            "email",
            format!("Email must be at most {MAX_EMAIL_LENGTH} characters."),
        ));
    }
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(ValidationError::new("email", "Enter a valid email address."));
    }
    Ok(())
}

/// Non-blank text of at most `max` characters.
pub fn validate_text(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "This field may not be blank."));
    }
    if value.chars().count() > max {
        return Err(ValidationError::new(
            field,
            format!("Ensure this field has no more than {max} characters."),
        ));
    }
    Ok(())
}

pub fn validate_cooking_time(minutes: i32) -> Result<(), ValidationError> {
    if minutes < 1 {
        return Err(ValidationError::new(
            "cooking_time",
            "Cooking time must be at least 1 minute.",
        ));
    }
    Ok(())
}

pub fn validate_amount(amount: i32) -> Result<(), ValidationError> {
    if !(1..=MAX_AMOUNT).contains(&amount) {
        return Err(ValidationError::new(
            "amount",
            format!("Amount must be between 1 and {MAX_AMOUNT}."),
        ));
    }
    Ok(())
}
