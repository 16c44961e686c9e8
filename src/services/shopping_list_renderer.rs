//! Turns an aggregated shopping list into a downloadable document.

use std::fmt::Write as _;
use std::str::FromStr;

use crate::db::models::ShoppingListItem;
use crate::services::validation::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to serialize shopping list: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to format shopping list: {0}")]
    Format(#[from] std::fmt::Error),
}

/// Rendered payload plus the headers needed to serve it as an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub filename: String,
}

pub trait ShoppingListRenderer: Send + Sync {
    /// `label` names the list owner; it ends up in the header and the filename.
    fn render(&self, label: &str, items: &[ShoppingListItem]) -> Result<RenderedDocument, RenderError>;
}

/// One `name: total unit` line per item under a short header.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextRenderer;

impl ShoppingListRenderer for PlainTextRenderer {
    fn render(&self, label: &str, items: &[ShoppingListItem]) -> Result<RenderedDocument, RenderError> {
        let mut text = String::new();
        writeln!(text, "Shopping list for {label}:")?;
        for item in items {
            writeln!(text, "{}: {} {}", item.name, item.total_amount, item.measurement_unit)?;
        }
        Ok(RenderedDocument {
            bytes: text.into_bytes(),
            content_type: "text/plain; charset=utf-8",
            filename: format!("{label}_shopping_list.txt"),
        })
    }
}

/// The items as a JSON array.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRenderer;

impl ShoppingListRenderer for JsonRenderer {
    fn render(&self, label: &str, items: &[ShoppingListItem]) -> Result<RenderedDocument, RenderError> {
        Ok(RenderedDocument {
            bytes: serde_json::to_vec_pretty(items)?,
            content_type: "application/json",
            filename: format!("{label}_shopping_list.json"),
        })
    }
}

/// Output format chosen with `?format=`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ShoppingListFormat {
    #[default]
    Text,
    Json,
}

impl ShoppingListFormat {
    pub fn renderer(self) -> Box<dyn ShoppingListRenderer> {
        match self {
            ShoppingListFormat::Text => Box::new(PlainTextRenderer),
            ShoppingListFormat::Json => Box::new(JsonRenderer),
        }
    }
}

impl FromStr for ShoppingListFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(ShoppingListFormat::Text),
            "json" => Ok(ShoppingListFormat::Json),
            other => Err(ValidationError::new(
                "format",
                format!("Unsupported format '{other}', expected 'txt' or 'json'."),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<ShoppingListItem> {
        vec![
            ShoppingListItem {
                name: "egg".to_string(),
                measurement_unit: "pcs".to_string(),
                total_amount: 2,
            },
            ShoppingListItem {
                name: "flour".to_string(),
                measurement_unit: "g".to_string(),
                total_amount: 300,
            },
        ]
    }

    #[test]
    fn test_plain_text_layout() {
        let doc = PlainTextRenderer.render("cook", &items()).unwrap();
        assert_eq!(
            String::from_utf8(doc.bytes).unwrap(),
            "Shopping list for cook:\negg: 2 pcs\nflour: 300 g\n"
        );
        assert_eq!(doc.content_type, "text/plain; charset=utf-8");
        assert_eq!(doc.filename, "cook_shopping_list.txt");
    }

    #[test]
    fn test_json_keeps_item_order() {
        let doc = JsonRenderer.render("cook", &items()).unwrap();
        let parsed: Vec<ShoppingListItem> = serde_json::from_slice(&doc.bytes).unwrap();
        assert_eq!(parsed, items());
        assert_eq!(doc.content_type, "application/json");
        assert_eq!(doc.filename, "cook_shopping_list.json");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("txt".parse::<ShoppingListFormat>().unwrap(), ShoppingListFormat::Text);
        assert_eq!("JSON".parse::<ShoppingListFormat>().unwrap(), ShoppingListFormat::Json);
        assert_eq!("pdf".parse::<ShoppingListFormat>().unwrap_err().field, "format");
    }
}
