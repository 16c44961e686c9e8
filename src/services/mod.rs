pub mod shopping_list_renderer;
pub mod validation;
