pub mod api;
pub mod recipe_json;
