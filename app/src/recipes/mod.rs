mod models;
mod resources;

pub use self::models::{DeleteRequest, Recipe, RecipeDraft};
pub use self::resources::{ApiError, Recipes};
