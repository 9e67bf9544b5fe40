use log::*;
use r2d2::Pool;

use actix_web::web;
use infra::persistence::Storage;

pub mod config;
pub mod recipes;
mod templates;
pub mod ui;

#[cfg(test)]
mod test;

/// Everything served over HTTP: the JSON API and the page that drives it.
#[derive(Debug)]
pub struct RecipeBook<M: r2d2::ManageConnection> {
    recipes: recipes::Recipes<M>,
    pages: ui::RecipePages<M>,
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> RecipeBook<M> {
    pub fn new(db: Pool<M>) -> Self {
        let recipes = recipes::Recipes::new(db);
        let pages = ui::RecipePages::new(recipes.clone());
        RecipeBook { recipes, pages }
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        info!("Booting recipe book");
        self.recipes.configure(cfg);
        self.pages.configure(cfg);
    }
}

impl<M: r2d2::ManageConnection> Clone for RecipeBook<M> {
    fn clone(&self) -> Self {
        RecipeBook {
            recipes: self.recipes.clone(),
            pages: self.pages.clone(),
        }
    }
}
