use actix_web::{http, web, Either, HttpResponse, Responder};
use log::*;

use infra::ids::Id;
use infra::persistence::Storage;

use super::{DeleteForm, FormState, PageQuery, PageView, RecipeForm, Submission};
use crate::recipes::{DeleteRequest, Recipe, Recipes};
use crate::templates::WithTemplate;

#[derive(Debug)]
pub struct RecipePages<M: r2d2::ManageConnection> {
    recipes: Recipes<M>,
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> RecipePages<M> {
    pub fn new(recipes: Recipes<M>) -> Self {
        RecipePages { recipes }
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.service({
            let me = self.clone();
            web::resource("/").route(web::get().to(move |query: web::Query<PageQuery>| {
                let me = me.clone();
                async move { me.index(query.into_inner()).await }
            }))
        })
        .service({
            let me = self.clone();
            web::resource("/recipes").route(web::post().to(move |form: web::Form<RecipeForm>| {
                let me = me.clone();
                async move { me.submit(form.into_inner()).await }
            }))
        })
        .service({
            let me = self.clone();
            web::resource("/recipes/{id}/delete").route(web::post().to(
                move |id: web::Path<Id<Recipe>>, form: web::Form<DeleteForm>| {
                    let me = me.clone();
                    async move { me.delete(id.into_inner(), form.into_inner()).await }
                },
            ))
        });
    }

    async fn index(&self, query: PageQuery) -> impl Responder {
        let state = FormState::from(&query);
        debug!("Render page; editing: {:?}", state.editing_id());
        let recipes = self.recipes.list().await.unwrap_or_else(|e| {
            error!("Could not fetch recipes: {}", e);
            Vec::new()
        });
        WithTemplate {
            name: "recipes.html",
            value: PageView::new(&state, recipes),
        }
    }

    /// Redirects to the list on success; on failure the page is shown
    /// again with the submitted values still in the form.
    async fn submit(&self, form: RecipeForm) -> Either<HttpResponse, WithTemplate<PageView>> {
        let result = match form.clone().into_submission() {
            Submission::Create(draft) => self.recipes.create(draft).await.map_err(|e| {
                error!("Could not add recipe: {}", e);
            }),
            Submission::Update(id, draft) => self.recipes.replace(id, draft).await.map_err(|e| {
                error!("Could not update recipe: {}", e);
            }),
        };
        match result {
            Ok(_) => Either::Left(back_to_list()),
            Err(()) => {
                let recipes = self.recipes.list().await.unwrap_or_else(|e| {
                    error!("Could not fetch recipes: {}", e);
                    Vec::new()
                });
                Either::Right(WithTemplate {
                    name: "recipes.html",
                    value: PageView::refilled(&form, recipes),
                })
            }
        }
    }

    async fn delete(&self, id: Id<Recipe>, form: DeleteForm) -> HttpResponse {
        let req = DeleteRequest {
            course: Some(form.course.into()),
        };
        if let Err(e) = self.recipes.delete(id, req).await {
            error!("Could not delete recipe: {}", e);
        }
        back_to_list()
    }
}

impl<M: r2d2::ManageConnection> Clone for RecipePages<M> {
    fn clone(&self) -> Self {
        let recipes = self.recipes.clone();
        RecipePages { recipes }
    }
}

fn back_to_list() -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((http::header::LOCATION, "/"))
        .finish()
}
