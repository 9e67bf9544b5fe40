use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use err_derive::Error;
use log::*;
use r2d2::Pool;
use serde_json::json;

use infra::ids::Id;
use infra::persistence::{Storage, StoreError};

use super::models::{DeleteRequest, Recipe, RecipeDraft};

const PREFIX: &str = "/api/recipes";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

#[derive(Debug)]
pub struct Recipes<M: r2d2::ManageConnection> {
    db: Pool<M>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(display = "Course (partition key) is required in the request body for deletion.")]
    MissingCourse,
    #[error(display = "Recipe not found.")]
    NotFound,
    #[error(display = "{}", _0)]
    Store(#[error(source)] StoreError),
    #[error(display = "connection pool: {}", _0)]
    Pool(#[error(source)] r2d2::Error),
    #[error(display = "store call was canceled")]
    Canceled,
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> Recipes<M> {
    pub fn new(db: Pool<M>) -> Self {
        Recipes { db }
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        let scope = web::scope(PREFIX)
            .service({
                let list = self.clone();
                let create = self.clone();
                web::resource("")
                    .route(web::get().to(move || {
                        let me = list.clone();
                        async move { me.handle_list().await }
                    }))
                    .route(web::post().to(move |draft: web::Json<RecipeDraft>| {
                        let me = create.clone();
                        async move { me.handle_create(draft.into_inner()).await }
                    }))
            })
            .service({
                let replace = self.clone();
                let delete = self.clone();
                web::resource("/{id}")
                    .route(web::put().to(
                        move |id: web::Path<Id<Recipe>>, draft: web::Json<RecipeDraft>| {
                            let me = replace.clone();
                            async move {
                                me.handle_replace(id.into_inner(), draft.into_inner())
                                    .await
                            }
                        },
                    ))
                    .route(web::delete().to(
                        move |id: web::Path<Id<Recipe>>, body: web::Bytes| {
                            let me = delete.clone();
                            async move { me.handle_delete(id.into_inner(), &body).await }
                        },
                    ))
            });

        cfg.service(scope);
    }

    async fn handle_list(&self) -> Result<HttpResponse, ApiError> {
        let recipes = self.list().await?;
        Ok(HttpResponse::Ok().json(recipes))
    }

    async fn handle_create(&self, draft: RecipeDraft) -> Result<HttpResponse, ApiError> {
        let recipe = self.create(draft).await?;
        Ok(HttpResponse::Created().json(recipe))
    }

    async fn handle_replace(
        &self,
        id: Id<Recipe>,
        draft: RecipeDraft,
    ) -> Result<HttpResponse, ApiError> {
        let recipe = self.replace(id, draft).await?;
        Ok(HttpResponse::Ok().json(recipe))
    }

    async fn handle_delete(&self, id: Id<Recipe>, body: &[u8]) -> Result<HttpResponse, ApiError> {
        let req = if body.is_empty() {
            DeleteRequest::default()
        } else {
            serde_json::from_slice(body).unwrap_or_else(|e| {
                debug!("Unreadable delete body for {}: {}", id, e);
                DeleteRequest::default()
            })
        };
        self.delete(id, req).await?;
        Ok(HttpResponse::NoContent().finish())
    }

    pub async fn list(&self) -> Result<Vec<Recipe>, ApiError> {
        self.in_pool(|docs| docs.read_all::<Recipe>()).await
    }

    pub async fn create(&self, draft: RecipeDraft) -> Result<Recipe, ApiError> {
        info!("Create recipe {:?} in {:?}", draft.name, draft.course);
        self.in_pool(move |docs| docs.create(&mut Recipe::new(draft)))
            .await
    }

    /// Replaces the recipe at (`id`, `draft.course`). The stored record's
    /// course is always the partition it was addressed by.
    pub async fn replace(&self, id: Id<Recipe>, draft: RecipeDraft) -> Result<Recipe, ApiError> {
        info!("Replace recipe {} in {:?}", id, draft.course);
        let recipe = Recipe::with_id(id, draft);
        self.in_pool(move |docs| docs.replace(&recipe))
            .await
            .map_err(ApiError::missing_recipe)
    }

    pub async fn delete(&self, id: Id<Recipe>, req: DeleteRequest) -> Result<(), ApiError> {
        let partition = req.partition().ok_or(ApiError::MissingCourse)?;
        info!("Delete recipe {} in {:?}", id, partition.as_str());
        self.in_pool(move |docs| docs.delete(&id, &partition))
            .await
            .map_err(ApiError::missing_recipe)
    }

    async fn in_pool<R, F>(&self, f: F) -> Result<R, ApiError>
    where
        R: Send + 'static,
        F: FnOnce(&D) -> Result<R, StoreError> + Send + 'static,
    {
        let db = self.db.clone();
        web::block(move || -> Result<R, ApiError> {
            let docs = db.get().map_err(ApiError::Pool)?;
            f(&*docs).map_err(ApiError::Store)
        })
        .await
        .map_err(|_| ApiError::Canceled)?
    }
}

impl<M: r2d2::ManageConnection> Clone for Recipes<M> {
    fn clone(&self) -> Self {
        let db = self.db.clone();
        Recipes { db }
    }
}

impl ApiError {
    /// Point operations treat a missing document as a missing recipe; for
    /// anything else it stays a store failure.
    fn missing_recipe(self) -> Self {
        match self {
            ApiError::Store(ref err) if err.is_not_found() => ApiError::NotFound,
            other => other,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::MissingCourse => "MissingCourse",
            ApiError::NotFound => "NotFound",
            ApiError::Store(StoreError::Remote { .. }) => "StoreRejected",
            ApiError::Store(StoreError::Conflict) => "Conflict",
            ApiError::Store(_) => "StoreUnavailable",
            ApiError::Pool(_) => "PoolExhausted",
            ApiError::Canceled => "Canceled",
        }
    }

    fn body(&self) -> serde_json::Value {
        let mut body = json!({
            "code": self.code(),
            "message": self.to_string(),
        });
        if let ApiError::Store(StoreError::Remote {
            status,
            body: remote,
        }) = self
        {
            body["status"] = json!(status);
            body["body"] = remote.clone();
        }
        body
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingCourse => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::MissingCourse | ApiError::NotFound => HttpResponse::build(self.status_code())
                .content_type(TEXT_PLAIN)
                .body(self.to_string()),
            _ => {
                error!("Request failed: {}", self);
                HttpResponse::build(self.status_code()).json(self.body())
            }
        }
    }
}
