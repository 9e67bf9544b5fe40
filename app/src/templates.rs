use actix_web::body::BoxBody;
use actix_web::{HttpRequest, HttpResponse, Responder};
use lazy_static::lazy_static;
use log::*;
use serde::Serialize;
use tera::{Context, Tera};

const TEXT_HTML: &str = "text/html; charset=utf-8";

lazy_static! {
    pub static ref TERA: Tera = {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("base.html", include_str!("base.html")),
            ("recipes.html", include_str!("ui/recipes.html")),
        ])
        .expect("static templates");
        tera
    };
}

/// A value to be rendered with the named template.
#[derive(Debug)]
pub struct WithTemplate<T> {
    pub name: &'static str,
    pub value: T,
}

impl<T: Serialize> WithTemplate<T> {
    pub fn render(&self) -> Result<String, tera::Error> {
        let context = Context::from_serialize(&self.value)?;
        TERA.render(self.name, &context)
    }
}

impl<T: Serialize> Responder for WithTemplate<T> {
    type Body = BoxBody;

    fn respond_to(self, _: &HttpRequest) -> HttpResponse {
        match self.render() {
            Ok(html) => HttpResponse::Ok().content_type(TEXT_HTML).body(html),
            Err(e) => {
                error!("Could not render template {}: {:?}", self.name, e);
                HttpResponse::InternalServerError().finish()
            }
        }
    }
}
