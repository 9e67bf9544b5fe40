//! Guarded with `#[cfg(test)]` from `lib.rs`

use actix_web::http::{header, StatusCode};
use actix_web::{test, App};
use serde_json::{json, Value};

use crate::recipes::Recipe;


fn soup() -> Value {
    json!({
        "name": "Soup",
        "course": "starter",
        "ingredients": "water\nsalt",
        "instructions": "boil",
    })
}

fn create(body: Value) -> test::TestRequest {
    test::TestRequest::post().uri("/api/recipes").set_json(body)
}

fn list() -> test::TestRequest {
    test::TestRequest::get().uri("/api/recipes")
}

fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> Option<&str> {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

#[actix_web::test]
async fn soup_scenario() {
    let book = junk_drawer::book();
    let app = test::init_service(App::new().configure(|cfg| book.configure(cfg))).await;

    let resp = test::call_service(&app, create(soup()).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Recipe = test::read_body_json(resp).await;
    let id = created.id().to_string();
    assert!(!id.is_empty());

    let listed: Vec<Recipe> = test::call_and_read_body_json(&app, list().to_request()).await;
    assert_eq!(listed, vec![created.clone()]);

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/recipes/{}", id))
            .set_json(json!({
                "name": "Soup",
                "course": "starter",
                "ingredients": "water\nsalt\npepper",
                "instructions": "boil",
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let replaced: Recipe = test::read_body_json(resp).await;
    assert_eq!(replaced.id(), created.id());
    assert_eq!(replaced.ingredients, "water\nsalt\npepper");

    let listed: Vec<Recipe> = test::call_and_read_body_json(&app, list().to_request()).await;
    assert_eq!(listed, vec![replaced]);

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/recipes/{}", id))
            .set_json(json!({"course": "starter"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(test::read_body(resp).await.is_empty());

    let listed: Vec<Recipe> = test::call_and_read_body_json(&app, list().to_request()).await;
    assert!(listed.is_empty(), "{:?}", listed);
}

#[actix_web::test]
async fn created_recipes_are_listed_with_submitted_fields() {
    let book = junk_drawer::book();
    let app = test::init_service(App::new().configure(|cfg| book.configure(cfg))).await;

    let stew = json!({
        "name": "Stew",
        "course": "main",
        "ingredients": "beef\ncarrots",
        "instructions": "simmer\nserve",
    });
    let _: Recipe = test::call_and_read_body_json(&app, create(soup()).to_request()).await;
    let created: Recipe = test::call_and_read_body_json(&app, create(stew.clone()).to_request()).await;

    let listed: Vec<Value> = test::call_and_read_body_json(&app, list().to_request()).await;
    assert_eq!(listed.len(), 2);
    let found = listed
        .iter()
        .find(|r| r["id"] == json!(created.id().as_str()))
        .expect("created recipe listed");
    for field in &["name", "course", "ingredients", "instructions"] {
        assert_eq!(found[*field], stew[*field], "field {}", field);
    }
}

#[actix_web::test]
async fn delete_without_course_is_rejected() {
    let book = junk_drawer::book();
    let app = test::init_service(App::new().configure(|cfg| book.configure(cfg))).await;
    let created: Recipe = test::call_and_read_body_json(&app, create(soup()).to_request()).await;
    let uri = format!("/api/recipes/{}", created.id());

    let requests = vec![
        test::TestRequest::delete().uri(&uri),
        test::TestRequest::delete().uri(&uri).set_json(json!({})),
        test::TestRequest::delete().uri(&uri).set_json(json!({"course": null})),
        test::TestRequest::delete().uri(&uri).set_json(json!({"course": ""})),
        test::TestRequest::delete()
            .uri(&uri)
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("not json"),
    ];
    for req in requests {
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = test::read_body(resp).await;
        assert_eq!(
            body,
            "Course (partition key) is required in the request body for deletion."
        );
    }

    let listed: Vec<Recipe> = test::call_and_read_body_json(&app, list().to_request()).await;
    assert_eq!(listed, vec![created]);
}

#[actix_web::test]
async fn update_of_missing_recipe_is_not_found() {
    let book = junk_drawer::book();
    let app = test::init_service(App::new().configure(|cfg| book.configure(cfg))).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/api/recipes/recipe-nope")
            .set_json(soup())
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(test::read_body(resp).await, "Recipe not found.");

    let listed: Vec<Recipe> = test::call_and_read_body_json(&app, list().to_request()).await;
    assert!(listed.is_empty(), "replace must not insert: {:?}", listed);
}

#[actix_web::test]
async fn delete_of_missing_recipe_is_not_found() {
    let book = junk_drawer::book();
    let app = test::init_service(App::new().configure(|cfg| book.configure(cfg))).await;
    let created: Recipe = test::call_and_read_body_json(&app, create(soup()).to_request()).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri("/api/recipes/recipe-nope")
            .set_json(json!({"course": "starter"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Right id, wrong partition.
    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/recipes/{}", created.id()))
            .set_json(json!({"course": "dessert"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn changing_course_on_update_addresses_another_partition() {
    let book = junk_drawer::book();
    let app = test::init_service(App::new().configure(|cfg| book.configure(cfg))).await;
    let created: Recipe = test::call_and_read_body_json(&app, create(soup()).to_request()).await;

    let mut moved = soup();
    moved["course"] = json!("dessert");
    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/recipes/{}", created.id()))
            .set_json(moved)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let listed: Vec<Recipe> = test::call_and_read_body_json(&app, list().to_request()).await;
    assert_eq!(listed, vec![created]);
}

#[actix_web::test]
async fn incomplete_create_is_rejected_before_the_store() {
    let book = junk_drawer::book();
    let app = test::init_service(App::new().configure(|cfg| book.configure(cfg))).await;

    let resp = test::call_service(&app, create(json!({"name": "Soup"})).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let listed: Vec<Recipe> = test::call_and_read_body_json(&app, list().to_request()).await;
    assert!(listed.is_empty(), "{:?}", listed);
}

#[actix_web::test]
async fn page_lists_recipes() {
    let book = junk_drawer::book();
    let app = test::init_service(App::new().configure(|cfg| book.configure(cfg))).await;
    let _: Recipe = test::call_and_read_body_json(&app, create(soup()).to_request()).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = test::read_body(resp).await;
    let html = std::str::from_utf8(&html).expect("utf8");

    assert!(html.contains("My Recipe Book"), "{}", html);
    assert!(html.contains("Soup <small>(starter)</small>"), "{}", html);
}

#[actix_web::test]
async fn page_edit_mode_locks_course() {
    let book = junk_drawer::book();
    let app = test::init_service(App::new().configure(|cfg| book.configure(cfg))).await;
    let created: Recipe = test::call_and_read_body_json(&app, create(soup()).to_request()).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/?edit={}", created.id()))
            .to_request(),
    )
    .await;
    let html = test::read_body(resp).await;
    let html = std::str::from_utf8(&html).expect("utf8");

    assert!(html.contains("Update Recipe"), "{}", html);
    assert!(html.contains("disabled"), "{}", html);
    assert!(html.contains("cancel-edit-btn"), "{}", html);
}

#[actix_web::test]
async fn form_submissions_create_update_and_delete() {
    let book = junk_drawer::book();
    let app = test::init_service(App::new().configure(|cfg| book.configure(cfg))).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/recipes")
            .set_form(&soup())
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/"));

    let listed: Vec<Recipe> = test::call_and_read_body_json(&app, list().to_request()).await;
    assert_eq!(listed.len(), 1);
    let created = listed[0].clone();
    assert_eq!(created.name, "Soup");

    let mut edit = soup();
    edit["editing_id"] = json!(created.id().as_str());
    edit["name"] = json!("Better Soup");
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/recipes")
            .set_form(&edit)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let listed: Vec<Recipe> = test::call_and_read_body_json(&app, list().to_request()).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id(), created.id());
    assert_eq!(listed[0].name, "Better Soup");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/recipes/{}/delete", created.id()))
            .set_form(&json!({"course": "starter"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/"));

    let listed: Vec<Recipe> = test::call_and_read_body_json(&app, list().to_request()).await;
    assert!(listed.is_empty(), "{:?}", listed);
}

#[actix_web::test]
async fn failed_submission_keeps_the_typed_form() {
    let book = junk_drawer::book();
    let app = test::init_service(App::new().configure(|cfg| book.configure(cfg))).await;

    let mut edit = soup();
    edit["editing_id"] = json!("recipe-nope");
    edit["name"] = json!("Half-typed Soup");
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/recipes")
            .set_form(&edit)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(location(&resp), None);
    let html = test::read_body(resp).await;
    let html = std::str::from_utf8(&html).expect("utf8");
    assert!(html.contains(r#"value="Half-typed Soup""#), "{}", html);
    assert!(
        html.contains(r#"name="editing_id" value="recipe-nope""#),
        "{}",
        html
    );

    let listed: Vec<Recipe> = test::call_and_read_body_json(&app, list().to_request()).await;
    assert!(listed.is_empty(), "{:?}", listed);
}

#[actix_web::test]
async fn failed_delete_still_returns_to_the_list() {
    let book = junk_drawer::book();
    let app = test::init_service(App::new().configure(|cfg| book.configure(cfg))).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/recipes/recipe-nope/delete")
            .set_form(&json!({"course": ""}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let listed: Vec<Recipe> = test::call_and_read_body_json(&app, list().to_request()).await;
    assert!(listed.is_empty(), "{:?}", listed);
}

#[actix_web::test]
async fn missing_container_fails_list_and_create_as_server_errors() {
    let book = junk_drawer::missing_container_book();
    let app = test::init_service(App::new().configure(|cfg| book.configure(cfg))).await;

    let resp = test::call_service(&app, list().to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "StoreUnavailable");

    let resp = test::call_service(&app, create(soup()).to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "StoreUnavailable");
}

#[actix_web::test]
async fn missing_container_fails_point_operations_as_not_found() {
    let book = junk_drawer::missing_container_book();
    let app = test::init_service(App::new().configure(|cfg| book.configure(cfg))).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/api/recipes/recipe-X")
            .set_json(soup())
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri("/api/recipes/recipe-X")
            .set_json(json!({"course": "starter"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn delete_accepts_a_numeric_course() {
    let book = junk_drawer::book();
    let app = test::init_service(App::new().configure(|cfg| book.configure(cfg))).await;
    let mut draft = soup();
    draft["course"] = json!("5");
    let created: Recipe = test::call_and_read_body_json(&app, create(draft).to_request()).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/recipes/{}", created.id()))
            .set_json(json!({"course": 5}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let listed: Vec<Recipe> = test::call_and_read_body_json(&app, list().to_request()).await;
    assert!(listed.is_empty(), "{:?}", listed);
}
