//! End-to-end flows against a real Postgres. Run with
//! `DATABASE_URL=... cargo test -- --ignored`.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

use crate::{app::build_app, ocr::testing::tiny_png, state::testing::with_pool};

const BOUNDARY: &str = "X-TOXSCAN-BOUNDARY";
const LABEL_TEXT: &str = "Ingredients: Water, Sugar, Sodium Benzoate, Red 40";

async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.expect("request failed");
    let status = res.status();
    let bytes = to_bytes(res.into_body(), 1_000_000).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_authed(uri: &str, token: &str) -> Request<Body> {
    Request::get(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn upload(token: &str) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
Content-Disposition: form-data; name=\"image\"; filename=\"label.png\"\r\n\
Content-Type: image/png\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(&tiny_png());
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::post("/api/analysis/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap()
}

async fn register(app: &Router, name: &str, email: &str) -> String {
    let (status, body) = call(
        app,
        post_json(
            "/api/auth/register",
            json!({ "name": name, "email": email, "password": "correct horse" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["token"].as_str().unwrap().to_string()
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn register_login_and_profile(pool: PgPool) {
    let app = build_app(with_pool(pool, LABEL_TEXT));
    register(&app, "Ada", "Ada@Example.com").await;

    let (status, body) = call(
        &app,
        post_json(
            "/api/auth/register",
            json!({ "name": "Imposter", "email": "ada@example.com", "password": "whatever123" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email already registered");

    let (status, _) = call(
        &app,
        post_json(
            "/api/auth/login",
            json!({ "email": "ada@example.com", "password": "wrong password" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(
        &app,
        post_json(
            "/api/auth/login",
            json!({ "email": " ADA@example.com ", "password": "correct horse" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();
    let refresh = body["refreshToken"].as_str().unwrap().to_string();

    let (status, profile) = call(&app, get_authed("/api/auth/profile", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["name"], "Ada");
    assert_eq!(profile["email"], "ada@example.com");

    let (status, body) = call(
        &app,
        post_json("/api/auth/refresh", json!({ "refreshToken": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "ada@example.com");

    let (status, _) = call(
        &app,
        post_json("/api/auth/refresh", json!({ "refreshToken": token })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn upload_then_history_is_scoped_to_owner(pool: PgPool) {
    let app = build_app(with_pool(pool.clone(), LABEL_TEXT));
    let alice = register(&app, "Alice", "alice@example.com").await;
    let bob = register(&app, "Bob", "bob@example.com").await;

    let (status, first) = call(&app, upload(&alice)).await;
    assert_eq!(status, StatusCode::OK, "{first}");
    assert_eq!(first["originalText"], LABEL_TEXT);
    assert_eq!(first["riskLevel"], "low");
    assert_eq!(first["recommendations"], "Safe for everyday use.");
    assert!(first["imageUrl"]
        .as_str()
        .unwrap()
        .starts_with("https://fake.local/analyses/"));

    let (status, second) = call(&app, upload(&alice)).await;
    assert_eq!(status, StatusCode::OK);

    let owner: (uuid::Uuid,) = sqlx::query_as("SELECT user_id FROM analyses WHERE id = $1")
        .bind(first["id"].as_str().unwrap().parse::<uuid::Uuid>().unwrap())
        .fetch_one(&pool)
        .await
        .unwrap();
    let alice_id: (uuid::Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = 'alice@example.com'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(owner.0, alice_id.0);

    let (status, history) = call(&app, get_authed("/api/analysis/history", &alice)).await;
    assert_eq!(status, StatusCode::OK);
    let items = history.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], second["id"]);
    assert_eq!(items[1]["id"], first["id"]);

    let (status, history) = call(&app, get_authed("/api/analysis/history", &bob)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(history.as_array().unwrap().is_empty());

    let own_uri = format!("/api/analysis/{}", first["id"].as_str().unwrap());
    let (status, fetched) = call(&app, get_authed(&own_uri, &alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], first["id"]);

    let (status, body) = call(&app, get_authed(&own_uri, &bob)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Analysis not found");

    let image_uri = format!("{own_uri}/image");
    let res = app.clone().oneshot(get_authed(&image_uri, &alice)).await.unwrap();
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    let (status, _) = call(&app, get_authed(&image_uri, &bob)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn deleting_user_cascades_to_analyses(pool: PgPool) {
    let app = build_app(with_pool(pool.clone(), LABEL_TEXT));
    let token = register(&app, "Carol", "carol@example.com").await;
    let (status, _) = call(&app, upload(&token)).await;
    assert_eq!(status, StatusCode::OK);

    sqlx::query("DELETE FROM users WHERE email = 'carol@example.com'")
        .execute(&pool)
        .await
        .unwrap();
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM analyses")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}
