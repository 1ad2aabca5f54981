// Router-level tests: status codes and the auth layer.

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{spawn_app, PASSWORD, ROOT_ADMIN};
use workbridge::routes::create_router;

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn registration(email: &str, role: &str) -> Value {
    json!({
        "name": "Someone",
        "email": email,
        "password": PASSWORD,
        "passwordConfirm": PASSWORD,
        "role": role,
    })
}

async fn login_token(router: &Router, uri: &str, email: &str) -> String {
    let (status, body) = send(
        router,
        post_json(uri, json!({ "email": email, "password": PASSWORD }), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = spawn_app().await;
    let router = create_router(app.state.clone());

    let (status, body) = send(&router, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_login_and_protected_route() {
    let app = spawn_app().await;
    let router = create_router(app.state.clone());

    let (status, body) = send(
        &router,
        post_json("/api/auth/register", registration("client@shop.io", "client"), None),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["user"]["email"], "client@shop.io");
    assert_eq!(body["data"]["user"]["role"], "client");
    assert!(body["data"]["user"].get("password").is_none());

    let (status, _) = send(
        &router,
        post_json("/api/auth/register", registration("client@shop.io", "client"), None),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&router, get("/api/unread-count", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "fail");

    let (status, _) = send(&router, get("/api/unread-count", Some("not-a-jwt"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = login_token(&router, "/api/auth/login", "client@shop.io").await;
    let (status, body) = send(&router, get("/api/unread-count", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unread_count"], 0);
}

#[tokio::test]
async fn test_admin_cannot_self_register_or_use_general_login() {
    let app = spawn_app().await;
    let router = create_router(app.state.clone());

    let (status, _) = send(
        &router,
        post_json("/api/auth/register", registration("sneaky@corp.io", "admin"), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &router,
        post_json(
            "/api/auth/login",
            json!({ "email": ROOT_ADMIN, "password": PASSWORD }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_routes_require_approved_admin() {
    let app = spawn_app().await;
    let router = create_router(app.state.clone());

    let (status, _) = send(
        &router,
        post_json(
            "/api/admin/request",
            json!({ "name": "Outsider", "email": "me@gmail.com", "password": PASSWORD }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    app.client("client@shop.io").await;
    let client_token = login_token(&router, "/api/auth/login", "client@shop.io").await;
    let (status, _) = send(&router, get("/api/admin/requests", Some(&client_token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin_token = login_token(&router, "/api/admin/login", ROOT_ADMIN).await;
    let (status, _) = send(&router, get("/api/admin/requests", Some(&admin_token))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_self_message_is_bad_request() {
    let app = spawn_app().await;
    let router = create_router(app.state.clone());

    let client = app.client("client@shop.io").await;
    let token = login_token(&router, "/api/auth/login", "client@shop.io").await;

    let (status, body) = send(
        &router,
        post_json(
            "/api/messages",
            json!({ "receiver_id": client.id, "content": "note to self" }),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");
}
