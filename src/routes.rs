// routes.rs
use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        admin::{admin_handler, admin_public_handler},
        auth::auth_handler,
        chat::chat_handler,
        labour::labour_handler,
        verification::verification_handler,
    },
    middleware::auth,
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let admin_routes = Router::new()
        .merge(admin_public_handler())
        .merge(admin_handler().layer(middleware::from_fn(auth)));

    let api_route = Router::new()
        .nest("/auth", auth_handler())
        .nest("/admin", admin_routes)
        .nest(
            "/verification",
            verification_handler().layer(middleware::from_fn(auth)),
        )
        .merge(labour_handler().layer(middleware::from_fn(auth)))
        .merge(chat_handler().layer(middleware::from_fn(auth)))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
}
