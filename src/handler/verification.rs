// handler/verification.rs
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use serde_json::json;
use validator::Validate;

use crate::{
    dtos::verificationdtos::SubmitDocumentDto,
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn verification_handler() -> Router {
    Router::new().route("/documents", get(get_user_documents).post(submit_document))
}

pub async fn submit_document(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<SubmitDocumentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let document = app_state
        .verification_service
        .submit_document(&auth.user, body.document_type, body.document_url)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "document": document,
        })),
    ))
}

pub async fn get_user_documents(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let documents = app_state
        .verification_service
        .my_documents(&auth.user)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "verification_status": auth.user.verification_status,
        "documents": documents,
    })))
}
