use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde_json::json;
use validator::Validate;

use crate::{
    dtos::chatdtos::{MarkReadResponseDto, SendMessageDto, UnreadCountDto},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn chat_handler() -> Router {
    Router::new()
        .route("/messages", post(send_message))
        .route("/conversations", get(get_conversations))
        .route("/conversations/:conversation_id/messages", get(get_messages))
        .route("/conversations/:conversation_id/read", put(mark_conversation_read))
        .route("/unread-count", get(get_unread_count))
}

pub async fn send_message(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<SendMessageDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let sent = app_state
        .chat_service
        .send_direct_message(&auth.user, body.receiver_id, body.content)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "data": sent,
        })),
    ))
}

pub async fn get_conversations(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let conversations = app_state.chat_service.list_conversations(&auth.user).await?;

    Ok(Json(json!({
        "status": "success",
        "results": conversations.len(),
        "data": conversations,
    })))
}

pub async fn get_messages(
    Path(conversation_id): Path<String>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let messages = app_state
        .chat_service
        .get_messages(&auth.user, &conversation_id)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "results": messages.len(),
        "data": messages,
    })))
}

pub async fn mark_conversation_read(
    Path(conversation_id): Path<String>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let marked = app_state
        .chat_service
        .mark_conversation_read(&auth.user, &conversation_id)
        .await?;

    Ok(Json(MarkReadResponseDto {
        status: "success".to_string(),
        marked,
    }))
}

pub async fn get_unread_count(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let unread_count = app_state.chat_service.unread_total(&auth.user).await?;

    Ok(Json(UnreadCountDto { unread_count }))
}
