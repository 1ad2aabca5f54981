use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        userdtos::{
            AdminDecisionDto, AdminRequestDto, FilterUserDto, LoginUserDto, RequestQueryDto,
            UserData, UserListResponseDto, UserResponseDto,
        },
        verificationdtos::ReviewDocumentDto,
    },
    error::HttpError,
    handler::auth::session_response,
    middleware::JWTAuthMiddeware,
    models::usermodel::Profile,
    AppState,
};

/// Routes reachable without a session.
pub fn admin_public_handler() -> Router {
    Router::new()
        .route("/request", post(request_admin_access))
        .route("/login", post(admin_login))
}

pub fn admin_handler() -> Router {
    Router::new()
        .route("/requests", get(get_pending_requests))
        .route("/requests/:user_id/decision", put(decide_request))
        .route("/users", get(get_users))
        .route("/verifications", get(get_pending_documents))
        .route("/verifications/:document_id/review", put(review_document))
}

pub async fn request_admin_access(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<AdminRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .admin_service
        .register_request(
            &body.email,
            &body.password,
            Profile {
                name: body.name,
                department: body.department,
                reason: body.reason,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponseDto {
            status: "success".to_string(),
            data: UserData {
                user: FilterUserDto::filter_user(&user),
            },
        }),
    ))
}

pub async fn admin_login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let session = app_state
        .admin_service
        .login(&body.email, &body.password)
        .await?;

    session_response(session, app_state.env.jwt_maxage)
}

pub async fn get_pending_requests(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let pending = app_state.admin_service.pending_requests(&auth.user).await?;

    Ok(Json(UserListResponseDto {
        status: "success".to_string(),
        results: pending.len() as i64,
        users: FilterUserDto::filter_users(&pending),
    }))
}

pub async fn decide_request(
    Path(user_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<AdminDecisionDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .admin_service
        .approve_or_reject(&auth.user, user_id, body.decision, body.notes)
        .await?;

    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&user),
        },
    }))
}

pub async fn get_users(
    Query(query_params): Query<RequestQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    query_params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = query_params.page.unwrap_or(1);
    let limit = query_params.limit.unwrap_or(10);

    let users = app_state
        .admin_service
        .list_users(&auth.user, page, limit)
        .await?;

    Ok(Json(UserListResponseDto {
        status: "success".to_string(),
        users: FilterUserDto::filter_users(&users.users),
        results: users.total,
    }))
}

pub async fn get_pending_documents(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let documents = app_state
        .verification_service
        .pending_documents(&auth.user)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "results": documents.len(),
        "documents": documents,
    })))
}

pub async fn review_document(
    Path(document_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<ReviewDocumentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let document = app_state
        .verification_service
        .review_document(&auth.user, document_id, body.decision, body.notes)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "document": document,
    })))
}
