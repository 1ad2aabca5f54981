use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response as AxumResponse},
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;
use validator::Validate;

use crate::{
    dtos::userdtos::{
        FilterUserDto, LoginUserDto, RegisterUserDto, Response, UserData, UserLoginResponseDto,
        UserResponseDto,
    },
    error::HttpError,
    models::usermodel::Profile,
    service::identity_service::Session,
    AppState,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .identity_service
        .register(
            &body.email,
            &body.password,
            body.role,
            Profile {
                name: body.name,
                department: None,
                reason: None,
            },
        )
        .await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(UserResponseDto {
            status: "success".to_string(),
            data: UserData {
                user: FilterUserDto::filter_user(&user),
            },
        }),
    ))
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let session = app_state
        .identity_service
        .login(&body.email, &body.password)
        .await?;

    session_response(session, app_state.env.jwt_maxage)
}

pub async fn logout() -> Result<impl IntoResponse, HttpError> {
    let cookie = Cookie::build(("token", ""))
        .path("/")
        .max_age(time::Duration::minutes(-1))
        .http_only(true)
        .build();

    let mut response = Json(Response {
        status: "success",
        message: "Logged out".to_string(),
    })
    .into_response();
    response
        .headers_mut()
        .append(header::SET_COOKIE, cookie_header(&cookie)?);

    Ok(response)
}

/// Token in the body and in an http-only cookie.
pub fn session_response(session: Session, maxage_minutes: i64) -> Result<AxumResponse, HttpError> {
    let cookie = Cookie::build(("token", session.token.clone()))
        .path("/")
        .max_age(time::Duration::minutes(maxage_minutes))
        .http_only(true)
        .build();

    let mut response = Json(UserLoginResponseDto {
        status: "success".to_string(),
        token: session.token,
        user: FilterUserDto::filter_user(&session.user),
    })
    .into_response();

    response
        .headers_mut()
        .append(header::SET_COOKIE, cookie_header(&cookie)?);

    Ok(response)
}

fn cookie_header(cookie: &Cookie<'_>) -> Result<HeaderValue, HttpError> {
    cookie
        .to_string()
        .parse()
        .map_err(|_| HttpError::server_error("Failed to build session cookie"))
}
