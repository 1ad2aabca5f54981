// handler/labour.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::labordtos::*,
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn labour_handler() -> Router {
    Router::new()
        .route("/jobs", get(get_open_jobs).post(create_job))
        .route("/jobs/mine", get(get_my_jobs))
        .route("/jobs/:job_id", get(get_job))
        .route(
            "/jobs/:job_id/proposals",
            get(get_job_proposals).post(submit_proposal),
        )
        .route(
            "/jobs/:job_id/proposals/:proposal_id/accept",
            post(accept_proposal),
        )
        .route("/proposals/mine", get(get_my_proposals))
        .route("/contracts", get(get_my_contracts))
        .route("/contracts/stats", get(get_contract_stats))
        .route("/contracts/:contract_id", get(get_contract))
        .route("/contracts/:contract_id/status", put(update_contract_status))
}

pub async fn create_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let job = app_state
        .labour_service
        .create_job(&auth.user, body.title, body.description, body.budget)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "data": job,
        })),
    ))
}

pub async fn get_open_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let jobs = app_state.labour_service.open_jobs().await?;

    Ok(Json(json!({
        "status": "success",
        "results": jobs.len(),
        "data": jobs,
    })))
}

pub async fn get_my_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let jobs = app_state.labour_service.my_jobs(&auth.user).await?;

    Ok(Json(json!({
        "status": "success",
        "results": jobs.len(),
        "data": jobs,
    })))
}

pub async fn get_job(
    Path(job_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.labour_service.get_job(job_id).await?;

    Ok(Json(json!({
        "status": "success",
        "data": job,
    })))
}

pub async fn submit_proposal(
    Path(job_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<SubmitProposalDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let proposal = app_state
        .labour_service
        .submit_proposal(&auth.user, job_id, body.bid_amount, body.cover_letter)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "data": proposal,
        })),
    ))
}

pub async fn get_job_proposals(
    Path(job_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let proposals = app_state
        .labour_service
        .job_proposals(&auth.user, job_id)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "results": proposals.len(),
        "data": proposals,
    })))
}

pub async fn get_my_proposals(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let proposals = app_state.labour_service.my_proposals(&auth.user).await?;

    Ok(Json(json!({
        "status": "success",
        "results": proposals.len(),
        "data": proposals,
    })))
}

pub async fn accept_proposal(
    Path((job_id, proposal_id)): Path<(Uuid, Uuid)>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    body: Option<Json<AcceptProposalDto>>,
) -> Result<impl IntoResponse, HttpError> {
    let agreed_amount = body.and_then(|Json(dto)| dto.agreed_amount);

    let outcome = app_state
        .labour_service
        .accept_proposal(&auth.user, job_id, proposal_id, agreed_amount)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": outcome,
    })))
}

pub async fn get_my_contracts(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let contracts = app_state.labour_service.my_contracts(&auth.user).await?;

    Ok(Json(json!({
        "status": "success",
        "results": contracts.len(),
        "data": contracts,
    })))
}

pub async fn get_contract_stats(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state.labour_service.contract_stats(&auth.user).await?;

    Ok(Json(json!({
        "status": "success",
        "data": stats,
    })))
}

pub async fn get_contract(
    Path(contract_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let contract = app_state
        .labour_service
        .get_contract(&auth.user, contract_id)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": contract,
    })))
}

pub async fn update_contract_status(
    Path(contract_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateContractStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let transition = app_state
        .labour_service
        .update_contract_status(&auth.user, contract_id, body.status)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "data": transition,
    })))
}
