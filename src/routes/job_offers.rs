use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::job_offer_dto::{CreateJobOfferPayload, JobOfferListResponse},
    error::Result,
    middleware::auth::Caller,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/job-offers",
    responses(
        (status = 200, description = "Open and in-progress job offers", body = Json<JobOfferListResponse>)
    )
)]
#[axum::debug_handler]
pub async fn list_open_job_offers(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let offers = state.job_offer_service.list_open().await?;
    Ok(Json(JobOfferListResponse::from(offers)))
}

#[utoipa::path(
    get,
    path = "/api/job-offers/{id}",
    params(
        ("id" = Uuid, Path, description = "Job offer ID")
    ),
    responses(
        (status = 200, description = "Job offer found", body = Json<JobOffer>),
        (status = 404, description = "Job offer not found")
    )
)]
#[axum::debug_handler]
pub async fn get_job_offer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let offer = state.job_offer_service.get(id).await?;
    Ok(Json(offer))
}

#[utoipa::path(
    post,
    path = "/api/job-offers",
    request_body = CreateJobOfferPayload,
    responses(
        (status = 201, description = "Job offer published", body = Json<JobOffer>),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[axum::debug_handler]
pub async fn create_job_offer(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(payload): Json<CreateJobOfferPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let offer = state.job_offer_service.create(caller.id, payload).await?;
    Ok((StatusCode::CREATED, Json(offer)))
}

#[utoipa::path(
    get,
    path = "/api/job-offers/company",
    responses(
        (status = 200, description = "Job offers of the calling company", body = Json<JobOfferListResponse>),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[axum::debug_handler]
pub async fn list_company_job_offers(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse> {
    let offers = state.job_offer_service.list_for_company(caller.id).await?;
    Ok(Json(JobOfferListResponse::from(offers)))
}

#[utoipa::path(
    post,
    path = "/api/job-offers/{id}/cancel",
    params(
        ("id" = Uuid, Path, description = "Job offer ID")
    ),
    responses(
        (status = 200, description = "Job offer cancelled", body = Json<JobOffer>),
        (status = 404, description = "Job offer not found or unauthorized"),
        (status = 409, description = "Job offer already completed or cancelled")
    )
)]
#[axum::debug_handler]
pub async fn cancel_job_offer(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let offer = state.job_offer_service.cancel(caller.id, id).await?;
    Ok(Json(offer))
}
