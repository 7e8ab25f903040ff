use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    dto::application_dto::RoundViewQuery, error::Result, middleware::auth::Caller, AppState,
};

#[utoipa::path(
    post,
    path = "/api/applications/apply/{job_id}",
    params(
        ("job_id" = Uuid, Path, description = "Job offer ID")
    ),
    responses(
        (status = 201, description = "Application submitted", body = Json<Application>),
        (status = 400, description = "Application deadline has passed"),
        (status = 404, description = "Job offer not found or cancelled"),
        (status = 409, description = "Already applied")
    )
)]
#[axum::debug_handler]
pub async fn apply(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let application = state.application_service.apply(caller.id, job_id).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

#[utoipa::path(
    get,
    path = "/api/applications/check/{job_id}",
    params(
        ("job_id" = Uuid, Path, description = "Job offer ID")
    ),
    responses(
        (status = 200, description = "Whether the caller applied", body = Json<ApplicationCheck>)
    )
)]
#[axum::debug_handler]
pub async fn check_application(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let check = state
        .application_service
        .check_application_status(caller.id, job_id)
        .await?;
    Ok(Json(check))
}

#[utoipa::path(
    get,
    path = "/api/applications/my-applications",
    responses(
        (status = 200, description = "The caller's applications, newest first", body = Json<Vec<StudentApplicationView>>)
    )
)]
#[axum::debug_handler]
pub async fn my_applications(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse> {
    let applications = state
        .application_service
        .list_student_applications(caller.id)
        .await?;
    Ok(Json(applications))
}

#[utoipa::path(
    get,
    path = "/api/applications/job/{job_offer_id}",
    params(
        ("job_offer_id" = Uuid, Path, description = "Job offer ID")
    ),
    responses(
        (status = 200, description = "All applications of the job offer", body = Json<Vec<ApplicantView>>),
        (status = 404, description = "Job offer not found or unauthorized")
    )
)]
#[axum::debug_handler]
pub async fn job_applications(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(job_offer_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let applications = state
        .application_service
        .list_job_applications(caller.id, job_offer_id)
        .await?;
    Ok(Json(applications))
}

#[utoipa::path(
    get,
    path = "/api/applications/job/{job_offer_id}/round/{round_number}",
    params(
        ("job_offer_id" = Uuid, Path, description = "Job offer ID"),
        ("round_number" = i32, Path, description = "Round number, starting at 1"),
        ("status" = Option<String>, Query, description = "in-progress, accepted or rejected"),
        ("department" = Option<String>, Query, description = "Department filter; `all` disables it"),
        ("sort_by" = Option<String>, Query, description = "date, name or cgpa"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("limit" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Applications visible in the round", body = Json<RoundView>),
        (status = 400, description = "Invalid round number"),
        (status = 404, description = "Job offer not found or unauthorized")
    )
)]
#[axum::debug_handler]
pub async fn round_view(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path((job_offer_id, round_number)): Path<(Uuid, i32)>,
    Query(query): Query<RoundViewQuery>,
) -> Result<impl IntoResponse> {
    let view = state
        .round_service
        .get_round_view(caller.id, job_offer_id, round_number, query)
        .await?;
    Ok(Json(view))
}

#[utoipa::path(
    post,
    path = "/api/applications/job/{job_offer_id}/reconcile-count",
    params(
        ("job_offer_id" = Uuid, Path, description = "Job offer ID")
    ),
    responses(
        (status = 200, description = "Counter recomputed from application records", body = Json<ApplicationCountReconciliation>),
        (status = 404, description = "Job offer not found or unauthorized")
    )
)]
#[axum::debug_handler]
pub async fn reconcile_count(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(job_offer_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let result = state
        .application_service
        .reconcile_application_count(caller.id, job_offer_id)
        .await?;
    Ok(Json(result))
}
