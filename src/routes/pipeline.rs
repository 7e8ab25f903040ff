use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::pipeline_dto::{AdvanceRoundPayload, PushToNextRoundPayload, RejectSelectedPayload},
    error::Result,
    middleware::auth::Caller,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/applications/job/{job_offer_id}/push-to-next-round",
    params(
        ("job_offer_id" = Uuid, Path, description = "Job offer ID")
    ),
    request_body = PushToNextRoundPayload,
    responses(
        (status = 200, description = "Applications moved forward", body = Json<PushOutcome>),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Job offer not found or unauthorized"),
        (status = 409, description = "Round is not the active round")
    )
)]
#[axum::debug_handler]
pub async fn push_to_next_round(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(job_offer_id): Path<Uuid>,
    Json(payload): Json<PushToNextRoundPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let outcome = state
        .pipeline_service
        .push_to_next_round(caller.id, job_offer_id, payload)
        .await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    post,
    path = "/api/applications/job/{job_offer_id}/reject-selected",
    params(
        ("job_offer_id" = Uuid, Path, description = "Job offer ID")
    ),
    request_body = RejectSelectedPayload,
    responses(
        (status = 200, description = "Applications rejected", body = Json<RejectOutcome>),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Job offer not found or unauthorized")
    )
)]
#[axum::debug_handler]
pub async fn reject_selected(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(job_offer_id): Path<Uuid>,
    Json(payload): Json<RejectSelectedPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let outcome = state
        .pipeline_service
        .reject_selected(caller.id, job_offer_id, payload)
        .await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    post,
    path = "/api/applications/job/{job_offer_id}/advance-round",
    params(
        ("job_offer_id" = Uuid, Path, description = "Job offer ID")
    ),
    request_body = AdvanceRoundPayload,
    responses(
        (status = 200, description = "Round closed and stage advanced", body = Json<AdvanceOutcome>),
        (status = 404, description = "Job offer not found or unauthorized"),
        (status = 409, description = "Nobody pushed forward, final round, or stale round")
    )
)]
#[axum::debug_handler]
pub async fn advance_round(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(job_offer_id): Path<Uuid>,
    Json(payload): Json<AdvanceRoundPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let outcome = state
        .pipeline_service
        .advance_round(caller.id, job_offer_id, payload)
        .await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    post,
    path = "/api/applications/job/{job_offer_id}/complete-hiring",
    params(
        ("job_offer_id" = Uuid, Path, description = "Job offer ID")
    ),
    responses(
        (status = 200, description = "Hiring completed", body = Json<CompletionOutcome>),
        (status = 404, description = "Job offer not found or unauthorized"),
        (status = 409, description = "Not in the final round or already completed")
    )
)]
#[axum::debug_handler]
pub async fn complete_hiring(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(job_offer_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let outcome = state
        .pipeline_service
        .complete_hiring(caller.id, job_offer_id)
        .await?;
    Ok(Json(outcome))
}
