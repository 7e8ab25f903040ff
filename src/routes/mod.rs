pub mod applications;
pub mod health;
pub mod job_offers;
pub mod pipeline;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::middleware::auth::{require_company, require_student, AuthKeys};
use crate::AppState;

/// Full HTTP surface. Identity comes from the bearer token; ownership of a job offer
/// is still checked by the services themselves.
pub fn router(state: AppState, keys: AuthKeys) -> Router {
    let public = Router::new()
        .route("/health", get(health::health))
        .route("/api/job-offers", get(job_offers::list_open_job_offers))
        .route("/api/job-offers/:id", get(job_offers::get_job_offer));

    let student = Router::new()
        .route("/api/applications/apply/:job_id", post(applications::apply))
        .route(
            "/api/applications/check/:job_id",
            get(applications::check_application),
        )
        .route(
            "/api/applications/my-applications",
            get(applications::my_applications),
        )
        .route_layer(from_fn_with_state(keys.clone(), require_student));

    let company = Router::new()
        .route("/api/job-offers", post(job_offers::create_job_offer))
        .route(
            "/api/job-offers/company",
            get(job_offers::list_company_job_offers),
        )
        .route(
            "/api/job-offers/:id/cancel",
            post(job_offers::cancel_job_offer),
        )
        .route(
            "/api/applications/job/:job_offer_id",
            get(applications::job_applications),
        )
        .route(
            "/api/applications/job/:job_offer_id/round/:round_number",
            get(applications::round_view),
        )
        .route(
            "/api/applications/job/:job_offer_id/reconcile-count",
            post(applications::reconcile_count),
        )
        .route(
            "/api/applications/job/:job_offer_id/push-to-next-round",
            post(pipeline::push_to_next_round),
        )
        .route(
            "/api/applications/job/:job_offer_id/reject-selected",
            post(pipeline::reject_selected),
        )
        .route(
            "/api/applications/job/:job_offer_id/advance-round",
            post(pipeline::advance_round),
        )
        .route(
            "/api/applications/job/:job_offer_id/complete-hiring",
            post(pipeline::complete_hiring),
        )
        .route_layer(from_fn_with_state(keys, require_company));

    public.merge(student).merge(company).with_state(state)
}
