pub mod application_service;
pub mod job_offer_service;
pub mod pipeline_service;
pub mod round_service;

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::job_offer::JobOffer;
use crate::repository::PipelineRepository;

/// Loads an offer on behalf of a company. A foreign offer is reported exactly like a
/// missing one so callers cannot probe for other companies' ids.
pub(crate) async fn load_owned_offer(
    repo: &dyn PipelineRepository,
    company_id: Uuid,
    job_offer_id: Uuid,
) -> Result<JobOffer> {
    repo.find_job_offer(job_offer_id)
        .await?
        .filter(|offer| offer.is_owned_by(company_id))
        .ok_or_else(|| Error::NotFound("Job offer not found or unauthorized".to_string()))
}
