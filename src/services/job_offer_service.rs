use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::job_offer_dto::CreateJobOfferPayload;
use crate::error::{Error, Result};
use crate::models::job_offer::{JobOffer, JobStatus};
use crate::repository::{JobOfferFilter, PipelineRepository};
use crate::services::load_owned_offer;
use crate::utils::{time, validation::field_error};

#[derive(Clone)]
pub struct JobOfferService {
    repo: Arc<dyn PipelineRepository>,
}

impl JobOfferService {
    pub fn new(repo: Arc<dyn PipelineRepository>) -> Self {
        Self { repo }
    }

    /// Publishes an offer. The stage list is fixed from here on and sets `total_rounds`.
    pub async fn create(&self, company_id: Uuid, payload: CreateJobOfferPayload) -> Result<JobOffer> {
        payload.validate()?;
        if payload
            .recruitment_process
            .iter()
            .any(|stage| stage.stage_name.trim().is_empty())
        {
            return Err(field_error(
                "recruitment_process",
                "stage_name",
                "Every recruitment stage needs a name",
            )
            .into());
        }

        let stages = payload.normalized_stages();
        let total_rounds = i32::try_from(stages.len()).map_err(|_| {
            field_error(
                "recruitment_process",
                "length",
                "Too many recruitment stages",
            )
        })?;
        let now = time::now();
        let offer = JobOffer {
            id: Uuid::new_v4(),
            company_id,
            title: payload.title.trim().to_string(),
            role: payload.role.trim().to_string(),
            description: payload.description,
            location: payload.location.trim().to_string(),
            job_type: payload.job_type,
            ctc_total: payload.ctc_total,
            total_rounds,
            recruitment_process: stages,
            current_recruitment_stage: 1,
            current_application_count: 0,
            job_status: JobStatus::Open,
            application_deadline: payload.application_deadline,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };

        let offer = self.repo.insert_job_offer(offer).await?;
        tracing::info!(
            job_offer_id = %offer.id,
            company_id = %company_id,
            total_rounds = offer.total_rounds,
            "job offer published"
        );
        Ok(offer)
    }

    pub async fn get(&self, id: Uuid) -> Result<JobOffer> {
        self.repo
            .find_job_offer(id)
            .await?
            .ok_or_else(|| Error::NotFound("Job offer not found".to_string()))
    }

    /// Offers students can still look at: open or mid-pipeline, newest first.
    pub async fn list_open(&self) -> Result<Vec<JobOffer>> {
        self.repo
            .list_job_offers(&JobOfferFilter {
                company_id: None,
                statuses: vec![JobStatus::Open, JobStatus::InProgress],
            })
            .await
    }

    pub async fn list_for_company(&self, company_id: Uuid) -> Result<Vec<JobOffer>> {
        self.repo
            .list_job_offers(&JobOfferFilter {
                company_id: Some(company_id),
                statuses: Vec::new(),
            })
            .await
    }

    pub async fn cancel(&self, company_id: Uuid, id: Uuid) -> Result<JobOffer> {
        let offer = load_owned_offer(self.repo.as_ref(), company_id, id).await?;
        let cancelled = self
            .repo
            .cancel_job_offer(offer.id, time::now())
            .await?
            .ok_or_else(|| {
                Error::InvalidState(format!(
                    "A {} job offer cannot be cancelled",
                    offer.job_status
                ))
            })?;

        tracing::info!(job_offer_id = %cancelled.id, "job offer cancelled");
        Ok(cancelled)
    }
}
