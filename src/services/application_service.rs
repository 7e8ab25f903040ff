use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::dto::application_dto::{
    ApplicantView, ApplicationCheck, ApplicationCountReconciliation, StudentApplicationView,
};
use crate::error::{Error, Result};
use crate::models::application::Application;
use crate::models::job_offer::JobStatus;
use crate::repository::{ApplicationFilter, PipelineRepository, StudentDirectory};
use crate::services::load_owned_offer;
use crate::utils::time;

/// Student-facing entry point of the pipeline: applying and looking up one's applications.
#[derive(Clone)]
pub struct ApplicationService {
    repo: Arc<dyn PipelineRepository>,
    directory: Arc<dyn StudentDirectory>,
}

impl ApplicationService {
    pub fn new(repo: Arc<dyn PipelineRepository>, directory: Arc<dyn StudentDirectory>) -> Self {
        Self { repo, directory }
    }

    /// Creates the student's application in round 1 and bumps the offer's counter.
    ///
    /// The duplicate lookup only produces the friendlier error ordering; the repository's
    /// uniqueness key is what actually stops two concurrent applies from both landing.
    pub async fn apply(&self, student_id: Uuid, job_offer_id: Uuid) -> Result<Application> {
        let offer = self
            .repo
            .find_job_offer(job_offer_id)
            .await?
            .filter(|offer| offer.job_status != JobStatus::Cancelled)
            .ok_or_else(|| Error::NotFound("Job offer not found or cancelled".to_string()))?;

        if self
            .repo
            .find_application(student_id, job_offer_id)
            .await?
            .is_some()
        {
            return Err(Error::Conflict(
                "You have already applied for this job".to_string(),
            ));
        }

        let now = time::now();
        if offer.deadline_passed(now) {
            return Err(Error::Expired("Application deadline has passed".to_string()));
        }
        if offer.is_completed() {
            return Err(Error::Expired(
                "Hiring for this job offer has been completed".to_string(),
            ));
        }
        // A late entrant in round 1 would sit below the active stage with no way forward.
        if offer.current_recruitment_stage > 1 {
            return Err(Error::Expired(
                "Recruitment for this job offer has already moved past the first round"
                    .to_string(),
            ));
        }

        let application = self
            .repo
            .insert_application(Application::new(student_id, &offer, now))
            .await?;

        tracing::info!(
            application_id = %application.id,
            student_id = %student_id,
            job_offer_id = %job_offer_id,
            "application submitted"
        );
        Ok(application)
    }

    pub async fn check_application_status(
        &self,
        student_id: Uuid,
        job_offer_id: Uuid,
    ) -> Result<ApplicationCheck> {
        let application = self.repo.find_application(student_id, job_offer_id).await?;
        Ok(ApplicationCheck {
            is_applied: application.is_some(),
            application_id: application.map(|app| app.id),
        })
    }

    pub async fn list_student_applications(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<StudentApplicationView>> {
        let applications = self
            .repo
            .list_applications(&ApplicationFilter::for_student(student_id), None)
            .await?;

        let mut offers = HashMap::new();
        for application in &applications {
            if !offers.contains_key(&application.job_offer_id) {
                let offer = self.repo.find_job_offer(application.job_offer_id).await?;
                offers.insert(application.job_offer_id, offer);
            }
        }

        Ok(applications
            .into_iter()
            .map(|application| {
                let job_offer = offers
                    .get(&application.job_offer_id)
                    .and_then(|offer| offer.as_ref())
                    .map(Into::into);
                StudentApplicationView {
                    application,
                    job_offer,
                }
            })
            .collect())
    }

    /// Every application of an owned offer, newest first, with applicant display fields.
    pub async fn list_job_applications(
        &self,
        company_id: Uuid,
        job_offer_id: Uuid,
    ) -> Result<Vec<ApplicantView>> {
        let offer = load_owned_offer(self.repo.as_ref(), company_id, job_offer_id).await?;
        let applications = self
            .repo
            .list_applications(&ApplicationFilter::for_job_offer(offer.id), None)
            .await?;
        join_profiles(self.directory.as_ref(), applications).await
    }

    /// Recomputes the cached application counter from the application records.
    pub async fn reconcile_application_count(
        &self,
        company_id: Uuid,
        job_offer_id: Uuid,
    ) -> Result<ApplicationCountReconciliation> {
        let offer = load_owned_offer(self.repo.as_ref(), company_id, job_offer_id).await?;
        let counted = self
            .repo
            .count_applications(&ApplicationFilter::for_job_offer(offer.id))
            .await?;
        let counted = i32::try_from(counted)
            .map_err(|_| Error::Internal("application count overflows i32".to_string()))?;

        if counted != offer.current_application_count {
            tracing::warn!(
                job_offer_id = %offer.id,
                cached = offer.current_application_count,
                counted,
                "application counter drifted; correcting"
            );
            self.repo.store_application_count(offer.id, counted).await?;
        }

        Ok(ApplicationCountReconciliation {
            job_offer_id: offer.id,
            previous_count: offer.current_application_count,
            application_count: counted,
        })
    }
}

pub(crate) async fn join_profiles(
    directory: &dyn StudentDirectory,
    applications: Vec<Application>,
) -> Result<Vec<ApplicantView>> {
    let student_ids: Vec<Uuid> = applications.iter().map(|app| app.student_id).collect();
    let mut profiles = directory.profiles(&student_ids).await?;
    Ok(applications
        .into_iter()
        .map(|application| ApplicantView {
            student: profiles.remove(&application.student_id),
            application,
        })
        .collect())
}
