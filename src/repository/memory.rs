use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use uuid::Uuid;

use super::{
    ApplicationFilter, JobOfferFilter, PipelineRepository, StudentDirectory, Window,
};
use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationStatus, StatusCounts};
use crate::models::job_offer::{JobOffer, JobStatus};
use crate::models::student::StudentProfile;

#[derive(Debug, Default)]
struct MemoryState {
    job_offers: HashMap<Uuid, JobOffer>,
    /// Insertion order doubles as the tie-breaker for equal applied dates.
    applications: Vec<Application>,
    application_keys: HashSet<(Uuid, Uuid)>,
}

impl MemoryState {
    fn newest_first<'a>(
        &'a self,
        filter: &'a ApplicationFilter,
    ) -> impl Iterator<Item = &'a Application> + 'a {
        let mut matched: Vec<&Application> = self
            .applications
            .iter()
            .rev()
            .filter(|app| filter.matches(app))
            .collect();
        matched.sort_by(|a, b| b.applied_date.cmp(&a.applied_date));
        matched.into_iter()
    }
}

/// Process-local store used by tests and by deployments without `DATABASE_URL`.
///
/// Every operation runs inside a single critical section, which makes each call
/// atomic the same way a Postgres transaction would.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPipelineRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryPipelineRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| Error::Internal("in-memory pipeline store is poisoned".to_string()))
    }
}

#[async_trait]
impl PipelineRepository for InMemoryPipelineRepository {
    async fn insert_job_offer(&self, offer: JobOffer) -> Result<JobOffer> {
        let mut state = self.lock()?;
        if state.job_offers.contains_key(&offer.id) {
            return Err(Error::Conflict("Job offer already exists".to_string()));
        }
        state.job_offers.insert(offer.id, offer.clone());
        Ok(offer)
    }

    async fn find_job_offer(&self, id: Uuid) -> Result<Option<JobOffer>> {
        Ok(self.lock()?.job_offers.get(&id).cloned())
    }

    async fn list_job_offers(&self, filter: &JobOfferFilter) -> Result<Vec<JobOffer>> {
        let state = self.lock()?;
        let mut offers: Vec<JobOffer> = state
            .job_offers
            .values()
            .filter(|offer| filter.matches(offer))
            .cloned()
            .collect();
        offers.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(offers)
    }

    async fn complete_job_offer(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<JobOffer>> {
        let mut state = self.lock()?;
        let Some(offer) = state.job_offers.get_mut(&id) else {
            return Ok(None);
        };
        if offer.current_recruitment_stage != offer.total_rounds || offer.is_completed() {
            return Ok(None);
        }
        offer.job_status = JobStatus::Completed;
        offer.completed_at = Some(at);
        offer.updated_at = at;
        Ok(Some(offer.clone()))
    }

    async fn cancel_job_offer(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<JobOffer>> {
        let mut state = self.lock()?;
        let Some(offer) = state.job_offers.get_mut(&id) else {
            return Ok(None);
        };
        if matches!(offer.job_status, JobStatus::Completed | JobStatus::Cancelled) {
            return Ok(None);
        }
        offer.job_status = JobStatus::Cancelled;
        offer.updated_at = at;
        Ok(Some(offer.clone()))
    }

    async fn insert_application(&self, application: Application) -> Result<Application> {
        let mut state = self.lock()?;
        let key = (application.student_id, application.job_offer_id);
        if state.application_keys.contains(&key) {
            return Err(Error::Conflict(
                "You have already applied for this job".to_string(),
            ));
        }
        let Some(offer) = state.job_offers.get_mut(&application.job_offer_id) else {
            return Err(Error::NotFound("Job offer not found".to_string()));
        };
        offer.current_application_count += 1;
        state.application_keys.insert(key);
        state.applications.push(application.clone());
        Ok(application)
    }

    async fn find_application(
        &self,
        student_id: Uuid,
        job_offer_id: Uuid,
    ) -> Result<Option<Application>> {
        let state = self.lock()?;
        Ok(state
            .applications
            .iter()
            .find(|app| app.student_id == student_id && app.job_offer_id == job_offer_id)
            .cloned())
    }

    async fn list_applications(
        &self,
        filter: &ApplicationFilter,
        window: Option<Window>,
    ) -> Result<Vec<Application>> {
        let state = self.lock()?;
        let matched = state.newest_first(filter).cloned();
        let items = match window {
            Some(window) => matched
                .skip(usize::try_from(window.offset.max(0)).unwrap_or(usize::MAX))
                .take(usize::try_from(window.limit.max(0)).unwrap_or(0))
                .collect(),
            None => matched.collect(),
        };
        Ok(items)
    }

    async fn count_applications(&self, filter: &ApplicationFilter) -> Result<i64> {
        let state = self.lock()?;
        Ok(state
            .applications
            .iter()
            .filter(|app| filter.matches(app))
            .count() as i64)
    }

    async fn status_counts(&self, job_offer_id: Uuid, round: Option<i32>) -> Result<StatusCounts> {
        let filter = ApplicationFilter {
            job_offer_id: Some(job_offer_id),
            round,
            ..ApplicationFilter::default()
        };
        let state = self.lock()?;
        Ok(state
            .applications
            .iter()
            .filter(|app| filter.matches(app))
            .map(|app| app.application_status)
            .collect())
    }

    async fn move_to_round(
        &self,
        job_offer_id: Uuid,
        ids: &[Uuid],
        from_round: i32,
        to_round: i32,
        status: ApplicationStatus,
        at: DateTime<Utc>,
    ) -> Result<Vec<Uuid>> {
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        let mut state = self.lock()?;
        let mut updated = Vec::new();
        for app in state.applications.iter_mut() {
            if app.job_offer_id == job_offer_id
                && app.current_round == from_round
                && app.application_status == ApplicationStatus::InProgress
                && wanted.contains(&app.id)
            {
                app.current_round = to_round;
                app.application_status = status;
                app.updated_at = at;
                updated.push(app.id);
            }
        }
        Ok(updated)
    }

    async fn reject_applications(
        &self,
        job_offer_id: Uuid,
        ids: &[Uuid],
        at: DateTime<Utc>,
    ) -> Result<Vec<Uuid>> {
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        let mut state = self.lock()?;
        let mut updated = Vec::new();
        for app in state.applications.iter_mut() {
            if app.job_offer_id == job_offer_id && wanted.contains(&app.id) {
                app.application_status = ApplicationStatus::Rejected;
                app.updated_at = at;
                updated.push(app.id);
            }
        }
        Ok(updated)
    }

    async fn close_round(
        &self,
        job_offer_id: Uuid,
        round: i32,
        at: DateTime<Utc>,
    ) -> Result<Option<u64>> {
        let mut state = self.lock()?;
        match state.job_offers.get(&job_offer_id) {
            None => return Err(Error::NotFound("Job offer not found".to_string())),
            Some(offer) if offer.current_recruitment_stage != round => return Ok(None),
            Some(_) => {}
        }

        let mut rejected = 0u64;
        for app in state.applications.iter_mut() {
            if app.job_offer_id == job_offer_id
                && app.current_round == round
                && app.application_status == ApplicationStatus::InProgress
            {
                app.application_status = ApplicationStatus::Rejected;
                app.updated_at = at;
                rejected += 1;
            }
        }

        if let Some(offer) = state.job_offers.get_mut(&job_offer_id) {
            offer.current_recruitment_stage = round + 1;
            if offer.job_status == JobStatus::Open {
                offer.job_status = JobStatus::InProgress;
            }
            offer.updated_at = at;
        }
        Ok(Some(rejected))
    }

    async fn store_application_count(&self, job_offer_id: Uuid, count: i32) -> Result<()> {
        let mut state = self.lock()?;
        let offer = state
            .job_offers
            .get_mut(&job_offer_id)
            .ok_or_else(|| Error::NotFound("Job offer not found".to_string()))?;
        offer.current_application_count = count;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStudentDirectory {
    profiles: Arc<RwLock<HashMap<Uuid, StudentProfile>>>,
}

impl InMemoryStudentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, profile: StudentProfile) -> Result<()> {
        let mut profiles = self
            .profiles
            .write()
            .map_err(|_| Error::Internal("student directory is poisoned".to_string()))?;
        profiles.insert(profile.id, profile);
        Ok(())
    }
}

#[async_trait]
impl StudentDirectory for InMemoryStudentDirectory {
    async fn profiles(&self, student_ids: &[Uuid]) -> Result<HashMap<Uuid, StudentProfile>> {
        let profiles = self
            .profiles
            .read()
            .map_err(|_| Error::Internal("student directory is poisoned".to_string()))?;
        Ok(student_ids
            .iter()
            .filter_map(|id| profiles.get(id).map(|profile| (*id, profile.clone())))
            .collect())
    }
}
