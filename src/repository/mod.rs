//! Storage seam for the recruitment pipeline.
//!
//! Services only talk to [`PipelineRepository`] and [`StudentDirectory`], so the same
//! transition rules run against Postgres in production and against the in-memory
//! store in tests. Every implementation must enforce the `(student_id, job_offer_id)`
//! uniqueness key itself instead of relying on a caller-side existence check.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::Result;
use crate::models::application::{Application, ApplicationStatus, StatusCounts};
use crate::models::job_offer::{JobOffer, JobStatus};
use crate::models::student::StudentProfile;

pub use memory::{InMemoryPipelineRepository, InMemoryStudentDirectory};
pub use postgres::{PgPipelineRepository, PgStudentDirectory};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub job_offer_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    pub round: Option<i32>,
    pub status: Option<ApplicationStatus>,
}

impl ApplicationFilter {
    pub fn for_job_offer(job_offer_id: Uuid) -> Self {
        Self {
            job_offer_id: Some(job_offer_id),
            ..Self::default()
        }
    }

    pub fn for_student(student_id: Uuid) -> Self {
        Self {
            student_id: Some(student_id),
            ..Self::default()
        }
    }

    pub fn in_round(mut self, round: i32) -> Self {
        self.round = Some(round);
        self
    }

    pub fn with_status(mut self, status: ApplicationStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, application: &Application) -> bool {
        self.job_offer_id
            .map_or(true, |id| application.job_offer_id == id)
            && self
                .student_id
                .map_or(true, |id| application.student_id == id)
            && self
                .round
                .map_or(true, |round| application.current_round == round)
            && self
                .status
                .map_or(true, |status| application.application_status == status)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobOfferFilter {
    pub company_id: Option<Uuid>,
    /// Empty means any status.
    pub statuses: Vec<JobStatus>,
}

impl JobOfferFilter {
    pub fn matches(&self, offer: &JobOffer) -> bool {
        self.company_id.map_or(true, |id| offer.company_id == id)
            && (self.statuses.is_empty() || self.statuses.contains(&offer.job_status))
    }
}

/// Offset window for paginated reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: i64,
    pub limit: i64,
}

#[async_trait]
pub trait PipelineRepository: Send + Sync {
    async fn insert_job_offer(&self, offer: JobOffer) -> Result<JobOffer>;

    async fn find_job_offer(&self, id: Uuid) -> Result<Option<JobOffer>>;

    /// Newest first.
    async fn list_job_offers(&self, filter: &JobOfferFilter) -> Result<Vec<JobOffer>>;

    /// Sets `completed` only while the offer sits in its final stage and is not completed yet.
    async fn complete_job_offer(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<JobOffer>>;

    /// Sets `cancelled` unless the offer is already completed or cancelled.
    async fn cancel_job_offer(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<JobOffer>>;

    /// Creates the application and bumps the offer's application counter as one unit.
    /// Fails with `Conflict` when the student already applied.
    async fn insert_application(&self, application: Application) -> Result<Application>;

    async fn find_application(
        &self,
        student_id: Uuid,
        job_offer_id: Uuid,
    ) -> Result<Option<Application>>;

    /// Newest first (by applied date).
    async fn list_applications(
        &self,
        filter: &ApplicationFilter,
        window: Option<Window>,
    ) -> Result<Vec<Application>>;

    async fn count_applications(&self, filter: &ApplicationFilter) -> Result<i64>;

    /// Raw per-status counts for an offer, optionally narrowed to one round.
    async fn status_counts(&self, job_offer_id: Uuid, round: Option<i32>) -> Result<StatusCounts>;

    /// Moves the `in-progress` applications among `ids` that sit in `from_round` into
    /// `to_round` with `status`. Returns the ids actually updated.
    async fn move_to_round(
        &self,
        job_offer_id: Uuid,
        ids: &[Uuid],
        from_round: i32,
        to_round: i32,
        status: ApplicationStatus,
        at: DateTime<Utc>,
    ) -> Result<Vec<Uuid>>;

    /// Rejects every application among `ids` that belongs to the offer. Returns the ids updated.
    async fn reject_applications(
        &self,
        job_offer_id: Uuid,
        ids: &[Uuid],
        at: DateTime<Utc>,
    ) -> Result<Vec<Uuid>>;

    /// Rejects the stragglers of `round` and then moves the offer's stage to `round + 1`,
    /// marking an `open` offer `in-progress`.
    /// Returns `None` without touching anything when the offer's stage is no longer `round`.
    async fn close_round(
        &self,
        job_offer_id: Uuid,
        round: i32,
        at: DateTime<Utc>,
    ) -> Result<Option<u64>>;

    async fn store_application_count(&self, job_offer_id: Uuid, count: i32) -> Result<()>;
}

/// Read-only lookup of student display fields.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StudentDirectory: Send + Sync {
    async fn profiles(&self, student_ids: &[Uuid]) -> Result<HashMap<Uuid, StudentProfile>>;
}
