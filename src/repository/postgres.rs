use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

use super::{
    ApplicationFilter, JobOfferFilter, PipelineRepository, StudentDirectory, Window,
};
use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationStatus, StatusCounts};
use crate::models::job_offer::{JobOffer, RecruitmentStage};
use crate::models::student::StudentProfile;

const JOB_OFFER_COLUMNS: &str = "id, company_id, title, role, description, location, job_type, \
     ctc_total, recruitment_process, total_rounds, current_recruitment_stage, \
     current_application_count, job_status, application_deadline, completed_at, created_at, updated_at";

const APPLICATION_COLUMNS: &str = "id, student_id, job_offer_id, current_round, total_rounds, \
     application_status, applied_date, updated_at";

#[derive(Debug, FromRow)]
struct JobOfferRow {
    id: Uuid,
    company_id: Uuid,
    title: String,
    role: String,
    description: String,
    location: String,
    job_type: String,
    ctc_total: Decimal,
    recruitment_process: Json<Vec<RecruitmentStage>>,
    total_rounds: i32,
    current_recruitment_stage: i32,
    current_application_count: i32,
    job_status: String,
    application_deadline: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobOfferRow> for JobOffer {
    type Error = Error;

    fn try_from(row: JobOfferRow) -> Result<Self> {
        Ok(JobOffer {
            id: row.id,
            company_id: row.company_id,
            title: row.title,
            role: row.role,
            description: row.description,
            location: row.location,
            job_type: row.job_type,
            ctc_total: row.ctc_total,
            recruitment_process: row.recruitment_process.0,
            total_rounds: row.total_rounds,
            current_recruitment_stage: row.current_recruitment_stage,
            current_application_count: row.current_application_count,
            job_status: row.job_status.parse()?,
            application_deadline: row.application_deadline,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ApplicationRow {
    id: Uuid,
    student_id: Uuid,
    job_offer_id: Uuid,
    current_round: i32,
    total_rounds: i32,
    application_status: String,
    applied_date: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = Error;

    fn try_from(row: ApplicationRow) -> Result<Self> {
        Ok(Application {
            id: row.id,
            student_id: row.student_id,
            job_offer_id: row.job_offer_id,
            current_round: row.current_round,
            total_rounds: row.total_rounds,
            application_status: row.application_status.parse()?,
            applied_date: row.applied_date,
            updated_at: row.updated_at,
        })
    }
}

fn push_application_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ApplicationFilter) {
    qb.push(" WHERE TRUE");
    if let Some(job_offer_id) = filter.job_offer_id {
        qb.push(" AND job_offer_id = ").push_bind(job_offer_id);
    }
    if let Some(student_id) = filter.student_id {
        qb.push(" AND student_id = ").push_bind(student_id);
    }
    if let Some(round) = filter.round {
        qb.push(" AND current_round = ").push_bind(round);
    }
    if let Some(status) = filter.status {
        qb.push(" AND application_status = ")
            .push_bind(status.as_str());
    }
}

#[derive(Clone)]
pub struct PgPipelineRepository {
    pool: PgPool,
}

impl PgPipelineRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PipelineRepository for PgPipelineRepository {
    async fn insert_job_offer(&self, offer: JobOffer) -> Result<JobOffer> {
        let row = sqlx::query_as::<_, JobOfferRow>(&format!(
            r#"
            INSERT INTO job_offers (
                id, company_id, title, role, description, location, job_type,
                ctc_total, recruitment_process, total_rounds, current_recruitment_stage,
                current_application_count, job_status, application_deadline, completed_at,
                created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7,
                $8, $9, $10, $11,
                $12, $13, $14, $15,
                $16, $17
            )
            RETURNING {}
            "#,
            JOB_OFFER_COLUMNS
        ))
        .bind(offer.id)
        .bind(offer.company_id)
        .bind(&offer.title)
        .bind(&offer.role)
        .bind(&offer.description)
        .bind(&offer.location)
        .bind(&offer.job_type)
        .bind(offer.ctc_total)
        .bind(Json(&offer.recruitment_process))
        .bind(offer.total_rounds)
        .bind(offer.current_recruitment_stage)
        .bind(offer.current_application_count)
        .bind(offer.job_status.as_str())
        .bind(offer.application_deadline)
        .bind(offer.completed_at)
        .bind(offer.created_at)
        .bind(offer.updated_at)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_job_offer(&self, id: Uuid) -> Result<Option<JobOffer>> {
        let row = sqlx::query_as::<_, JobOfferRow>(&format!(
            "SELECT {} FROM job_offers WHERE id = $1",
            JOB_OFFER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(JobOffer::try_from).transpose()
    }

    async fn list_job_offers(&self, filter: &JobOfferFilter) -> Result<Vec<JobOffer>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM job_offers WHERE TRUE",
            JOB_OFFER_COLUMNS
        ));
        if let Some(company_id) = filter.company_id {
            qb.push(" AND company_id = ").push_bind(company_id);
        }
        if !filter.statuses.is_empty() {
            let statuses: Vec<String> = filter
                .statuses
                .iter()
                .map(|status| status.as_str().to_string())
                .collect();
            qb.push(" AND job_status = ANY(").push_bind(statuses).push(")");
        }
        qb.push(" ORDER BY created_at DESC, id");

        let rows = qb
            .build_query_as::<JobOfferRow>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(JobOffer::try_from).collect()
    }

    async fn complete_job_offer(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<JobOffer>> {
        let row = sqlx::query_as::<_, JobOfferRow>(&format!(
            r#"
            UPDATE job_offers
            SET job_status = 'completed', completed_at = $2, updated_at = $2
            WHERE id = $1
              AND current_recruitment_stage = total_rounds
              AND job_status <> 'completed'
            RETURNING {}
            "#,
            JOB_OFFER_COLUMNS
        ))
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        row.map(JobOffer::try_from).transpose()
    }

    async fn cancel_job_offer(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<JobOffer>> {
        let row = sqlx::query_as::<_, JobOfferRow>(&format!(
            r#"
            UPDATE job_offers
            SET job_status = 'cancelled', updated_at = $2
            WHERE id = $1 AND job_status NOT IN ('completed', 'cancelled')
            RETURNING {}
            "#,
            JOB_OFFER_COLUMNS
        ))
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        row.map(JobOffer::try_from).transpose()
    }

    async fn insert_application(&self, application: Application) -> Result<Application> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            INSERT INTO applications (
                id, student_id, job_offer_id, current_round, total_rounds,
                application_status, applied_date, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (student_id, job_offer_id) DO NOTHING
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(application.id)
        .bind(application.student_id)
        .bind(application.job_offer_id)
        .bind(application.current_round)
        .bind(application.total_rounds)
        .bind(application.application_status.as_str())
        .bind(application.applied_date)
        .bind(application.updated_at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = inserted else {
            return Err(Error::Conflict(
                "You have already applied for this job".to_string(),
            ));
        };

        sqlx::query(
            r#"
            UPDATE job_offers
            SET current_application_count = current_application_count + 1, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(application.job_offer_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    async fn find_application(
        &self,
        student_id: Uuid,
        job_offer_id: Uuid,
    ) -> Result<Option<Application>> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {} FROM applications WHERE student_id = $1 AND job_offer_id = $2",
            APPLICATION_COLUMNS
        ))
        .bind(student_id)
        .bind(job_offer_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Application::try_from).transpose()
    }

    async fn list_applications(
        &self,
        filter: &ApplicationFilter,
        window: Option<Window>,
    ) -> Result<Vec<Application>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM applications",
            APPLICATION_COLUMNS
        ));
        push_application_filter(&mut qb, filter);
        qb.push(" ORDER BY applied_date DESC, id");
        if let Some(window) = window {
            qb.push(" LIMIT ")
                .push_bind(window.limit)
                .push(" OFFSET ")
                .push_bind(window.offset);
        }

        let rows = qb
            .build_query_as::<ApplicationRow>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Application::try_from).collect()
    }

    async fn count_applications(&self, filter: &ApplicationFilter) -> Result<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM applications");
        push_application_filter(&mut qb, filter);
        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn status_counts(&self, job_offer_id: Uuid, round: Option<i32>) -> Result<StatusCounts> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT application_status, COUNT(*)
            FROM applications
            WHERE job_offer_id = $1 AND ($2::INTEGER IS NULL OR current_round = $2)
            GROUP BY application_status
            "#,
        )
        .bind(job_offer_id)
        .bind(round)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            counts.add(status.parse()?, count);
        }
        Ok(counts)
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
        let updated = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE applications
            SET current_round = $4, application_status = $5, updated_at = $6
            WHERE job_offer_id = $1
              AND id = ANY($2)
              AND current_round = $3
              AND application_status = 'in-progress'
            RETURNING id
            "#,
        )
        .bind(job_offer_id)
        .bind(ids)
        .bind(from_round)
        .bind(to_round)
        .bind(status.as_str())
        .bind(at)
        .fetch_all(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn reject_applications(
        &self,
        job_offer_id: Uuid,
        ids: &[Uuid],
        at: DateTime<Utc>,
    ) -> Result<Vec<Uuid>> {
        let updated = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE applications
            SET application_status = 'rejected', updated_at = $3
            WHERE job_offer_id = $1 AND id = ANY($2)
            RETURNING id
            "#,
        )
        .bind(job_offer_id)
        .bind(ids)
        .bind(at)
        .fetch_all(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn close_round(
        &self,
        job_offer_id: Uuid,
        round: i32,
        at: DateTime<Utc>,
    ) -> Result<Option<u64>> {
        let mut tx = self.pool.begin().await?;

        let stage = sqlx::query_scalar::<_, i32>(
            "SELECT current_recruitment_stage FROM job_offers WHERE id = $1 FOR UPDATE",
        )
        .bind(job_offer_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound("Job offer not found".to_string()))?;

        if stage != round {
            return Ok(None);
        }

        let rejected = sqlx::query(
            r#"
            UPDATE applications
            SET application_status = 'rejected', updated_at = $3
            WHERE job_offer_id = $1
              AND current_round = $2
              AND application_status = 'in-progress'
            "#,
        )
        .bind(job_offer_id)
        .bind(round)
        .bind(at)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query(
            r#"
            UPDATE job_offers
            SET current_recruitment_stage = $2,
                job_status = CASE WHEN job_status = 'open' THEN 'in-progress' ELSE job_status END,
                updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(job_offer_id)
        .bind(round + 1)
        .bind(at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(rejected))
    }

    async fn store_application_count(&self, job_offer_id: Uuid, count: i32) -> Result<()> {
        let result = sqlx::query(
            "UPDATE job_offers SET current_application_count = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(job_offer_id)
        .bind(count)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Job offer not found".to_string()));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgStudentDirectory {
    pool: PgPool,
}

impl PgStudentDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StudentDirectory for PgStudentDirectory {
    async fn profiles(&self, student_ids: &[Uuid]) -> Result<HashMap<Uuid, StudentProfile>> {
        if student_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let profiles = sqlx::query_as::<_, StudentProfile>(
            r#"SELECT id, name, email, department, cgpa FROM students WHERE id = ANY($1)"#,
        )
        .bind(student_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles
            .into_iter()
            .map(|profile| (profile.id, profile))
            .collect())
    }
}
