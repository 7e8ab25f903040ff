use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Open => "open",
            JobStatus::InProgress => "in-progress",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(JobStatus::Open),
            "in-progress" => Ok(JobStatus::InProgress),
            "completed" => Ok(JobStatus::Completed),
            "cancelled" => Ok(JobStatus::Cancelled),
            other => Err(Error::Internal(format!("Unknown job status: {}", other))),
        }
    }
}

/// One ordered step of a job offer's hiring process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecruitmentStage {
    pub stage_name: String,
    pub stage_order: i32,
    pub date: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

/// How a requested round relates to the offer's active stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    Completed,
    Active,
    Future,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOffer {
    pub id: Uuid,
    pub company_id: Uuid,
    pub title: String,
    pub role: String,
    pub description: String,
    pub location: String,
    pub job_type: String,
    pub ctc_total: Decimal,
    pub recruitment_process: Vec<RecruitmentStage>,
    pub total_rounds: i32,
    pub current_recruitment_stage: i32,
    pub current_application_count: i32,
    pub job_status: JobStatus,
    pub application_deadline: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobOffer {
    pub fn is_owned_by(&self, company_id: Uuid) -> bool {
        self.company_id == company_id
    }

    pub fn is_final_round(&self, round: i32) -> bool {
        round == self.total_rounds
    }

    pub fn round_phase(&self, round: i32) -> RoundPhase {
        match round.cmp(&self.current_recruitment_stage) {
            std::cmp::Ordering::Less => RoundPhase::Completed,
            std::cmp::Ordering::Equal => RoundPhase::Active,
            std::cmp::Ordering::Greater => RoundPhase::Future,
        }
    }

    pub fn deadline_passed(&self, now: DateTime<Utc>) -> bool {
        now > self.application_deadline
    }

    pub fn is_completed(&self) -> bool {
        self.job_status == JobStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn offer(total_rounds: i32, stage: i32) -> JobOffer {
        let now = Utc::now();
        JobOffer {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            title: "SDE".into(),
            role: "Backend".into(),
            description: "Build things".into(),
            location: "Pune".into(),
            job_type: "full-time".into(),
            ctc_total: Decimal::new(1_200_000, 0),
            recruitment_process: Vec::new(),
            total_rounds,
            current_recruitment_stage: stage,
            current_application_count: 0,
            job_status: JobStatus::Open,
            application_deadline: now + Duration::days(3),
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn round_phase_is_relative_to_active_stage() {
        let offer = offer(4, 2);
        assert_eq!(offer.round_phase(1), RoundPhase::Completed);
        assert_eq!(offer.round_phase(2), RoundPhase::Active);
        assert_eq!(offer.round_phase(3), RoundPhase::Future);
        assert!(offer.is_final_round(4));
        assert!(!offer.is_final_round(3));
    }

    #[test]
    fn job_status_round_trips_through_its_label() {
        for status in [
            JobStatus::Open,
            JobStatus::InProgress,
            JobStatus::Completed,
            JobStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
        assert!("archived".parse::<JobStatus>().is_err());
    }

    #[test]
    fn deadline_is_exclusive() {
        let offer = offer(2, 1);
        assert!(!offer.deadline_passed(offer.application_deadline));
        assert!(offer.deadline_passed(offer.application_deadline + Duration::seconds(1)));
    }
}
