use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;
use crate::models::job_offer::JobOffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationStatus {
    InProgress,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::InProgress => "in-progress",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// `accepted` and `rejected` have no outgoing transition except the reject override.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApplicationStatus::InProgress)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in-progress" => Ok(ApplicationStatus::InProgress),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(Error::Internal(format!(
                "Unknown application status: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub student_id: Uuid,
    pub job_offer_id: Uuid,
    pub current_round: i32,
    /// Snapshot of the offer's round count when the student applied.
    pub total_rounds: i32,
    pub application_status: ApplicationStatus,
    pub applied_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn new(student_id: Uuid, offer: &JobOffer, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id,
            job_offer_id: offer.id,
            current_round: 1,
            total_rounds: offer.total_rounds,
            application_status: ApplicationStatus::InProgress,
            applied_date: now,
            updated_at: now,
        }
    }
}

/// Per-status tallies over a set of applications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub total: i64,
    pub in_progress: i64,
    pub accepted: i64,
    pub rejected: i64,
}

impl StatusCounts {
    pub fn add(&mut self, status: ApplicationStatus, count: i64) {
        match status {
            ApplicationStatus::InProgress => self.in_progress += count,
            ApplicationStatus::Accepted => self.accepted += count,
            ApplicationStatus::Rejected => self.rejected += count,
        }
        self.total += count;
    }
}

impl FromIterator<ApplicationStatus> for StatusCounts {
    fn from_iter<I: IntoIterator<Item = ApplicationStatus>>(iter: I) -> Self {
        let mut counts = StatusCounts::default();
        for status in iter {
            counts.add(status, 1);
        }
        counts
    }
}
