use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::application::StatusCounts;
use crate::models::job_offer::JobOffer;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PushToNextRoundPayload {
    #[validate(length(min = 1, message = "Application IDs are required"))]
    pub application_ids: Vec<Uuid>,
    #[validate(range(min = 1))]
    pub current_round: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RejectSelectedPayload {
    #[validate(length(min = 1, message = "Application IDs are required"))]
    pub application_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdvanceRoundPayload {
    #[validate(range(min = 1))]
    pub current_round: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushOutcome {
    pub pushed_count: usize,
    pub next_round: i32,
    pub is_final_round: bool,
    /// Requested ids that were not in the source round (or no longer in progress).
    pub skipped_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectOutcome {
    pub rejected_count: usize,
    /// Requested ids that do not belong to the job offer.
    pub skipped_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceOutcome {
    pub new_round: i32,
    pub students_in_next_round: i64,
    pub auto_rejected: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionOutcome {
    pub job_offer: JobOffer,
    pub final_stats: StatusCounts,
}
