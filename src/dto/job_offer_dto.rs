use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::job_offer::{JobOffer, JobStatus, RecruitmentStage};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecruitmentStagePayload {
    pub stage_name: String,
    pub stage_order: Option<i32>,
    pub date: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateJobOfferPayload {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub role: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(min = 1))]
    pub location: String,
    #[serde(default = "default_job_type")]
    pub job_type: String,
    #[validate(custom(function = "validate_ctc_total"))]
    pub ctc_total: Decimal,
    #[validate(length(
        min = 1,
        max = 20,
        message = "A recruitment process needs between 1 and 20 stages"
    ))]
    pub recruitment_process: Vec<RecruitmentStagePayload>,
    pub application_deadline: DateTime<Utc>,
}

fn default_job_type() -> String {
    "full-time".to_string()
}

fn validate_ctc_total(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        let mut error = ValidationError::new("range");
        error.message = Some("CTC total must be greater than 0".into());
        return Err(error);
    }
    Ok(())
}

impl CreateJobOfferPayload {
    /// Orders stages by their declared order (falling back to position) and renumbers them 1..N.
    pub fn normalized_stages(&self) -> Vec<RecruitmentStage> {
        let mut stages: Vec<(i32, usize, &RecruitmentStagePayload)> = self
            .recruitment_process
            .iter()
            .enumerate()
            .map(|(idx, stage)| (stage.stage_order.unwrap_or(idx as i32 + 1), idx, stage))
            .collect();
        stages.sort_by_key(|(order, idx, _)| (*order, *idx));

        stages
            .into_iter()
            .enumerate()
            .map(|(position, (_, _, stage))| RecruitmentStage {
                stage_name: stage.stage_name.trim().to_string(),
                stage_order: position as i32 + 1,
                date: stage.date,
                description: stage.description.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOfferSummary {
    pub id: Uuid,
    pub company_id: Uuid,
    pub title: String,
    pub role: String,
    pub location: String,
    pub job_status: JobStatus,
    pub current_recruitment_stage: i32,
    pub total_rounds: i32,
    pub application_deadline: DateTime<Utc>,
}

impl From<&JobOffer> for JobOfferSummary {
    fn from(value: &JobOffer) -> Self {
        Self {
            id: value.id,
            company_id: value.company_id,
            title: value.title.clone(),
            role: value.role.clone(),
            location: value.location.clone(),
            job_status: value.job_status,
            current_recruitment_stage: value.current_recruitment_stage,
            total_rounds: value.total_rounds,
            application_deadline: value.application_deadline,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOfferListResponse {
    pub items: Vec<JobOfferSummary>,
    pub total: usize,
}

impl From<Vec<JobOffer>> for JobOfferListResponse {
    fn from(value: Vec<JobOffer>) -> Self {
        let items: Vec<JobOfferSummary> = value.iter().map(Into::into).collect();
        Self {
            total: items.len(),
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(name: &str, order: Option<i32>) -> RecruitmentStagePayload {
        RecruitmentStagePayload {
            stage_name: name.to_string(),
            stage_order: order,
            date: None,
            description: None,
        }
    }

    fn payload(stages: Vec<RecruitmentStagePayload>, ctc: i64) -> CreateJobOfferPayload {
        CreateJobOfferPayload {
            title: "Graduate Engineer".into(),
            role: "Platform".into(),
            description: "Keep the lights on".into(),
            location: "Bengaluru".into(),
            job_type: default_job_type(),
            ctc_total: Decimal::new(ctc, 0),
            recruitment_process: stages,
            application_deadline: Utc::now(),
        }
    }

    #[test]
    fn stages_are_sorted_and_renumbered() {
        let payload = payload(
            vec![
                stage("HR", Some(30)),
                stage(" Aptitude ", Some(10)),
                stage("Technical", Some(20)),
            ],
            100,
        );

        let stages = payload.normalized_stages();
        let names: Vec<&str> = stages.iter().map(|s| s.stage_name.as_str()).collect();
        let orders: Vec<i32> = stages.iter().map(|s| s.stage_order).collect();
        assert_eq!(names, vec!["Aptitude", "Technical", "HR"]);
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn empty_process_and_zero_ctc_fail_validation() {
        let errors = payload(Vec::new(), 0).validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("recruitment_process"));
        assert!(fields.contains_key("ctc_total"));

        assert!(payload(vec![stage("Interview", None)], 10).validate().is_ok());
    }
}
