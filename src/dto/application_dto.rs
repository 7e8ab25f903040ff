use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dto::job_offer_dto::JobOfferSummary;
use crate::models::application::{Application, ApplicationStatus, StatusCounts};
use crate::models::student::StudentProfile;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationCheck {
    pub is_applied: bool,
    pub application_id: Option<Uuid>,
}

/// A student's own application together with the offer it targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentApplicationView {
    #[serde(flatten)]
    pub application: Application,
    pub job_offer: Option<JobOfferSummary>,
}

/// An application as a company sees it, joined with the applicant's display fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicantView {
    #[serde(flatten)]
    pub application: Application,
    pub student: Option<StudentProfile>,
}

impl ApplicantView {
    pub fn student_name(&self) -> &str {
        self.student
            .as_ref()
            .map(|student| student.name.as_str())
            .unwrap_or("")
    }

    pub fn student_cgpa(&self) -> f64 {
        self.student
            .as_ref()
            .and_then(|student| student.cgpa)
            .unwrap_or(0.0)
    }

    pub fn student_department(&self) -> Option<&str> {
        self.student
            .as_ref()
            .and_then(|student| student.department.as_deref())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundSort {
    #[default]
    Date,
    Name,
    Cgpa,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundViewQuery {
    pub status: Option<ApplicationStatus>,
    /// `all` is treated the same as no department filter.
    pub department: Option<String>,
    pub sort_by: Option<RoundSort>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl RoundViewQuery {
    pub fn department_filter(&self) -> Option<&str> {
        self.department
            .as_deref()
            .map(str::trim)
            .filter(|department| !department.is_empty() && !department.eq_ignore_ascii_case("all"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current: i64,
    pub pages: i64,
    pub total: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn new(current: i64, total: i64, limit: i64) -> Self {
        let pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
        Self {
            current,
            pages,
            total,
            limit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundView {
    pub job_offer_id: Uuid,
    pub round_number: i32,
    pub current_round: i32,
    pub total_rounds: i32,
    pub is_active_round: bool,
    pub is_completed_round: bool,
    pub is_final_round: bool,
    pub applications: Vec<ApplicantView>,
    /// Raw counts for the round, not narrowed by the visibility rule.
    pub round_stats: StatusCounts,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationCountReconciliation {
    pub job_offer_id: Uuid,
    pub previous_count: i32,
    pub application_count: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_rounds_pages_up() {
        assert_eq!(Pagination::new(1, 0, 50).pages, 0);
        assert_eq!(Pagination::new(1, 50, 50).pages, 1);
        assert_eq!(Pagination::new(2, 51, 50).pages, 2);
    }

    #[test]
    fn all_department_means_unfiltered() {
        let mut query = RoundViewQuery {
            department: Some("All".into()),
            ..RoundViewQuery::default()
        };
        assert_eq!(query.department_filter(), None);
        query.department = Some(" CSE ".into());
        assert_eq!(query.department_filter(), Some("CSE"));
    }

    #[test]
    fn sort_parses_from_lowercase_labels() {
        let query: RoundViewQuery =
            serde_json::from_str(r#"{"sort_by":"cgpa","status":"in-progress"}"#).unwrap();
        assert_eq!(query.sort_by, Some(RoundSort::Cgpa));
        assert_eq!(query.status, Some(ApplicationStatus::InProgress));
    }
}
