use std::sync::Arc;
use uuid::Uuid;

use crate::dto::application_dto::{ApplicantView, Pagination, RoundSort, RoundView, RoundViewQuery};
use crate::error::Result;
use crate::models::application::ApplicationStatus;
use crate::models::job_offer::{JobOffer, RoundPhase};
use crate::repository::{ApplicationFilter, PipelineRepository, StudentDirectory, Window};
use crate::services::application_service::join_profiles;
use crate::services::load_owned_offer;
use crate::utils::validation::positive_round;

const MAX_PAGE_LIMIT: i64 = 100;

/// Read-only view of one round of a job offer's pipeline.
#[derive(Clone)]
pub struct RoundService {
    repo: Arc<dyn PipelineRepository>,
    directory: Arc<dyn StudentDirectory>,
    default_limit: i64,
}

/// The only status an application may have to show up in `round` right now,
/// or `None` for a round the pipeline has not reached.
pub fn visible_status(offer: &JobOffer, round: i32) -> Option<ApplicationStatus> {
    match offer.round_phase(round) {
        RoundPhase::Completed => Some(ApplicationStatus::Rejected),
        RoundPhase::Active if offer.is_final_round(round) => Some(ApplicationStatus::Accepted),
        RoundPhase::Active => Some(ApplicationStatus::InProgress),
        RoundPhase::Future => None,
    }
}

impl RoundService {
    pub fn new(
        repo: Arc<dyn PipelineRepository>,
        directory: Arc<dyn StudentDirectory>,
        default_limit: i64,
    ) -> Self {
        Self {
            repo,
            directory,
            default_limit: default_limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub async fn get_round_view(
        &self,
        company_id: Uuid,
        job_offer_id: Uuid,
        round_number: i32,
        query: RoundViewQuery,
    ) -> Result<RoundView> {
        positive_round("round_number", round_number)?;
        let offer = load_owned_offer(self.repo.as_ref(), company_id, job_offer_id).await?;

        let limit = query
            .limit
            .unwrap_or(self.default_limit)
            .clamp(1, MAX_PAGE_LIMIT);
        let page = query.page.unwrap_or(1).max(1);
        let round_stats = self.repo.status_counts(offer.id, Some(round_number)).await?;

        let visible = visible_status(&offer, round_number)
            .filter(|status| query.status.map_or(true, |wanted| wanted == *status));

        let (applications, total) = match visible {
            None => (Vec::new(), 0),
            Some(status) => {
                let filter = ApplicationFilter::for_job_offer(offer.id)
                    .in_round(round_number)
                    .with_status(status);
                self.load_page(&filter, &query, page, limit).await?
            }
        };

        Ok(RoundView {
            job_offer_id: offer.id,
            round_number,
            current_round: offer.current_recruitment_stage,
            total_rounds: offer.total_rounds,
            is_active_round: offer.round_phase(round_number) == RoundPhase::Active,
            is_completed_round: offer.round_phase(round_number) == RoundPhase::Completed,
            is_final_round: offer.is_final_round(round_number),
            applications,
            round_stats,
            pagination: Pagination::new(page, total, limit),
        })
    }

    async fn load_page(
        &self,
        filter: &ApplicationFilter,
        query: &RoundViewQuery,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<ApplicantView>, i64)> {
        let sort = query.sort_by.unwrap_or_default();
        // Pages past the end just come back empty.
        let offset = (page - 1).saturating_mul(limit);

        // Date order and no department filter: the store can window the rows itself.
        if sort == RoundSort::Date && query.department_filter().is_none() {
            let total = self.repo.count_applications(filter).await?;
            let rows = self
                .repo
                .list_applications(filter, Some(Window { offset, limit }))
                .await?;
            let views = join_profiles(self.directory.as_ref(), rows).await?;
            return Ok((views, total));
        }

        let rows = self.repo.list_applications(filter, None).await?;
        let mut views = join_profiles(self.directory.as_ref(), rows).await?;

        if let Some(department) = query.department_filter() {
            views.retain(|view| {
                view.student_department()
                    .is_some_and(|own| own.eq_ignore_ascii_case(department))
            });
        }
        sort_views(&mut views, sort);

        let total = views.len() as i64;
        let views = views
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect();
        Ok((views, total))
    }
}

/// Stable sort; rows arrive newest first, which stays the tie-breaker.
fn sort_views(views: &mut [ApplicantView], sort: RoundSort) {
    match sort {
        RoundSort::Date => {}
        RoundSort::Name => views.sort_by(|a, b| {
            a.student_name()
                .to_lowercase()
                .cmp(&b.student_name().to_lowercase())
        }),
        RoundSort::Cgpa => views.sort_by(|a, b| b.student_cgpa().total_cmp(&a.student_cgpa())),
    }
}
