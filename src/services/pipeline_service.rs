//! Company-side state machine over a job offer's applications.
//!
//! Every transition is a bulk operation over explicit application ids scoped to one
//! owned job offer. Ids that do not match the transition's filter are left alone and
//! reported back as skipped rather than failing the whole batch.

use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::pipeline_dto::{
    AdvanceOutcome, AdvanceRoundPayload, CompletionOutcome, PushOutcome, PushToNextRoundPayload,
    RejectOutcome, RejectSelectedPayload,
};
use crate::error::{Error, Result};
use crate::models::application::ApplicationStatus;
use crate::models::job_offer::JobOffer;
use crate::repository::{ApplicationFilter, PipelineRepository};
use crate::services::load_owned_offer;
use crate::utils::{time, validation::dedup_ids};

#[derive(Clone)]
pub struct PipelineService {
    repo: Arc<dyn PipelineRepository>,
}

fn ensure_not_completed(offer: &JobOffer) -> Result<()> {
    if offer.is_completed() {
        return Err(Error::InvalidState(
            "Hiring for this job offer is already completed".to_string(),
        ));
    }
    Ok(())
}

fn skipped(requested: &[Uuid], updated: &[Uuid]) -> Vec<Uuid> {
    let updated: HashSet<&Uuid> = updated.iter().collect();
    requested
        .iter()
        .filter(|id| !updated.contains(id))
        .copied()
        .collect()
}

impl PipelineService {
    pub fn new(repo: Arc<dyn PipelineRepository>) -> Self {
        Self { repo }
    }

    /// Moves the selected in-progress applications of the active round one round forward.
    /// Arriving in the final round is acceptance.
    pub async fn push_to_next_round(
        &self,
        company_id: Uuid,
        job_offer_id: Uuid,
        payload: PushToNextRoundPayload,
    ) -> Result<PushOutcome> {
        payload.validate()?;
        let offer = load_owned_offer(self.repo.as_ref(), company_id, job_offer_id).await?;
        ensure_not_completed(&offer)?;

        let round = payload.current_round;
        if round != offer.current_recruitment_stage {
            tracing::warn!(
                job_offer_id = %offer.id,
                requested_round = round,
                active_round = offer.current_recruitment_stage,
                "push refused: round is not the active round"
            );
            return Err(Error::InvalidState(format!(
                "Round {} is not the active round (active round is {})",
                round, offer.current_recruitment_stage
            )));
        }
        if round >= offer.total_rounds {
            return Err(Error::InvalidState(
                "This is already the final round".to_string(),
            ));
        }

        let next_round = round + 1;
        let is_final_round = offer.is_final_round(next_round);
        let status = if is_final_round {
            ApplicationStatus::Accepted
        } else {
            ApplicationStatus::InProgress
        };

        let requested = dedup_ids(&payload.application_ids);
        let updated = self
            .repo
            .move_to_round(offer.id, &requested, round, next_round, status, time::now())
            .await?;
        let skipped_ids = skipped(&requested, &updated);

        if !skipped_ids.is_empty() {
            tracing::warn!(
                job_offer_id = %offer.id,
                round,
                skipped = skipped_ids.len(),
                "push skipped ids outside the active round"
            );
        }
        tracing::info!(
            job_offer_id = %offer.id,
            from_round = round,
            next_round,
            pushed = updated.len(),
            is_final_round,
            "applications pushed to next round"
        );

        Ok(PushOutcome {
            pushed_count: updated.len(),
            next_round,
            is_final_round,
            skipped_ids,
        })
    }

    /// Rejects the selected applications whatever their round or status.
    /// An already accepted application can be overridden to rejected here.
    pub async fn reject_selected(
        &self,
        company_id: Uuid,
        job_offer_id: Uuid,
        payload: RejectSelectedPayload,
    ) -> Result<RejectOutcome> {
        payload.validate()?;
        let offer = load_owned_offer(self.repo.as_ref(), company_id, job_offer_id).await?;
        ensure_not_completed(&offer)?;

        let requested = dedup_ids(&payload.application_ids);
        let updated = self
            .repo
            .reject_applications(offer.id, &requested, time::now())
            .await?;
        let skipped_ids = skipped(&requested, &updated);

        if !skipped_ids.is_empty() {
            tracing::warn!(
                job_offer_id = %offer.id,
                skipped = skipped_ids.len(),
                "reject skipped ids of other job offers"
            );
        }
        tracing::info!(
            job_offer_id = %offer.id,
            rejected = updated.len(),
            "applications rejected"
        );

        Ok(RejectOutcome {
            rejected_count: updated.len(),
            skipped_ids,
        })
    }

    /// Closes the active round: stragglers are rejected and the offer moves to the next stage.
    pub async fn advance_round(
        &self,
        company_id: Uuid,
        job_offer_id: Uuid,
        payload: AdvanceRoundPayload,
    ) -> Result<AdvanceOutcome> {
        payload.validate()?;
        let offer = load_owned_offer(self.repo.as_ref(), company_id, job_offer_id).await?;
        ensure_not_completed(&offer)?;

        let round = payload.current_round;
        let next_round = round
            .checked_add(1)
            .ok_or_else(|| Error::InvalidState("This is already the final round".to_string()))?;
        let waiting = self
            .repo
            .count_applications(&ApplicationFilter::for_job_offer(offer.id).in_round(next_round))
            .await?;

        if waiting == 0 {
            tracing::warn!(
                job_offer_id = %offer.id,
                round,
                "advance refused: nobody pushed to the next round"
            );
            return Err(Error::InvalidState(
                "Please push at least one student to the next round before advancing".to_string(),
            ));
        }
        if round >= offer.total_rounds {
            return Err(Error::InvalidState(
                "This is already the final round".to_string(),
            ));
        }
        if round != offer.current_recruitment_stage {
            return Err(Error::InvalidState(format!(
                "Round {} is not the active round (active round is {})",
                round, offer.current_recruitment_stage
            )));
        }

        let auto_rejected = self
            .repo
            .close_round(offer.id, round, time::now())
            .await?
            .ok_or_else(|| {
                Error::InvalidState(format!("Round {} was already closed", round))
            })?;

        tracing::info!(
            job_offer_id = %offer.id,
            closed_round = round,
            new_round = next_round,
            waiting,
            auto_rejected,
            "round advanced"
        );

        Ok(AdvanceOutcome {
            new_round: next_round,
            students_in_next_round: waiting,
            auto_rejected,
        })
    }

    /// Marks hiring complete. Only allowed while the offer sits in its final round.
    pub async fn complete_hiring(
        &self,
        company_id: Uuid,
        job_offer_id: Uuid,
    ) -> Result<CompletionOutcome> {
        let offer = load_owned_offer(self.repo.as_ref(), company_id, job_offer_id).await?;
        ensure_not_completed(&offer)?;

        if offer.current_recruitment_stage != offer.total_rounds {
            tracing::warn!(
                job_offer_id = %offer.id,
                stage = offer.current_recruitment_stage,
                total_rounds = offer.total_rounds,
                "completion refused: not in the final round"
            );
            return Err(Error::InvalidState(
                "Can only complete hiring in the final round".to_string(),
            ));
        }

        let job_offer = self
            .repo
            .complete_job_offer(offer.id, time::now())
            .await?
            .ok_or_else(|| {
                Error::InvalidState("Hiring for this job offer is already completed".to_string())
            })?;
        let final_stats = self.repo.status_counts(job_offer.id, None).await?;

        tracing::info!(
            job_offer_id = %job_offer.id,
            accepted = final_stats.accepted,
            rejected = final_stats.rejected,
            in_progress = final_stats.in_progress,
            "hiring completed"
        );

        Ok(CompletionOutcome {
            job_offer,
            final_stats,
        })
    }
}
