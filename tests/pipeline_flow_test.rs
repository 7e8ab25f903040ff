use std::sync::Arc;

use chrono::{Duration, Utc};
use placement_portal::{
    dto::{
        application_dto::RoundViewQuery,
        job_offer_dto::{CreateJobOfferPayload, RecruitmentStagePayload},
        pipeline_dto::{AdvanceRoundPayload, PushToNextRoundPayload, RejectSelectedPayload},
    },
    error::Error,
    models::{application::ApplicationStatus, job_offer::JobOffer},
    repository::{
        ApplicationFilter, InMemoryPipelineRepository, InMemoryStudentDirectory,
        PipelineRepository,
    },
    AppState,
};
use rust_decimal::Decimal;
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

struct Portal {
    state: AppState,
    repo: Arc<InMemoryPipelineRepository>,
    company: Uuid,
}

impl Portal {
    fn new() -> Self {
        let repo = Arc::new(InMemoryPipelineRepository::new());
        let state = AppState::new(repo.clone(), Arc::new(InMemoryStudentDirectory::new()), 50);
        Self {
            state,
            repo,
            company: Uuid::new_v4(),
        }
    }

    async fn offer(&self, rounds: usize) -> JobOffer {
        let stages = (1..=rounds)
            .map(|n| RecruitmentStagePayload {
                stage_name: format!("Round {}", n),
                stage_order: Some(n as i32),
                date: None,
                description: None,
            })
            .collect();
        self.state
            .job_offer_service
            .create(
                self.company,
                CreateJobOfferPayload {
                    title: "Software Engineer".into(),
                    role: "Platform".into(),
                    description: "Keep the lights on".into(),
                    location: "Hyderabad".into(),
                    job_type: "full-time".into(),
                    ctc_total: Decimal::new(1_500_000, 0),
                    recruitment_process: stages,
                    application_deadline: Utc::now() + Duration::days(14),
                },
            )
            .await
            .unwrap()
    }

    async fn apply_many(&self, offer: &JobOffer, n: usize) -> Vec<Uuid> {
        let mut ids = Vec::with_capacity(n);
        for _ in 0..n {
            let app = self
                .state
                .application_service
                .apply(Uuid::new_v4(), offer.id)
                .await
                .unwrap();
            ids.push(app.id);
        }
        ids
    }

    async fn push(&self, offer: &JobOffer, ids: &[Uuid], round: i32) -> Result<usize, Error> {
        self.state
            .pipeline_service
            .push_to_next_round(
                self.company,
                offer.id,
                PushToNextRoundPayload {
                    application_ids: ids.to_vec(),
                    current_round: round,
                },
            )
            .await
            .map(|outcome| outcome.pushed_count)
    }

    async fn advance(&self, offer: &JobOffer, round: i32) -> Result<i32, Error> {
        self.state
            .pipeline_service
            .advance_round(
                self.company,
                offer.id,
                AdvanceRoundPayload {
                    current_round: round,
                },
            )
            .await
            .map(|outcome| outcome.new_round)
    }

    async fn stage(&self, offer: &JobOffer) -> i32 {
        self.repo
            .find_job_offer(offer.id)
            .await
            .unwrap()
            .unwrap()
            .current_recruitment_stage
    }
}

#[tokio::test]
async fn scenario_a_apply_lands_in_round_one() {
    let portal = Portal::new();
    let offer = portal.offer(3).await;
    let student = Uuid::new_v4();

    let app = assert_ok!(portal.state.application_service.apply(student, offer.id).await);
    assert_eq!(app.current_round, 1);
    assert_eq!(app.application_status, ApplicationStatus::InProgress);

    let check = assert_ok!(
        portal
            .state
            .application_service
            .check_application_status(student, offer.id)
            .await
    );
    assert!(check.is_applied);
}

#[tokio::test]
async fn scenario_b_second_apply_conflicts() {
    let portal = Portal::new();
    let offer = portal.offer(3).await;
    let student = Uuid::new_v4();

    assert_ok!(portal.state.application_service.apply(student, offer.id).await);
    let err = assert_err!(portal.state.application_service.apply(student, offer.id).await);
    assert!(matches!(err, Error::Conflict(_)));
}

#[tokio::test]
async fn concurrent_applies_for_same_student_yield_one_application() {
    let portal = Portal::new();
    let offer = portal.offer(2).await;
    let student = Uuid::new_v4();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = portal.state.application_service.clone();
        let offer_id = offer.id;
        handles.push(tokio::spawn(async move { service.apply(student, offer_id).await }));
    }
    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(err) => assert!(matches!(err, Error::Conflict(_))),
        }
    }

    assert_eq!(successes, 1);
    let stored = portal.repo.find_job_offer(offer.id).await.unwrap().unwrap();
    assert_eq!(stored.current_application_count, 1);
}

#[tokio::test]
async fn scenario_c_push_into_final_round_accepts() {
    let portal = Portal::new();
    let offer = portal.offer(2).await;
    let ids = portal.apply_many(&offer, 1).await;

    assert_eq!(portal.push(&offer, &ids, 1).await.unwrap(), 1);

    let apps = portal
        .repo
        .list_applications(&ApplicationFilter::for_job_offer(offer.id), None)
        .await
        .unwrap();
    assert_eq!(apps[0].current_round, 2);
    assert_eq!(apps[0].application_status, ApplicationStatus::Accepted);
}

#[tokio::test]
async fn scenario_d_advance_into_empty_round_is_refused() {
    let portal = Portal::new();
    let offer = portal.offer(3).await;
    portal.apply_many(&offer, 2).await;

    let err = portal.advance(&offer, 1).await.unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
    assert_eq!(portal.stage(&offer).await, 1);
}

#[tokio::test]
async fn scenario_e_stragglers_show_up_as_completed_round_rejections() {
    let portal = Portal::new();
    let offer = portal.offer(3).await;
    let ids = portal.apply_many(&offer, 5).await;

    assert_eq!(portal.push(&offer, &ids[..3], 1).await.unwrap(), 3);
    assert_eq!(portal.advance(&offer, 1).await.unwrap(), 2);

    let round_one = portal
        .state
        .round_service
        .get_round_view(portal.company, offer.id, 1, RoundViewQuery::default())
        .await
        .unwrap();
    assert!(round_one.is_completed_round);
    let mut shown: Vec<Uuid> = round_one
        .applications
        .iter()
        .map(|view| view.application.id)
        .collect();
    shown.sort();
    let mut left_behind = ids[3..].to_vec();
    left_behind.sort();
    assert_eq!(shown, left_behind);
    assert!(round_one.applications.iter().all(|view| {
        view.application.current_round == 1
            && view.application.application_status == ApplicationStatus::Rejected
    }));

    let round_two = portal
        .state
        .round_service
        .get_round_view(portal.company, offer.id, 2, RoundViewQuery::default())
        .await
        .unwrap();
    assert!(round_two.is_active_round);
    assert_eq!(round_two.applications.len(), 3);
}

#[tokio::test]
async fn scenario_f_completion_outside_final_round_is_refused() {
    let portal = Portal::new();
    let offer = portal.offer(3).await;
    let ids = portal.apply_many(&offer, 2).await;
    portal.push(&offer, &ids, 1).await.unwrap();
    portal.advance(&offer, 1).await.unwrap();
    assert_eq!(portal.stage(&offer).await, 2);

    let err = portal
        .state
        .pipeline_service
        .complete_hiring(portal.company, offer.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
}

#[tokio::test]
async fn full_pipeline_keeps_round_views_consistent() {
    let portal = Portal::new();
    let offer = portal.offer(3).await;
    let ids = portal.apply_many(&offer, 6).await;

    portal.push(&offer, &ids[..4], 1).await.unwrap();
    portal.advance(&offer, 1).await.unwrap();
    portal.push(&offer, &ids[..2], 2).await.unwrap();
    portal
        .state
        .pipeline_service
        .reject_selected(
            portal.company,
            offer.id,
            RejectSelectedPayload {
                application_ids: vec![ids[2]],
            },
        )
        .await
        .unwrap();
    portal.advance(&offer, 2).await.unwrap();

    // Every application appears in exactly one round view.
    let mut seen = Vec::new();
    for round in 1..=3 {
        let view = portal
            .state
            .round_service
            .get_round_view(portal.company, offer.id, round, RoundViewQuery::default())
            .await
            .unwrap();
        assert!(view.round_stats.total >= view.applications.len() as i64);
        seen.extend(view.applications.iter().map(|v| v.application.id));
    }
    seen.sort();
    let mut all = ids.clone();
    all.sort();
    assert_eq!(seen, all);

    let done = portal
        .state
        .pipeline_service
        .complete_hiring(portal.company, offer.id)
        .await
        .unwrap();
    assert_eq!(done.final_stats.accepted, 2);
    assert_eq!(done.final_stats.rejected, 4);
    assert_eq!(done.final_stats.in_progress, 0);

    let err = portal.push(&offer, &ids[..1], 3).await.unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
}

#[tokio::test]
async fn counter_matches_records_after_reconcile() {
    let portal = Portal::new();
    let offer = portal.offer(2).await;
    portal.apply_many(&offer, 4).await;
    portal.repo.store_application_count(offer.id, 0).await.unwrap();

    let result = portal
        .state
        .application_service
        .reconcile_application_count(portal.company, offer.id)
        .await
        .unwrap();

    assert_eq!(result.previous_count, 0);
    assert_eq!(result.application_count, 4);
}
