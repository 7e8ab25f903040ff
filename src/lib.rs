pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::repository::{PipelineRepository, StudentDirectory};
use crate::services::{
    application_service::ApplicationService, job_offer_service::JobOfferService,
    pipeline_service::PipelineService, round_service::RoundService,
};

#[derive(Clone)]
pub struct AppState {
    pub job_offer_service: JobOfferService,
    pub application_service: ApplicationService,
    pub round_service: RoundService,
    pub pipeline_service: PipelineService,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn PipelineRepository>,
        directory: Arc<dyn StudentDirectory>,
        round_page_limit: i64,
    ) -> Self {
        let job_offer_service = JobOfferService::new(repo.clone());
        let application_service = ApplicationService::new(repo.clone(), directory.clone());
        let round_service = RoundService::new(repo.clone(), directory, round_page_limit);
        let pipeline_service = PipelineService::new(repo);

        Self {
            job_offer_service,
            application_service,
            round_service,
            pipeline_service,
        }
    }
}
