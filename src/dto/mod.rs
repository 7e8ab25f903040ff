pub mod application_dto;
pub mod job_offer_dto;
pub mod pipeline_dto;
