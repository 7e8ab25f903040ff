pub mod application;
pub mod job_offer;
pub mod student;
