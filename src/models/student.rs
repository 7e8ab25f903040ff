use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Display fields joined onto applications; owned by the profile service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StudentProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub cgpa: Option<f64>,
}
