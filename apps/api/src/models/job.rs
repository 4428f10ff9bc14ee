use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_DEPARTMENT: &str = "General";
pub const DEFAULT_LOCATION: &str = "Remote";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub title: String,
    pub salary: f64,
    pub department: String,
    pub location: String,
    pub description: String,
    pub responsibilities: Vec<String>,
    pub required_skills: Vec<String>,
    pub qualifications: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRow {
    /// The generated portion of the posting, as handed to fit scoring.
    pub fn details(&self) -> JobDetails {
        JobDetails {
            description: self.description.clone(),
            responsibilities: self.responsibilities.clone(),
            required_skills: self.required_skills.clone(),
            qualifications: self.qualifications.clone(),
            error: None,
        }
    }
}

/// Generated job-posting content.
///
/// On total failure every field is empty and `error` carries the cause.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobDetails {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub qualifications: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobDetails {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}
