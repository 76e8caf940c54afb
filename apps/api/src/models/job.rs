use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A job posting. Inactive postings are excluded from search and
/// recommendation consideration.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobPosting {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub company: String,
    pub location: String,
    pub skills: Vec<String>,
    pub is_active: bool,
    pub recruiter_id: Uuid,
    pub created_at: DateTime<Utc>,
}
