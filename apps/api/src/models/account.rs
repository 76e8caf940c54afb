use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Applicant,
    Recruiter,
}

/// An account row as the engines see it. Storage mapping lives in `repo::pg`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// User-curated keywords. Lower-cased and deduplicated at write time.
    pub profile_keywords: Vec<String>,
    pub saved_jobs: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// One entry of the bounded search-history list (capped at
/// [`SEARCH_HISTORY_CAP`], oldest dropped on push).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchEntry {
    pub term: String,
    pub searched_at: DateTime<Utc>,
}

/// Maximum retained search terms per account.
pub const SEARCH_HISTORY_CAP: i64 = 25;
