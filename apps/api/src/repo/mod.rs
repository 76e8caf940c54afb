//! Repository traits the engines depend on. The engines never touch the pool
//! directly — they are scored against these interfaces, which makes them
//! testable with the in-memory fakes in [`memory`].

pub mod pg;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::account::{Account, SearchEntry};
use crate::models::job::JobPosting;
use crate::models::login_activity::{LoginActivity, NewLoginActivity};

#[async_trait]
pub trait AccountRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError>;

    /// Insertion-ordered search history, oldest first.
    async fn search_history(&self, id: Uuid) -> Result<Vec<SearchEntry>, AppError>;

    /// Appends a normalized term, dropping the oldest entries beyond the cap.
    /// Single-document push-with-cap; no cross-row transaction needed.
    async fn push_search_term(&self, id: Uuid, term: &str) -> Result<(), AppError>;

    /// Other applicant accounts whose profile keywords share at least one
    /// exact term with `keywords`.
    async fn find_peers_sharing_keywords(
        &self,
        id: Uuid,
        keywords: &[String],
    ) -> Result<Vec<Uuid>, AppError>;
}

#[async_trait]
pub trait JobRepo: Send + Sync {
    /// Active jobs where any keyword case-insensitively substring-matches
    /// title, description, company, location, or any skill. Newest first.
    async fn search_active(
        &self,
        keywords: &[String],
        exclude: &[Uuid],
        limit: i64,
    ) -> Result<Vec<JobPosting>, AppError>;

    /// Active jobs among `ids`, newest first.
    async fn active_by_ids(&self, ids: &[Uuid], limit: i64) -> Result<Vec<JobPosting>, AppError>;
}

#[async_trait]
pub trait ApplicationRepo: Send + Sync {
    /// Distinct job ids the applicant has applied to.
    async fn applied_job_ids(&self, applicant_id: Uuid) -> Result<Vec<Uuid>, AppError>;

    /// Distinct job ids applied to by any of `applicant_ids`, minus `exclude`.
    async fn jobs_applied_by(
        &self,
        applicant_ids: &[Uuid],
        exclude: &[Uuid],
    ) -> Result<Vec<Uuid>, AppError>;
}

#[async_trait]
pub trait LoginActivityRepo: Send + Sync {
    async fn count_successful(&self, account_id: Uuid) -> Result<i64, AppError>;

    /// Whether any prior successful login came from this exact address.
    async fn seen_ip(&self, account_id: Uuid, ip: &str) -> Result<bool, AppError>;

    /// Whether any prior successful login resolved to this country code.
    async fn seen_country(&self, account_id: Uuid, country: &str) -> Result<bool, AppError>;

    /// Whether any prior successful login matched this (browser, os) pair.
    async fn seen_device(
        &self,
        account_id: Uuid,
        browser: &str,
        os: &str,
    ) -> Result<bool, AppError>;

    /// Hour-of-day of every prior successful login, for the time baseline.
    async fn successful_login_hours(&self, account_id: Uuid) -> Result<Vec<i16>, AppError>;

    /// Failed attempts at or after `since`.
    async fn count_failed_since(
        &self,
        account_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError>;

    async fn insert(&self, activity: NewLoginActivity) -> Result<LoginActivity, AppError>;

    async fn mark_alert_sent(&self, id: Uuid) -> Result<(), AppError>;

    /// Successful logins, newest first.
    async fn history(&self, account_id: Uuid, limit: i64) -> Result<Vec<LoginActivity>, AppError>;

    /// Suspicious successful logins, newest first.
    async fn suspicious(&self, account_id: Uuid) -> Result<Vec<LoginActivity>, AppError>;

    /// Clears the suspicious flag and reasons after the user acknowledges
    /// the alert. The record itself is never deleted.
    async fn dismiss_alert(&self, id: Uuid) -> Result<(), AppError>;
}
