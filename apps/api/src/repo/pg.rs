//! PostgreSQL-backed repositories. Storage rows are private to this module;
//! everything crossing the boundary is a domain type from `models`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::account::{Account, Role, SearchEntry, SEARCH_HISTORY_CAP};
use crate::models::job::JobPosting;
use crate::models::login_activity::{
    DeviceInfo, GeoInfo, LoginActivity, LoginStatus, NewLoginActivity, ReasonCode, TestModeData,
};
use crate::repo::{AccountRepo, ApplicationRepo, JobRepo, LoginActivityRepo};

// ────────────────────────────────────────────────────────────────────────────
// Accounts
// ────────────────────────────────────────────────────────────────────────────

pub struct PgAccountRepo {
    pool: PgPool,
}

impl PgAccountRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    name: String,
    email: String,
    role: String,
    profile_keywords: Vec<String>,
    saved_jobs: Vec<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id,
            name: row.name,
            email: row.email,
            role: if row.role == "recruiter" {
                Role::Recruiter
            } else {
                Role::Applicant
            },
            profile_keywords: row.profile_keywords,
            saved_jobs: row.saved_jobs,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl AccountRepo for PgAccountRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id, name, email, role, profile_keywords, saved_jobs, created_at
             FROM accounts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    async fn search_history(&self, id: Uuid) -> Result<Vec<SearchEntry>, AppError> {
        #[derive(sqlx::FromRow)]
        struct HistoryRow {
            term: String,
            searched_at: DateTime<Utc>,
        }

        let rows = sqlx::query_as::<_, HistoryRow>(
            "SELECT term, searched_at FROM search_history
             WHERE account_id = $1 ORDER BY searched_at ASC, id ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| SearchEntry {
                term: r.term,
                searched_at: r.searched_at,
            })
            .collect())
    }

    async fn push_search_term(&self, id: Uuid, term: &str) -> Result<(), AppError> {
        sqlx::query("INSERT INTO search_history (account_id, term, searched_at) VALUES ($1, $2, now())")
            .bind(id)
            .bind(term)
            .execute(&self.pool)
            .await?;

        // Keep only the newest SEARCH_HISTORY_CAP entries per account.
        sqlx::query(
            "DELETE FROM search_history
             WHERE account_id = $1
               AND id NOT IN (
                 SELECT id FROM search_history
                 WHERE account_id = $1
                 ORDER BY searched_at DESC, id DESC
                 LIMIT $2
               )",
        )
        .bind(id)
        .bind(SEARCH_HISTORY_CAP)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_peers_sharing_keywords(
        &self,
        id: Uuid,
        keywords: &[String],
    ) -> Result<Vec<Uuid>, AppError> {
        if keywords.is_empty() {
            return Ok(vec![]);
        }

        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM accounts
             WHERE id <> $1 AND role = 'applicant' AND profile_keywords && $2",
        )
        .bind(id)
        .bind(keywords)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(peer,)| peer).collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Jobs
// ────────────────────────────────────────────────────────────────────────────

pub struct PgJobRepo {
    pool: PgPool,
}

impl PgJobRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepo for PgJobRepo {
    async fn search_active(
        &self,
        keywords: &[String],
        exclude: &[Uuid],
        limit: i64,
    ) -> Result<Vec<JobPosting>, AppError> {
        if keywords.is_empty() {
            return Ok(vec![]);
        }

        // Substring containment per keyword, against any of the five fields.
        let jobs = sqlx::query_as::<_, JobPosting>(
            "SELECT id, title, description, company, location, skills, is_active,
                    recruiter_id, created_at
             FROM job_postings j
             WHERE j.is_active
               AND j.id <> ALL($2)
               AND EXISTS (
                 SELECT 1 FROM unnest($1::text[]) AS kw
                 WHERE j.title ILIKE '%' || kw || '%'
                    OR j.description ILIKE '%' || kw || '%'
                    OR j.company ILIKE '%' || kw || '%'
                    OR j.location ILIKE '%' || kw || '%'
                    OR EXISTS (SELECT 1 FROM unnest(j.skills) AS s WHERE s ILIKE '%' || kw || '%')
               )
             ORDER BY j.created_at DESC
             LIMIT $3",
        )
        .bind(keywords)
        .bind(exclude)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs)
    }

    async fn active_by_ids(&self, ids: &[Uuid], limit: i64) -> Result<Vec<JobPosting>, AppError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let jobs = sqlx::query_as::<_, JobPosting>(
            "SELECT id, title, description, company, location, skills, is_active,
                    recruiter_id, created_at
             FROM job_postings
             WHERE id = ANY($1) AND is_active
             ORDER BY created_at DESC
             LIMIT $2",
        )
        .bind(ids)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Applications
// ────────────────────────────────────────────────────────────────────────────

pub struct PgApplicationRepo {
    pool: PgPool,
}

impl PgApplicationRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApplicationRepo for PgApplicationRepo {
    async fn applied_job_ids(&self, applicant_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT DISTINCT job_id FROM applications WHERE applicant_id = $1")
                .bind(applicant_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn jobs_applied_by(
        &self,
        applicant_ids: &[Uuid],
        exclude: &[Uuid],
    ) -> Result<Vec<Uuid>, AppError> {
        if applicant_ids.is_empty() {
            return Ok(vec![]);
        }

        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT DISTINCT job_id FROM applications
             WHERE applicant_id = ANY($1) AND job_id <> ALL($2)",
        )
        .bind(applicant_ids)
        .bind(exclude)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Login activity
// ────────────────────────────────────────────────────────────────────────────

pub struct PgLoginActivityRepo {
    pool: PgPool,
}

impl PgLoginActivityRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct LoginActivityRow {
    id: Uuid,
    account_id: Uuid,
    status: String,
    is_suspicious: bool,
    suspicious_reasons: Vec<String>,
    ip_address: String,
    geo: sqlx::types::Json<GeoInfo>,
    user_agent: String,
    device: sqlx::types::Json<DeviceInfo>,
    login_time: DateTime<Utc>,
    login_hour: i16,
    is_test_mode: bool,
    test_mode_data: Option<sqlx::types::Json<TestModeData>>,
    alert_sent: bool,
    alert_sent_at: Option<DateTime<Utc>>,
}

impl From<LoginActivityRow> for LoginActivity {
    fn from(row: LoginActivityRow) -> Self {
        LoginActivity {
            id: row.id,
            account_id: row.account_id,
            status: if row.status == "failed" {
                LoginStatus::Failed
            } else {
                LoginStatus::Success
            },
            is_suspicious: row.is_suspicious,
            // Unknown stored values are dropped, not invented.
            suspicious_reasons: row
                .suspicious_reasons
                .iter()
                .filter_map(|s| ReasonCode::parse(s))
                .collect(),
            ip_address: row.ip_address,
            geo: row.geo.0,
            user_agent: row.user_agent,
            device: row.device.0,
            login_time: row.login_time,
            login_hour: row.login_hour,
            is_test_mode: row.is_test_mode,
            test_mode_data: row.test_mode_data.map(|j| j.0),
            alert_sent: row.alert_sent,
            alert_sent_at: row.alert_sent_at,
        }
    }
}

const SELECT_COLUMNS: &str = "id, account_id, status, is_suspicious, suspicious_reasons, \
     ip_address, geo, user_agent, device, login_time, login_hour, is_test_mode, \
     test_mode_data, alert_sent, alert_sent_at";

#[async_trait]
impl LoginActivityRepo for PgLoginActivityRepo {
    async fn count_successful(&self, account_id: Uuid) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM login_activity WHERE account_id = $1 AND status = 'success'",
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn seen_ip(&self, account_id: Uuid, ip: &str) -> Result<bool, AppError> {
        let (seen,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (
               SELECT 1 FROM login_activity
               WHERE account_id = $1 AND ip_address = $2 AND status = 'success'
             )",
        )
        .bind(account_id)
        .bind(ip)
        .fetch_one(&self.pool)
        .await?;

        Ok(seen)
    }

    async fn seen_country(&self, account_id: Uuid, country: &str) -> Result<bool, AppError> {
        let (seen,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (
               SELECT 1 FROM login_activity
               WHERE account_id = $1 AND geo->>'country' = $2 AND status = 'success'
             )",
        )
        .bind(account_id)
        .bind(country)
        .fetch_one(&self.pool)
        .await?;

        Ok(seen)
    }

    async fn seen_device(
        &self,
        account_id: Uuid,
        browser: &str,
        os: &str,
    ) -> Result<bool, AppError> {
        let (seen,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (
               SELECT 1 FROM login_activity
               WHERE account_id = $1
                 AND device->>'browser' = $2
                 AND device->>'os' = $3
                 AND status = 'success'
             )",
        )
        .bind(account_id)
        .bind(browser)
        .bind(os)
        .fetch_one(&self.pool)
        .await?;

        Ok(seen)
    }

    async fn successful_login_hours(&self, account_id: Uuid) -> Result<Vec<i16>, AppError> {
        let rows: Vec<(i16,)> = sqlx::query_as(
            "SELECT login_hour FROM login_activity
             WHERE account_id = $1 AND status = 'success'",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(h,)| h).collect())
    }

    async fn count_failed_since(
        &self,
        account_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM login_activity
             WHERE account_id = $1 AND status = 'failed' AND login_time >= $2",
        )
        .bind(account_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn insert(&self, activity: NewLoginActivity) -> Result<LoginActivity, AppError> {
        let reasons: Vec<String> = activity
            .suspicious_reasons
            .iter()
            .map(|r| r.as_str().to_string())
            .collect();

        let row = sqlx::query_as::<_, LoginActivityRow>(&format!(
            "INSERT INTO login_activity
               (id, account_id, status, is_suspicious, suspicious_reasons, ip_address,
                geo, user_agent, device, login_time, login_hour, is_test_mode,
                test_mode_data, alert_sent)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, false)
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(activity.account_id)
        .bind(activity.status.as_str())
        .bind(activity.is_suspicious)
        .bind(&reasons)
        .bind(&activity.ip_address)
        .bind(sqlx::types::Json(&activity.geo))
        .bind(&activity.user_agent)
        .bind(sqlx::types::Json(&activity.device))
        .bind(activity.login_time)
        .bind(activity.login_hour)
        .bind(activity.is_test_mode)
        .bind(activity.test_mode_data.as_ref().map(sqlx::types::Json))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn mark_alert_sent(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE login_activity SET alert_sent = true, alert_sent_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn history(&self, account_id: Uuid, limit: i64) -> Result<Vec<LoginActivity>, AppError> {
        let rows = sqlx::query_as::<_, LoginActivityRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM login_activity
             WHERE account_id = $1 AND status = 'success'
             ORDER BY login_time DESC
             LIMIT $2"
        ))
        .bind(account_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LoginActivity::from).collect())
    }

    async fn suspicious(&self, account_id: Uuid) -> Result<Vec<LoginActivity>, AppError> {
        let rows = sqlx::query_as::<_, LoginActivityRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM login_activity
             WHERE account_id = $1 AND is_suspicious AND status = 'success'
             ORDER BY login_time DESC"
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LoginActivity::from).collect())
    }

    async fn dismiss_alert(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE login_activity
             SET is_suspicious = false, suspicious_reasons = '{}'
             WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Login activity {id} not found")));
        }
        Ok(())
    }
}
