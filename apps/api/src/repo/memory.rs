//! In-memory fake repositories for engine tests. Semantics mirror the
//! Postgres implementations: case-insensitive substring matching, newest-first
//! ordering, and the same caps. Each fake carries a failure switch so tests
//! can exercise partial-failure isolation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::account::{Account, SearchEntry, SEARCH_HISTORY_CAP};
use crate::models::job::JobPosting;
use crate::models::login_activity::{LoginActivity, LoginStatus, NewLoginActivity};
use crate::repo::{AccountRepo, ApplicationRepo, JobRepo, LoginActivityRepo};

fn injected() -> AppError {
    AppError::Internal(anyhow!("injected repository failure"))
}

#[derive(Default)]
pub struct MemAccountRepo {
    pub accounts: Mutex<HashMap<Uuid, Account>>,
    pub history: Mutex<HashMap<Uuid, Vec<SearchEntry>>>,
    pub fail: AtomicBool,
}

impl MemAccountRepo {
    pub fn with_accounts(accounts: Vec<Account>) -> Self {
        let repo = Self::default();
        {
            let mut map = repo.accounts.lock().unwrap();
            for a in accounts {
                map.insert(a.id, a);
            }
        }
        repo
    }

    pub fn set_history(&self, id: Uuid, entries: Vec<SearchEntry>) {
        self.history.lock().unwrap().insert(id, entries);
    }
}

#[async_trait]
impl AccountRepo for MemAccountRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(injected());
        }
        Ok(self.accounts.lock().unwrap().get(&id).cloned())
    }

    async fn search_history(&self, id: Uuid) -> Result<Vec<SearchEntry>, AppError> {
        Ok(self
            .history
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn push_search_term(&self, id: Uuid, term: &str) -> Result<(), AppError> {
        let mut map = self.history.lock().unwrap();
        let entries = map.entry(id).or_default();
        entries.push(SearchEntry {
            term: term.to_string(),
            searched_at: Utc::now(),
        });
        let overflow = entries.len().saturating_sub(SEARCH_HISTORY_CAP as usize);
        entries.drain(..overflow);
        Ok(())
    }

    async fn find_peers_sharing_keywords(
        &self,
        id: Uuid,
        keywords: &[String],
    ) -> Result<Vec<Uuid>, AppError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(injected());
        }
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts
            .values()
            .filter(|a| {
                a.id != id
                    && a.role == crate::models::account::Role::Applicant
                    && a.profile_keywords.iter().any(|k| keywords.contains(k))
            })
            .map(|a| a.id)
            .collect())
    }
}

#[derive(Default)]
pub struct MemJobRepo {
    pub jobs: Mutex<Vec<JobPosting>>,
    pub fail: AtomicBool,
}

impl MemJobRepo {
    pub fn with_jobs(jobs: Vec<JobPosting>) -> Self {
        Self {
            jobs: Mutex::new(jobs),
            fail: AtomicBool::new(false),
        }
    }
}

fn matches_keyword(job: &JobPosting, keyword: &str) -> bool {
    let kw = keyword.to_lowercase();
    job.title.to_lowercase().contains(&kw)
        || job.description.to_lowercase().contains(&kw)
        || job.company.to_lowercase().contains(&kw)
        || job.location.to_lowercase().contains(&kw)
        || job.skills.iter().any(|s| s.to_lowercase().contains(&kw))
}

#[async_trait]
impl JobRepo for MemJobRepo {
    async fn search_active(
        &self,
        keywords: &[String],
        exclude: &[Uuid],
        limit: i64,
    ) -> Result<Vec<JobPosting>, AppError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(injected());
        }
        if keywords.is_empty() {
            return Ok(vec![]);
        }
        let mut out: Vec<JobPosting> = self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|j| {
                j.is_active
                    && !exclude.contains(&j.id)
                    && keywords.iter().any(|k| matches_keyword(j, k))
            })
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out.truncate(limit as usize);
        Ok(out)
    }

    async fn active_by_ids(&self, ids: &[Uuid], limit: i64) -> Result<Vec<JobPosting>, AppError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(injected());
        }
        let mut out: Vec<JobPosting> = self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|j| j.is_active && ids.contains(&j.id))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out.truncate(limit as usize);
        Ok(out)
    }
}

#[derive(Default)]
pub struct MemApplicationRepo {
    /// (applicant_id, job_id) pairs.
    pub applications: Mutex<Vec<(Uuid, Uuid)>>,
    pub fail: AtomicBool,
}

impl MemApplicationRepo {
    pub fn with_applications(applications: Vec<(Uuid, Uuid)>) -> Self {
        Self {
            applications: Mutex::new(applications),
            fail: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ApplicationRepo for MemApplicationRepo {
    async fn applied_job_ids(&self, applicant_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(injected());
        }
        let mut ids: Vec<Uuid> = self
            .applications
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, _)| *a == applicant_id)
            .map(|(_, j)| *j)
            .collect();
        ids.dedup();
        Ok(ids)
    }

    async fn jobs_applied_by(
        &self,
        applicant_ids: &[Uuid],
        exclude: &[Uuid],
    ) -> Result<Vec<Uuid>, AppError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(injected());
        }
        let mut ids: Vec<Uuid> = self
            .applications
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, j)| applicant_ids.contains(a) && !exclude.contains(j))
            .map(|(_, j)| *j)
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}

#[derive(Default)]
pub struct MemLoginActivityRepo {
    pub rows: Mutex<Vec<LoginActivity>>,
    pub fail: AtomicBool,
}

impl MemLoginActivityRepo {
    pub fn with_rows(rows: Vec<LoginActivity>) -> Self {
        Self {
            rows: Mutex::new(rows),
            fail: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl LoginActivityRepo for MemLoginActivityRepo {
    async fn count_successful(&self, account_id: Uuid) -> Result<i64, AppError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(injected());
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.account_id == account_id && r.status == LoginStatus::Success)
            .count() as i64)
    }

    async fn seen_ip(&self, account_id: Uuid, ip: &str) -> Result<bool, AppError> {
        Ok(self.rows.lock().unwrap().iter().any(|r| {
            r.account_id == account_id && r.status == LoginStatus::Success && r.ip_address == ip
        }))
    }

    async fn seen_country(&self, account_id: Uuid, country: &str) -> Result<bool, AppError> {
        Ok(self.rows.lock().unwrap().iter().any(|r| {
            r.account_id == account_id && r.status == LoginStatus::Success && r.geo.country == country
        }))
    }

    async fn seen_device(
        &self,
        account_id: Uuid,
        browser: &str,
        os: &str,
    ) -> Result<bool, AppError> {
        Ok(self.rows.lock().unwrap().iter().any(|r| {
            r.account_id == account_id
                && r.status == LoginStatus::Success
                && r.device.browser == browser
                && r.device.os == os
        }))
    }

    async fn successful_login_hours(&self, account_id: Uuid) -> Result<Vec<i16>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.account_id == account_id && r.status == LoginStatus::Success)
            .map(|r| r.login_hour)
            .collect())
    }

    async fn count_failed_since(
        &self,
        account_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                r.account_id == account_id
                    && r.status == LoginStatus::Failed
                    && r.login_time >= since
            })
            .count() as i64)
    }

    async fn insert(&self, activity: NewLoginActivity) -> Result<LoginActivity, AppError> {
        let row = LoginActivity {
            id: Uuid::new_v4(),
            account_id: activity.account_id,
            status: activity.status,
            is_suspicious: activity.is_suspicious,
            suspicious_reasons: activity.suspicious_reasons,
            ip_address: activity.ip_address,
            geo: activity.geo,
            user_agent: activity.user_agent,
            device: activity.device,
            login_time: activity.login_time,
            login_hour: activity.login_hour,
            is_test_mode: activity.is_test_mode,
            test_mode_data: activity.test_mode_data,
            alert_sent: false,
            alert_sent_at: None,
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn mark_alert_sent(&self, id: Uuid) -> Result<(), AppError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            row.alert_sent = true;
            row.alert_sent_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn history(&self, account_id: Uuid, limit: i64) -> Result<Vec<LoginActivity>, AppError> {
        let mut out: Vec<LoginActivity> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.account_id == account_id && r.status == LoginStatus::Success)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.login_time.cmp(&a.login_time));
        out.truncate(limit as usize);
        Ok(out)
    }

    async fn suspicious(&self, account_id: Uuid) -> Result<Vec<LoginActivity>, AppError> {
        let mut out: Vec<LoginActivity> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                r.account_id == account_id && r.is_suspicious && r.status == LoginStatus::Success
            })
            .cloned()
            .collect();
        out.sort_by(|a, b| b.login_time.cmp(&a.login_time));
        Ok(out)
    }

    async fn dismiss_alert(&self, id: Uuid) -> Result<(), AppError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.id == id) {
            Some(row) => {
                row.is_suspicious = false;
                row.suspicious_reasons.clear();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Login activity {id} not found"))),
        }
    }
}
