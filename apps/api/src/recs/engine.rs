//! The recommendation pipeline: personalized, collaborative, and trend-based
//! signals fetched concurrently, joined with settle-all semantics, and merged
//! into one payload. A failed branch degrades to empty; the caller never sees
//! a hard error because one signal source is down.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::JobPosting;
use crate::recs::keywords::{
    extract_account_keywords, extract_trend_keywords, normalize_keyword, MAX_KEYWORDS,
};
use crate::recs::trends::{TrendItem, TrendSource};
use crate::repo::{AccountRepo, ApplicationRepo, JobRepo};

pub const PERSONALIZED_LIMIT: i64 = 15;
pub const COLLABORATIVE_LIMIT: i64 = 5;
pub const TREND_JOB_LIMIT: i64 = 5;

#[derive(Debug, Clone, Default, Serialize)]
pub struct RecommendationPayload {
    /// User-derived keywords with unseen trend keywords appended, for
    /// transparency into what drove the matches.
    pub keywords: Vec<String>,
    pub personalized: Vec<JobPosting>,
    pub collaborative: Vec<JobPosting>,
    pub trends: Vec<TrendItem>,
    pub trend_jobs: Vec<JobPosting>,
}

#[derive(Clone)]
pub struct RecommendationEngine {
    accounts: Arc<dyn AccountRepo>,
    jobs: Arc<dyn JobRepo>,
    applications: Arc<dyn ApplicationRepo>,
    trends: Arc<dyn TrendSource>,
}

impl RecommendationEngine {
    pub fn new(
        accounts: Arc<dyn AccountRepo>,
        jobs: Arc<dyn JobRepo>,
        applications: Arc<dyn ApplicationRepo>,
        trends: Arc<dyn TrendSource>,
    ) -> Self {
        Self {
            accounts,
            jobs,
            applications,
            trends,
        }
    }

    /// Builds the full payload for an account. A pure function of stored
    /// state: two calls with no intervening writes return the same keywords
    /// and matches (modulo live trend headlines).
    pub async fn recommend(&self, account_id: Uuid) -> RecommendationPayload {
        let account = match self.accounts.find_by_id(account_id).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                warn!(%account_id, "Recommendation requested for unknown account");
                return RecommendationPayload::default();
            }
            Err(e) => {
                error!(%account_id, "Account lookup failed: {e}");
                return RecommendationPayload::default();
            }
        };

        let history = self
            .accounts
            .search_history(account_id)
            .await
            .unwrap_or_else(|e| {
                warn!(%account_id, "Search history unavailable: {e}");
                vec![]
            });

        let keywords = extract_account_keywords(&account.profile_keywords, &history, MAX_KEYWORDS);
        debug!(%account_id, ?keywords, "Extracted account keywords");

        let applied = self
            .applications
            .applied_job_ids(account_id)
            .await
            .unwrap_or_else(|e| {
                warn!(%account_id, "Applied-job lookup failed: {e}");
                vec![]
            });

        // All three settle; no early return on partial results, no
        // cross-contamination of failures.
        let (personalized, collaborative, trends) = tokio::join!(
            self.jobs.search_active(&keywords, &applied, PERSONALIZED_LIMIT),
            self.collaborative_jobs(account_id, &keywords, &applied),
            self.trends.fetch_trends(&keywords),
        );

        let personalized = personalized.unwrap_or_else(|e| {
            error!(%account_id, "Personalized fetch failed: {e}");
            vec![]
        });
        let collaborative = collaborative.unwrap_or_else(|e| {
            error!(%account_id, "Collaborative fetch failed: {e}");
            vec![]
        });

        let trend_keywords = extract_trend_keywords(&trends);
        debug!(%account_id, ?trend_keywords, "Extracted trend keywords");

        let trend_jobs = self
            .jobs
            .search_active(&trend_keywords, &applied, TREND_JOB_LIMIT)
            .await
            .unwrap_or_else(|e| {
                error!(%account_id, "Trend-job fetch failed: {e}");
                vec![]
            });

        // Widen personalized results with trend matches, deduplicated by id.
        let mut personalized = personalized;
        if !trend_keywords.is_empty() {
            let trend_matches = self
                .jobs
                .search_active(&trend_keywords, &applied, PERSONALIZED_LIMIT)
                .await
                .unwrap_or_else(|e| {
                    error!(%account_id, "Trend-enrichment fetch failed: {e}");
                    vec![]
                });
            let present: HashSet<Uuid> = personalized.iter().map(|j| j.id).collect();
            personalized.extend(trend_matches.into_iter().filter(|j| !present.contains(&j.id)));
        }

        let mut combined = keywords;
        for tk in &trend_keywords {
            let normalized = normalize_keyword(tk);
            if !normalized.is_empty() && !combined.contains(&normalized) {
                combined.push(normalized);
            }
        }

        RecommendationPayload {
            keywords: combined,
            personalized,
            collaborative,
            trends,
            trend_jobs,
        }
    }

    /// Jobs that peer applicants (sharing at least one profile keyword)
    /// applied to, minus the caller's own applications.
    async fn collaborative_jobs(
        &self,
        account_id: Uuid,
        keywords: &[String],
        exclude: &[Uuid],
    ) -> Result<Vec<JobPosting>, AppError> {
        if keywords.is_empty() {
            return Ok(vec![]);
        }

        let peers = self
            .accounts
            .find_peers_sharing_keywords(account_id, keywords)
            .await?;
        if peers.is_empty() {
            return Ok(vec![]);
        }

        let job_ids = self.applications.jobs_applied_by(&peers, exclude).await?;
        if job_ids.is_empty() {
            return Ok(vec![]);
        }

        self.jobs.active_by_ids(&job_ids, COLLABORATIVE_LIMIT).await
    }

    /// Records a committed search term. The term shapes the *next*
    /// recommendation call, not the one in flight.
    pub async fn track_search_term(&self, account_id: Uuid, term: &str) {
        let normalized = normalize_keyword(term);
        if normalized.is_empty() {
            return;
        }
        if let Err(e) = self.accounts.push_search_term(account_id, &normalized).await {
            error!(%account_id, term = %normalized, "Failed to record search term: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::account::{Account, Role, SearchEntry};
    use crate::repo::memory::{MemAccountRepo, MemApplicationRepo, MemJobRepo};
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::sync::atomic::Ordering;

    /// Serves a fixed trend list, standing in for a healthy news source.
    struct StaticTrends(Vec<TrendItem>);

    #[async_trait]
    impl TrendSource for StaticTrends {
        async fn fetch_trends(&self, _keywords: &[String]) -> Vec<TrendItem> {
            self.0.clone()
        }
    }

    fn applicant(name: &str, keywords: &[&str]) -> Account {
        Account {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{name}@example.com"),
            role: Role::Applicant,
            profile_keywords: keywords.iter().map(|k| k.to_string()).collect(),
            saved_jobs: vec![],
            created_at: Utc::now(),
        }
    }

    fn job(title: &str, location: &str, age_minutes: i64) -> JobPosting {
        JobPosting {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: format!("{title} role"),
            company: "Acme".to_string(),
            location: location.to_string(),
            skills: vec![],
            is_active: true,
            recruiter_id: Uuid::new_v4(),
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    fn engine(
        accounts: Arc<MemAccountRepo>,
        jobs: Arc<MemJobRepo>,
        applications: Arc<MemApplicationRepo>,
        trends: Vec<TrendItem>,
    ) -> RecommendationEngine {
        RecommendationEngine::new(accounts, jobs, applications, Arc::new(StaticTrends(trends)))
    }

    #[tokio::test]
    async fn test_profile_keywords_drive_personalized_matches() {
        let account = applicant("maya", &["react", "remote"]);
        let account_id = account.id;
        let accounts = Arc::new(MemAccountRepo::with_accounts(vec![account]));
        let job_a = job("Senior React Developer", "Remote", 10);
        let job_b = job("Marketing Lead", "Onsite NYC", 5);
        let job_a_id = job_a.id;
        let job_b_id = job_b.id;
        let mut all_jobs = vec![job_a, job_b];
        all_jobs.extend((0..8).map(|i| job(&format!("Backend Engineer {i}"), "Berlin", 20 + i)));
        let jobs = Arc::new(MemJobRepo::with_jobs(all_jobs));
        let applications = Arc::new(MemApplicationRepo::default());

        let payload = engine(accounts, jobs, applications, vec![])
            .recommend(account_id)
            .await;

        let ids: Vec<Uuid> = payload.personalized.iter().map(|j| j.id).collect();
        assert!(ids.contains(&job_a_id));
        assert!(!ids.contains(&job_b_id));
        assert_eq!(payload.keywords, vec!["react", "remote"]);
    }

    #[tokio::test]
    async fn test_applied_jobs_are_excluded() {
        let account = applicant("omar", &["rust"]);
        let account_id = account.id;
        let accounts = Arc::new(MemAccountRepo::with_accounts(vec![account]));
        let applied_job = job("Rust Engineer", "Remote", 5);
        let fresh_job = job("Rust Developer", "Berlin", 10);
        let applied_id = applied_job.id;
        let fresh_id = fresh_job.id;
        let jobs = Arc::new(MemJobRepo::with_jobs(vec![applied_job, fresh_job]));
        let applications = Arc::new(MemApplicationRepo::with_applications(vec![(
            account_id, applied_id,
        )]));

        let payload = engine(accounts, jobs, applications, vec![])
            .recommend(account_id)
            .await;

        let ids: Vec<Uuid> = payload.personalized.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![fresh_id]);
    }

    #[tokio::test]
    async fn test_collaborative_jobs_come_from_keyword_peers() {
        let me = applicant("me", &["rust", "distributed"]);
        let peer = applicant("peer", &["rust"]);
        let stranger = applicant("stranger", &["marketing"]);
        let my_id = me.id;
        let peer_id = peer.id;
        let stranger_id = stranger.id;
        let accounts = Arc::new(MemAccountRepo::with_accounts(vec![me, peer, stranger]));

        let peer_job = job("Platform Engineer", "Remote", 5);
        let stranger_job = job("Brand Manager", "NYC", 5);
        let peer_job_id = peer_job.id;
        let jobs = Arc::new(MemJobRepo::with_jobs(vec![peer_job, stranger_job.clone()]));
        let applications = Arc::new(MemApplicationRepo::with_applications(vec![
            (peer_id, peer_job_id),
            (stranger_id, stranger_job.id),
        ]));

        let payload = engine(accounts, jobs, applications, vec![])
            .recommend(my_id)
            .await;

        let ids: Vec<Uuid> = payload.collaborative.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![peer_job_id]);
    }

    #[tokio::test]
    async fn test_trend_keywords_enrich_personalized_without_duplicates() {
        let account = applicant("lena", &["react"]);
        let account_id = account.id;
        let accounts = Arc::new(MemAccountRepo::with_accounts(vec![account]));
        let react_job = job("React Developer", "Remote", 5);
        let blockchain_job = job("Blockchain Engineer", "Remote", 10);
        let react_id = react_job.id;
        let blockchain_id = blockchain_job.id;
        let jobs = Arc::new(MemJobRepo::with_jobs(vec![react_job, blockchain_job]));
        let applications = Arc::new(MemApplicationRepo::default());

        let trends = vec![TrendItem {
            headline: "Blockchain hiring grows".to_string(),
            source: "X".to_string(),
            summary: "blockchain blockchain".to_string(),
            url: "#".to_string(),
            published_at: String::new(),
        }];

        let payload = engine(accounts, jobs, applications, trends)
            .recommend(account_id)
            .await;

        let ids: Vec<Uuid> = payload.personalized.iter().map(|j| j.id).collect();
        assert!(ids.contains(&react_id));
        assert!(ids.contains(&blockchain_id));
        // No duplicate entries after enrichment.
        let unique: HashSet<&Uuid> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        // Trend keywords are appended to the returned keyword list.
        assert!(payload.keywords.contains(&"blockchain".to_string()));
        assert_eq!(payload.keywords[0], "react");
    }

    #[tokio::test]
    async fn test_unknown_account_returns_empty_payload() {
        let accounts = Arc::new(MemAccountRepo::default());
        let jobs = Arc::new(MemJobRepo::default());
        let applications = Arc::new(MemApplicationRepo::default());

        let payload = engine(accounts, jobs, applications, vec![])
            .recommend(Uuid::new_v4())
            .await;

        assert!(payload.keywords.is_empty());
        assert!(payload.personalized.is_empty());
        assert!(payload.collaborative.is_empty());
        assert!(payload.trend_jobs.is_empty());
    }

    #[tokio::test]
    async fn test_collaborative_failure_leaves_other_branches_intact() {
        let account = applicant("zoe", &["rust"]);
        let account_id = account.id;
        let accounts = Arc::new(MemAccountRepo::with_accounts(vec![account]));
        let rust_job = job("Rust Engineer", "Remote", 5);
        let rust_id = rust_job.id;
        let jobs = Arc::new(MemJobRepo::with_jobs(vec![rust_job]));
        let applications = Arc::new(MemApplicationRepo::default());
        // Applications repo down: collaborative degrades, personalized and
        // trends must still populate.
        applications.fail.store(true, Ordering::SeqCst);

        let trends = vec![TrendItem {
            headline: "Hiring news".to_string(),
            source: "X".to_string(),
            summary: String::new(),
            url: "#".to_string(),
            published_at: String::new(),
        }];

        let payload = engine(accounts, jobs, applications, trends.clone())
            .recommend(account_id)
            .await;

        assert!(payload.collaborative.is_empty());
        assert_eq!(payload.personalized[0].id, rust_id);
        assert_eq!(payload.trends, trends);
    }

    #[tokio::test]
    async fn test_job_store_failure_still_returns_trends() {
        let account = applicant("ivan", &["rust"]);
        let account_id = account.id;
        let accounts = Arc::new(MemAccountRepo::with_accounts(vec![account]));
        let jobs = Arc::new(MemJobRepo::default());
        jobs.fail.store(true, Ordering::SeqCst);
        let applications = Arc::new(MemApplicationRepo::default());

        let trends = vec![TrendItem {
            headline: "Still here".to_string(),
            source: "X".to_string(),
            summary: String::new(),
            url: "#".to_string(),
            published_at: String::new(),
        }];

        let payload = engine(accounts, jobs, applications, trends.clone())
            .recommend(account_id)
            .await;

        assert!(payload.personalized.is_empty());
        assert!(payload.trend_jobs.is_empty());
        assert_eq!(payload.trends, trends);
        assert_eq!(payload.keywords[0], "rust");
    }

    #[tokio::test]
    async fn test_recommend_is_idempotent_over_unchanged_state() {
        let account = applicant("noor", &["react", "remote"]);
        let account_id = account.id;
        let accounts = Arc::new(MemAccountRepo::with_accounts(vec![account]));
        accounts.set_history(
            account_id,
            vec![SearchEntry {
                term: "typescript".to_string(),
                searched_at: Utc::now(),
            }],
        );
        let jobs = Arc::new(MemJobRepo::with_jobs(vec![
            job("React Developer", "Remote", 5),
            job("TypeScript Engineer", "Berlin", 10),
        ]));
        let applications = Arc::new(MemApplicationRepo::default());
        let engine = engine(accounts, jobs, applications, vec![]);

        let first = engine.recommend(account_id).await;
        let second = engine.recommend(account_id).await;

        assert_eq!(first.keywords, second.keywords);
        let first_ids: Vec<Uuid> = first.personalized.iter().map(|j| j.id).collect();
        let second_ids: Vec<Uuid> = second.personalized.iter().map(|j| j.id).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[tokio::test]
    async fn test_tracked_term_affects_next_call_not_current() {
        let account = applicant("sam", &[]);
        let account_id = account.id;
        let accounts = Arc::new(MemAccountRepo::with_accounts(vec![account]));
        let jobs = Arc::new(MemJobRepo::with_jobs(vec![job("Kotlin Developer", "Remote", 5)]));
        let applications = Arc::new(MemApplicationRepo::default());
        let engine = engine(accounts, jobs, applications, vec![]);

        let before = engine.recommend(account_id).await;
        assert!(before.personalized.is_empty());

        engine.track_search_term(account_id, "  Kotlin  ").await;

        let after = engine.recommend(account_id).await;
        assert_eq!(after.keywords, vec!["kotlin"]);
        assert_eq!(after.personalized.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_search_terms_are_not_recorded() {
        let account = applicant("tess", &[]);
        let account_id = account.id;
        let accounts = Arc::new(MemAccountRepo::with_accounts(vec![account]));
        let engine = engine(
            accounts.clone(),
            Arc::new(MemJobRepo::default()),
            Arc::new(MemApplicationRepo::default()),
            vec![],
        );

        engine.track_search_term(account_id, "   ").await;
        assert!(accounts.search_history(account_id).await.unwrap().is_empty());
    }
}
