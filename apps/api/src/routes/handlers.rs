use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::JobPosting;
use crate::models::login_activity::{LoginActivity, ReasonCode};
use crate::recs::engine::PERSONALIZED_LIMIT;
use crate::recs::keywords::normalize_keyword;
use crate::recs::RecommendationPayload;
use crate::risk::TestOverrides;
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: i64 = 50;

#[derive(Deserialize)]
pub struct TrackLoginRequest {
    pub account_id: Uuid,
    pub ip: String,
    pub user_agent: String,
    #[serde(flatten)]
    pub overrides: TestOverrides,
}

#[derive(Serialize)]
pub struct TrackLoginResponse {
    pub activity: LoginActivity,
    pub is_suspicious: bool,
    pub reasons: Vec<ReasonCode>,
}

/// POST /api/v1/logins/track
pub async fn handle_track_login(
    State(state): State<AppState>,
    Json(req): Json<TrackLoginRequest>,
) -> Result<Json<TrackLoginResponse>, AppError> {
    let tracked = state
        .tracker
        .track_successful_login(req.account_id, &req.ip, &req.user_agent, req.overrides)
        .await?;
    Ok(Json(TrackLoginResponse {
        activity: tracked.activity,
        is_suspicious: tracked.assessment.is_suspicious,
        reasons: tracked.assessment.reasons,
    }))
}

#[derive(Deserialize)]
pub struct TrackFailedRequest {
    pub account_id: Uuid,
    pub ip: String,
    pub user_agent: String,
}

/// POST /api/v1/logins/track-failed
pub async fn handle_track_failed(
    State(state): State<AppState>,
    Json(req): Json<TrackFailedRequest>,
) -> Result<Json<LoginActivity>, AppError> {
    let activity = state
        .tracker
        .track_failed_login(req.account_id, &req.ip, &req.user_agent)
        .await?;
    Ok(Json(activity))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

/// GET /api/v1/logins/:account_id/history
pub async fn handle_login_history(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Vec<LoginActivity>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    if limit <= 0 {
        return Err(AppError::Validation("limit must be positive".to_string()));
    }
    let history = state.logins.history(account_id, limit).await?;
    Ok(Json(history))
}

/// GET /api/v1/logins/:account_id/suspicious
pub async fn handle_suspicious_logins(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<Vec<LoginActivity>>, AppError> {
    let logins = state.logins.suspicious(account_id).await?;
    Ok(Json(logins))
}

/// POST /api/v1/logins/:id/dismiss
pub async fn handle_dismiss_alert(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.logins.dismiss_alert(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct JobSearchQuery {
    pub q: String,
    /// When present, the search term lands in this account's history and
    /// shapes future recommendations.
    pub account_id: Option<Uuid>,
}

/// GET /api/v1/jobs/search
pub async fn handle_job_search(
    State(state): State<AppState>,
    Query(params): Query<JobSearchQuery>,
) -> Result<Json<Vec<JobPosting>>, AppError> {
    let term = normalize_keyword(&params.q);
    if term.is_empty() {
        return Err(AppError::Validation(
            "search term must not be empty".to_string(),
        ));
    }

    if let Some(account_id) = params.account_id {
        state.engine.track_search_term(account_id, &term).await;
    }

    let jobs = state
        .jobs
        .search_active(&[term], &[], PERSONALIZED_LIMIT)
        .await?;
    Ok(Json(jobs))
}

#[derive(Deserialize)]
pub struct RecommendationQuery {
    /// A live search term committed alongside the request; recorded before
    /// the payload is built so it counts toward this call's keywords.
    pub search: Option<String>,
}

/// GET /api/v1/jobs/recommendations/:account_id
pub async fn handle_recommendations(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Query(params): Query<RecommendationQuery>,
) -> Result<Json<RecommendationPayload>, AppError> {
    if let Some(term) = &params.search {
        state.engine.track_search_term(account_id, term).await;
    }
    let payload = state.engine.recommend(account_id).await;
    Ok(Json(payload))
}
