pub mod handlers;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Login risk API
        .route("/api/v1/logins/track", post(handlers::handle_track_login))
        .route(
            "/api/v1/logins/track-failed",
            post(handlers::handle_track_failed),
        )
        .route(
            "/api/v1/logins/:account_id/history",
            get(handlers::handle_login_history),
        )
        .route(
            "/api/v1/logins/:account_id/suspicious",
            get(handlers::handle_suspicious_logins),
        )
        .route(
            "/api/v1/logins/:id/dismiss",
            post(handlers::handle_dismiss_alert),
        )
        // Job discovery API
        .route("/api/v1/jobs/search", get(handlers::handle_job_search))
        .route(
            "/api/v1/jobs/recommendations/:account_id",
            get(handlers::handle_recommendations),
        )
        .with_state(state)
}
