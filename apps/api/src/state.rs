use std::sync::Arc;

use crate::recs::RecommendationEngine;
use crate::repo::{JobRepo, LoginActivityRepo};
use crate::risk::LoginTracker;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub tracker: LoginTracker,
    pub engine: RecommendationEngine,
    /// Direct handle for the read-side login endpoints (history, suspicious,
    /// dismiss); writes go through the tracker.
    pub logins: Arc<dyn LoginActivityRepo>,
    pub jobs: Arc<dyn JobRepo>,
}
