mod config;
mod db;
mod device;
mod errors;
mod geo;
mod models;
mod notify;
mod recs;
mod repo;
mod risk;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::geo::IpinfoClient;
use crate::notify::build_notifier;
use crate::recs::{NewsApiClient, RecommendationEngine};
use crate::repo::pg::{PgAccountRepo, PgApplicationRepo, PgJobRepo, PgLoginActivityRepo};
use crate::risk::{LoginTracker, RiskConfig};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails startup on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting job portal API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Repositories over the shared pool
    let accounts = Arc::new(PgAccountRepo::new(db.clone()));
    let jobs = Arc::new(PgJobRepo::new(db.clone()));
    let applications = Arc::new(PgApplicationRepo::new(db.clone()));
    let logins = Arc::new(PgLoginActivityRepo::new(db));

    // External signal clients — both degrade to fixed fallbacks when their
    // tokens are absent
    let geo = Arc::new(IpinfoClient::new(config.ipinfo_token.clone()));
    info!(
        configured = config.ipinfo_token.is_some(),
        "Geolocation client initialized"
    );
    let trends = Arc::new(NewsApiClient::with_endpoint(
        config.news_api_key.clone(),
        config.news_endpoint.clone(),
    ));
    info!(
        configured = config.news_api_key.is_some(),
        "Trend source initialized"
    );

    let notifier = build_notifier(&config);

    let tracker = LoginTracker::new(
        logins.clone(),
        accounts.clone(),
        geo,
        notifier,
        RiskConfig::default(),
    );
    let engine = RecommendationEngine::new(accounts, jobs.clone(), applications, trends);

    // Build app state
    let state = AppState {
        tracker,
        engine,
        logins,
        jobs,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
