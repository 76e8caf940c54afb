//! The risk assessment itself: five independent checks evaluated in a fixed
//! order against the account's stored login history.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::geo::SENTINEL_COUNTRY;
use crate::models::login_activity::{DeviceInfo, GeoInfo, ReasonCode};
use crate::repo::LoginActivityRepo;

/// Heuristic thresholds. These are inherited magic numbers with no derivation
/// behind them; they are kept configurable rather than "corrected".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Successful logins required before novelty checks may fire.
    pub min_history_logins: i64,
    /// Login-hour samples required to form a time baseline.
    pub min_hour_samples: usize,
    pub hour_stddev_multiplier: f64,
    /// Fixed floor added to the deviation bound so near-zero-variance
    /// accounts are not flagged on trivial deviations.
    pub hour_deviation_floor: f64,
    /// Failed attempts within the window that trigger the brute-force flag.
    pub failed_attempt_threshold: i64,
    pub failed_window_minutes: i64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            min_history_logins: 3,
            min_hour_samples: 5,
            hour_stddev_multiplier: 2.0,
            hour_deviation_floor: 3.0,
            failed_attempt_threshold: 3,
            failed_window_minutes: 15,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub is_suspicious: bool,
    pub reasons: Vec<ReasonCode>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourBaseline {
    pub mean: f64,
    pub std_dev: f64,
}

/// Mean and population standard deviation of the historical login hours.
/// Returns `None` below the sample floor — too little history to call
/// anything unusual.
pub fn hour_baseline(hours: &[i16], min_samples: usize) -> Option<HourBaseline> {
    if hours.len() < min_samples {
        return None;
    }
    let n = hours.len() as f64;
    let mean = hours.iter().map(|h| *h as f64).sum::<f64>() / n;
    let variance = hours
        .iter()
        .map(|h| (*h as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    Some(HourBaseline {
        mean,
        std_dev: variance.sqrt(),
    })
}

/// `|hour − mean| > multiplier·stddev + floor`.
pub fn is_unusual_hour(baseline: &HourBaseline, hour: i16, cfg: &RiskConfig) -> bool {
    let deviation = (hour as f64 - baseline.mean).abs();
    deviation > cfg.hour_stddev_multiplier * baseline.std_dev + cfg.hour_deviation_floor
}

/// Scores one login attempt against the account's history.
///
/// Reasons can co-occur and the evaluation order is fixed for reproducible
/// output. `is_suspicious` is true iff any of the five real checks fired;
/// the test-mode marker is informational only.
pub async fn assess(
    repo: &dyn LoginActivityRepo,
    cfg: &RiskConfig,
    account_id: Uuid,
    ip: &str,
    geo: &GeoInfo,
    device: &DeviceInfo,
    login_hour: i16,
    is_test_mode: bool,
) -> Result<RiskAssessment, AppError> {
    let mut reasons = Vec::new();

    let prior_successes = repo.count_successful(account_id).await?;
    // Brand-new accounts are "new" on every axis; suppress novelty checks
    // until a pattern exists.
    let has_history = prior_successes >= cfg.min_history_logins;
    debug!(%account_id, prior_successes, has_history, "Scoring login attempt");

    // 1. New IP
    if has_history && !repo.seen_ip(account_id, ip).await? {
        info!(%account_id, ip, "Suspicious: new IP address");
        reasons.push(ReasonCode::NewIp);
    }

    // 2. New country — sentinel records carry no usable country data.
    if has_history
        && geo.country != SENTINEL_COUNTRY
        && !repo.seen_country(account_id, &geo.country).await?
    {
        info!(%account_id, country = %geo.country_name, "Suspicious: new country");
        reasons.push(ReasonCode::NewCountry);
    }

    // 3. New (browser, os) pair
    if has_history
        && !repo
            .seen_device(account_id, &device.browser, &device.os)
            .await?
    {
        info!(%account_id, browser = %device.browser, os = %device.os, "Suspicious: new device");
        reasons.push(ReasonCode::NewDevice);
    }

    // 4. Unusual hour — gated by its own sample floor, not by has_history.
    let hours = repo.successful_login_hours(account_id).await?;
    if let Some(baseline) = hour_baseline(&hours, cfg.min_hour_samples) {
        if is_unusual_hour(&baseline, login_hour, cfg) {
            info!(%account_id, login_hour, mean = baseline.mean, "Suspicious: unusual login time");
            reasons.push(ReasonCode::UnusualTime);
        }
    }

    // 5. Brute force — evidence-based, never suppressed.
    let since = chrono::Utc::now() - chrono::Duration::minutes(cfg.failed_window_minutes);
    let recent_failures = repo.count_failed_since(account_id, since).await?;
    if recent_failures >= cfg.failed_attempt_threshold {
        info!(%account_id, recent_failures, "Suspicious: multiple failed attempts");
        reasons.push(ReasonCode::MultipleFailedAttempts);
    }

    let is_suspicious = !reasons.is_empty();

    if is_test_mode {
        reasons.push(ReasonCode::TestModeSimulation);
    }

    Ok(RiskAssessment {
        is_suspicious,
        reasons,
    })
}
