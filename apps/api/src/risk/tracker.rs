//! Records login attempts: resolves geolocation, parses the client string,
//! runs the risk assessment, appends the activity record, and dispatches a
//! best-effort alert when the attempt is suspicious.

use std::sync::Arc;

use chrono::{Timelike, Utc};
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::device::parse_user_agent;
use crate::errors::AppError;
use crate::geo::GeoResolver;
use crate::models::login_activity::{
    LoginActivity, LoginStatus, NewLoginActivity, TestModeData,
};
use crate::notify::AlertNotifier;
use crate::repo::{AccountRepo, LoginActivityRepo};
use crate::risk::scorer::{assess, RiskAssessment, RiskConfig};

/// Simulated context for demonstration logins. The simulated IP replaces the
/// lookup input, the simulated country overrides the resolved record, and the
/// simulated device is a `"Browser on OS"` string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestOverrides {
    #[serde(default)]
    pub test_mode: bool,
    pub simulated_country: Option<String>,
    pub simulated_ip: Option<String>,
    pub simulated_device: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TrackedLogin {
    pub activity: LoginActivity,
    pub assessment: RiskAssessment,
}

#[derive(Clone)]
pub struct LoginTracker {
    logins: Arc<dyn LoginActivityRepo>,
    accounts: Arc<dyn AccountRepo>,
    geo: Arc<dyn GeoResolver>,
    notifier: Arc<dyn AlertNotifier>,
    cfg: RiskConfig,
}

impl LoginTracker {
    pub fn new(
        logins: Arc<dyn LoginActivityRepo>,
        accounts: Arc<dyn AccountRepo>,
        geo: Arc<dyn GeoResolver>,
        notifier: Arc<dyn AlertNotifier>,
        cfg: RiskConfig,
    ) -> Self {
        Self {
            logins,
            accounts,
            geo,
            notifier,
            cfg,
        }
    }

    /// Appends a successful-login record with its assessment. Scoring and
    /// alerting can only annotate the login; neither can fail it.
    pub async fn track_successful_login(
        &self,
        account_id: Uuid,
        ip: &str,
        user_agent: &str,
        overrides: TestOverrides,
    ) -> Result<TrackedLogin, AppError> {
        let test_mode = overrides.test_mode;

        // Simulated IP replaces the lookup input, not just the stored value.
        let effective_ip = match (test_mode, &overrides.simulated_ip) {
            (true, Some(sim)) => sim.clone(),
            _ => ip.to_string(),
        };

        let mut geo = self.geo.resolve(&effective_ip).await;
        if test_mode {
            if let Some(country) = &overrides.simulated_country {
                geo.country = country.clone();
                geo.country_name = country.clone();
            }
        }

        let mut device = parse_user_agent(user_agent);
        if test_mode {
            if let Some(simulated) = &overrides.simulated_device {
                if let Some((browser, os)) = simulated.split_once(" on ") {
                    device.browser = browser.to_string();
                    device.os = os.to_string();
                }
            }
        }

        let now = Utc::now();
        let login_hour = now.hour() as i16;

        let assessment = match assess(
            self.logins.as_ref(),
            &self.cfg,
            account_id,
            &effective_ip,
            &geo,
            &device,
            login_hour,
            test_mode,
        )
        .await
        {
            Ok(a) => a,
            Err(e) => {
                // Scoring problems never fail the login.
                error!(%account_id, "Risk assessment failed, recording as not suspicious: {e}");
                RiskAssessment::default()
            }
        };

        let activity = self
            .logins
            .insert(NewLoginActivity {
                account_id,
                status: LoginStatus::Success,
                is_suspicious: assessment.is_suspicious,
                suspicious_reasons: assessment.reasons.clone(),
                ip_address: effective_ip,
                geo,
                user_agent: user_agent.to_string(),
                device,
                login_time: now,
                login_hour,
                is_test_mode: test_mode,
                test_mode_data: test_mode.then(|| TestModeData {
                    simulated_country: overrides.simulated_country.clone(),
                    simulated_ip: overrides.simulated_ip.clone(),
                    simulated_device: overrides.simulated_device.clone(),
                }),
            })
            .await?;

        info!(
            %account_id,
            is_suspicious = assessment.is_suspicious,
            reasons = ?assessment.reasons,
            "Login tracked"
        );

        if assessment.is_suspicious {
            self.dispatch_alert(activity.clone());
        }

        Ok(TrackedLogin {
            activity,
            assessment,
        })
    }

    /// Appends a failed-attempt record. Unknown accounts are the caller's
    /// problem; this only records attempts against a resolved account id.
    pub async fn track_failed_login(
        &self,
        account_id: Uuid,
        ip: &str,
        user_agent: &str,
    ) -> Result<LoginActivity, AppError> {
        let geo = self.geo.resolve(ip).await;
        let device = parse_user_agent(user_agent);
        let now = Utc::now();

        let activity = self
            .logins
            .insert(NewLoginActivity {
                account_id,
                status: LoginStatus::Failed,
                is_suspicious: false,
                suspicious_reasons: vec![],
                ip_address: ip.to_string(),
                geo,
                user_agent: user_agent.to_string(),
                device,
                login_time: now,
                login_hour: now.hour() as i16,
                is_test_mode: false,
                test_mode_data: None,
            })
            .await?;

        info!(%account_id, ip, "Failed login tracked");
        Ok(activity)
    }

    /// Best-effort, off the request path. Send failures are logged and
    /// dropped — no retry, nothing surfaced to the caller.
    fn dispatch_alert(&self, activity: LoginActivity) {
        let accounts = Arc::clone(&self.accounts);
        let logins = Arc::clone(&self.logins);
        let notifier = Arc::clone(&self.notifier);

        tokio::spawn(async move {
            let account = match accounts.find_by_id(activity.account_id).await {
                Ok(Some(account)) => account,
                Ok(None) => {
                    warn!(account_id = %activity.account_id, "Suspicious login for unknown account, no alert");
                    return;
                }
                Err(e) => {
                    error!("Failed to load account for alert: {e}");
                    return;
                }
            };

            match notifier
                .send_suspicious_login_alert(&account.email, &account.name, &activity)
                .await
            {
                Ok(()) => {
                    if let Err(e) = logins.mark_alert_sent(activity.id).await {
                        warn!("Alert sent but could not mark record: {e}");
                    }
                }
                Err(e) => error!(to = %account.email, "Failed to send suspicious login alert: {e}"),
            }
        });
    }
}
