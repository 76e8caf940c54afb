//! Suspicious-login alerting. Fire-and-forget: a failed send is logged and
//! dropped, never retried, and never surfaced to the login response.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use crate::config::Config;
use crate::models::login_activity::LoginActivity;

#[async_trait]
pub trait AlertNotifier: Send + Sync {
    async fn send_suspicious_login_alert(
        &self,
        to: &str,
        name: &str,
        activity: &LoginActivity,
    ) -> Result<()>;
}

/// SMTP-backed notifier.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(host: &str, username: &str, password: &str, from: &str) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();
        Ok(Self {
            transport,
            from: from.parse()?,
        })
    }
}

#[async_trait]
impl AlertNotifier for SmtpNotifier {
    async fn send_suspicious_login_alert(
        &self,
        to: &str,
        name: &str,
        activity: &LoginActivity,
    ) -> Result<()> {
        let reasons: Vec<&str> = activity
            .suspicious_reasons
            .iter()
            .map(|r| r.as_str())
            .collect();

        let body = format!(
            "Hi {name},\n\n\
             We noticed a sign-in to your account that looks unusual.\n\n\
             Time: {}\n\
             IP address: {}\n\
             Location: {}, {}\n\
             Device: {} on {}\n\
             Flags: {}\n\n\
             If this was you, you can dismiss this alert from your login history.\n\
             If not, please change your password immediately.\n",
            activity.login_time.format("%Y-%m-%d %H:%M UTC"),
            activity.ip_address,
            activity.geo.city,
            activity.geo.country_name,
            activity.device.browser,
            activity.device.os,
            reasons.join(", "),
        );

        let email = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject("Unusual sign-in to your account")
            .body(body)?;

        self.transport.send(email).await?;
        info!(to, "Suspicious login alert sent");
        Ok(())
    }
}

/// Used when SMTP is unconfigured: the alert is logged instead of mailed, so
/// the suspicious flag still lands in the stored record.
pub struct LogNotifier;

#[async_trait]
impl AlertNotifier for LogNotifier {
    async fn send_suspicious_login_alert(
        &self,
        to: &str,
        _name: &str,
        activity: &LoginActivity,
    ) -> Result<()> {
        warn!(
            to,
            ip = %activity.ip_address,
            reasons = ?activity.suspicious_reasons,
            "SMTP not configured; suspicious login alert logged only"
        );
        Ok(())
    }
}

/// Picks the SMTP notifier when credentials are present, the log-only one
/// otherwise.
pub fn build_notifier(config: &Config) -> Arc<dyn AlertNotifier> {
    match (&config.smtp_host, &config.smtp_username, &config.smtp_password) {
        (Some(host), Some(user), Some(pass)) => {
            match SmtpNotifier::new(host, user, pass, &config.alert_from) {
                Ok(notifier) => {
                    info!(host, "SMTP alert notifier initialized");
                    return Arc::new(notifier);
                }
                Err(e) => warn!("Failed to build SMTP notifier, falling back to log-only: {e}"),
            }
        }
        _ => info!("SMTP not configured, alerts will be logged only"),
    }
    Arc::new(LogNotifier)
}
