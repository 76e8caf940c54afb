use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Required variables fail startup; the external-signal tokens are optional —
/// when absent the matching client degrades to its fixed fallback instead of
/// calling out.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// IPinfo API token. `None` ⇒ geolocation resolves to the Unknown sentinel.
    pub ipinfo_token: Option<String>,
    /// News API key. `None` ⇒ trend fetches return the fixed fallback list.
    pub news_api_key: Option<String>,
    pub news_endpoint: String,
    pub smtp_host: Option<String>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub alert_from: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            ipinfo_token: optional_env("IPINFO_TOKEN"),
            news_api_key: optional_env("NEWS_API_KEY"),
            news_endpoint: std::env::var("NEWS_ENDPOINT")
                .unwrap_or_else(|_| "https://newsapi.org/v2/everything".to_string()),
            smtp_host: optional_env("SMTP_HOST"),
            smtp_username: optional_env("SMTP_USERNAME"),
            smtp_password: optional_env("SMTP_PASSWORD"),
            alert_from: std::env::var("ALERT_FROM")
                .unwrap_or_else(|_| "security@jobportal.local".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
