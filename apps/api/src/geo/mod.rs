//! IP geolocation — the single point of entry for all IPinfo calls.
//!
//! Resolution is infallible by contract: local/private addresses short-circuit
//! to the "Local" sentinel without an external call, a missing token or any
//! API failure degrades to the "Unknown" sentinel, and country-based risk
//! checks simply cannot fire for sentinel records (`country = "XX"`).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::login_activity::GeoInfo;

const IPINFO_API_URL: &str = "https://ipinfo.io";

/// Sentinel country code shared by the Local and Unknown records.
pub const SENTINEL_COUNTRY: &str = "XX";

/// Resolves a network address to a geolocation record. Never fails.
#[async_trait]
pub trait GeoResolver: Send + Sync {
    async fn resolve(&self, ip: &str) -> GeoInfo;
}

impl GeoInfo {
    /// Fixed record for loopback/private addresses. No external call is made.
    pub fn local() -> Self {
        GeoInfo {
            city: "Local".to_string(),
            region: "Local".to_string(),
            country: SENTINEL_COUNTRY.to_string(),
            country_name: "Local Network".to_string(),
            loc: "0,0".to_string(),
            org: "Local Network".to_string(),
            postal: "00000".to_string(),
            timezone: "UTC".to_string(),
        }
    }

    /// Fixed record used when the lookup is unconfigured or fails.
    pub fn unknown() -> Self {
        GeoInfo {
            city: "Unknown".to_string(),
            region: "Unknown".to_string(),
            country: SENTINEL_COUNTRY.to_string(),
            country_name: "Unknown".to_string(),
            loc: "0,0".to_string(),
            org: "Unknown ISP".to_string(),
            postal: "N/A".to_string(),
            timezone: "UTC".to_string(),
        }
    }
}

/// Loopback and private-range addresses are never sent to the API.
pub fn is_local_address(ip: &str) -> bool {
    ip.is_empty() || ip == "::1" || ip.starts_with("127.") || ip.starts_with("192.168.")
}

#[derive(Debug, Deserialize)]
struct IpinfoResponse {
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
    loc: Option<String>,
    org: Option<String>,
    postal: Option<String>,
    timezone: Option<String>,
}

/// IPinfo-backed resolver. One HTTP call per non-local address.
pub struct IpinfoClient {
    client: Client,
    token: Option<String>,
    base_url: String,
}

impl IpinfoClient {
    pub fn new(token: Option<String>) -> Self {
        Self::with_base_url(token, IPINFO_API_URL.to_string())
    }

    pub fn with_base_url(token: Option<String>, base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("Failed to build HTTP client"),
            token,
            base_url,
        }
    }

    async fn lookup(&self, ip: &str, token: &str) -> anyhow::Result<GeoInfo> {
        let url = format!("{}/{ip}?token={token}", self.base_url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("IPinfo API returned {status}");
        }

        let data: IpinfoResponse = response.json().await?;

        debug!(
            ip,
            city = data.city.as_deref(),
            country = data.country.as_deref(),
            "IPinfo lookup succeeded"
        );

        let country = data.country.unwrap_or_else(|| SENTINEL_COUNTRY.to_string());
        let country_name = country_name(&country)
            .map(str::to_string)
            .unwrap_or_else(|| country.clone());

        Ok(GeoInfo {
            city: data.city.unwrap_or_else(|| "Unknown".to_string()),
            region: data.region.unwrap_or_else(|| "Unknown".to_string()),
            country,
            country_name,
            loc: data.loc.unwrap_or_else(|| "0,0".to_string()),
            org: data.org.unwrap_or_else(|| "Unknown ISP".to_string()),
            postal: data.postal.unwrap_or_else(|| "N/A".to_string()),
            timezone: data.timezone.unwrap_or_else(|| "UTC".to_string()),
        })
    }
}

#[async_trait]
impl GeoResolver for IpinfoClient {
    async fn resolve(&self, ip: &str) -> GeoInfo {
        if is_local_address(ip) {
            debug!(ip, "Local address, using Local sentinel");
            return GeoInfo::local();
        }

        let token = match &self.token {
            Some(t) => t,
            None => {
                debug!("IPinfo token not configured, using Unknown sentinel");
                return GeoInfo::unknown();
            }
        };

        match self.lookup(ip, token).await {
            Ok(geo) => geo,
            Err(e) => {
                warn!(ip, "IPinfo lookup failed: {e}");
                GeoInfo::unknown()
            }
        }
    }
}

/// Full names for common country codes; callers fall back to the raw code.
fn country_name(code: &str) -> Option<&'static str> {
    Some(match code {
        "BD" => "Bangladesh",
        "US" => "United States",
        "GB" => "United Kingdom",
        "IN" => "India",
        "PK" => "Pakistan",
        "CA" => "Canada",
        "AU" => "Australia",
        "DE" => "Germany",
        "FR" => "France",
        "JP" => "Japan",
        "CN" => "China",
        "BR" => "Brazil",
        "RU" => "Russia",
        "ZA" => "South Africa",
        "KR" => "South Korea",
        "IT" => "Italy",
        "ES" => "Spain",
        "MX" => "Mexico",
        "NL" => "Netherlands",
        "SE" => "Sweden",
        "NO" => "Norway",
        "DK" => "Denmark",
        "FI" => "Finland",
        "SG" => "Singapore",
        "MY" => "Malaysia",
        "TH" => "Thailand",
        "ID" => "Indonesia",
        "PH" => "Philippines",
        "VN" => "Vietnam",
        "AE" => "United Arab Emirates",
        "SA" => "Saudi Arabia",
        "TR" => "Turkey",
        "EG" => "Egypt",
        "NG" => "Nigeria",
        _ => return None,
    })
}
