//! Login-activity records: one append-only row per login attempt, successful
//! or failed, with resolved geolocation and parsed device context. The only
//! permitted mutation is clearing the suspicious flag when a user dismisses
//! an alert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginStatus {
    Success,
    Failed,
}

impl LoginStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginStatus::Success => "success",
            LoginStatus::Failed => "failed",
        }
    }
}

/// Why a login was flagged. Closed enumeration — never free strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    NewIp,
    NewCountry,
    NewBrowser,
    NewOs,
    UnusualTime,
    MultipleFailedAttempts,
    NewDevice,
    TestModeSimulation,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::NewIp => "new_ip",
            ReasonCode::NewCountry => "new_country",
            ReasonCode::NewBrowser => "new_browser",
            ReasonCode::NewOs => "new_os",
            ReasonCode::UnusualTime => "unusual_time",
            ReasonCode::MultipleFailedAttempts => "multiple_failed_attempts",
            ReasonCode::NewDevice => "new_device",
            ReasonCode::TestModeSimulation => "test_mode_simulation",
        }
    }

    /// Parses the stored wire form. Unknown values are dropped by callers
    /// rather than invented.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "new_ip" => ReasonCode::NewIp,
            "new_country" => ReasonCode::NewCountry,
            "new_browser" => ReasonCode::NewBrowser,
            "new_os" => ReasonCode::NewOs,
            "unusual_time" => ReasonCode::UnusualTime,
            "multiple_failed_attempts" => ReasonCode::MultipleFailedAttempts,
            "new_device" => ReasonCode::NewDevice,
            "test_mode_simulation" => ReasonCode::TestModeSimulation,
            _ => return None,
        })
    }
}

/// Resolved geolocation for an address. Always fully populated — lookups
/// that cannot resolve degrade to the fixed sentinels in `geo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoInfo {
    pub city: String,
    pub region: String,
    /// Two-letter country code; `"XX"` for local/unknown.
    pub country: String,
    pub country_name: String,
    pub loc: String,
    pub org: String,
    pub postal: String,
    pub timezone: String,
}

/// Parsed client fields. Every field the parser cannot determine is
/// `"Unknown"`; the class defaults to `"Desktop"`. Parsing never fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub browser: String,
    pub browser_version: String,
    pub os: String,
    pub os_version: String,
    pub device: String,
    pub device_vendor: String,
    pub device_model: String,
}

impl DeviceInfo {
    pub fn unknown() -> Self {
        Self {
            browser: "Unknown".to_string(),
            browser_version: "Unknown".to_string(),
            os: "Unknown".to_string(),
            os_version: "Unknown".to_string(),
            device: "Desktop".to_string(),
            device_vendor: "Unknown".to_string(),
            device_model: "Unknown".to_string(),
        }
    }
}

/// Test-mode simulation context, retained on the record for audit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestModeData {
    pub simulated_country: Option<String>,
    pub simulated_ip: Option<String>,
    pub simulated_device: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginActivity {
    pub id: Uuid,
    pub account_id: Uuid,
    pub status: LoginStatus,
    pub is_suspicious: bool,
    pub suspicious_reasons: Vec<ReasonCode>,
    pub ip_address: String,
    pub geo: GeoInfo,
    pub user_agent: String,
    pub device: DeviceInfo,
    pub login_time: DateTime<Utc>,
    /// 0–23, for unusual-time detection.
    pub login_hour: i16,
    pub is_test_mode: bool,
    pub test_mode_data: Option<TestModeData>,
    pub alert_sent: bool,
    pub alert_sent_at: Option<DateTime<Utc>>,
}

/// Insert shape — everything but the store-assigned id.
#[derive(Debug, Clone)]
pub struct NewLoginActivity {
    pub account_id: Uuid,
    pub status: LoginStatus,
    pub is_suspicious: bool,
    pub suspicious_reasons: Vec<ReasonCode>,
    pub ip_address: String,
    pub geo: GeoInfo,
    pub user_agent: String,
    pub device: DeviceInfo,
    pub login_time: DateTime<Utc>,
    pub login_hour: i16,
    pub is_test_mode: bool,
    pub test_mode_data: Option<TestModeData>,
}
