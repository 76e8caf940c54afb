//! Best-effort user-agent parsing. Returns `"Unknown"` for anything it cannot
//! determine and never fails — a garbled client string degrades, it does not
//! block login tracking.

use crate::models::login_activity::DeviceInfo;

/// Parses a raw client string into structured device fields.
pub fn parse_user_agent(user_agent: &str) -> DeviceInfo {
    let mut info = DeviceInfo::unknown();
    let ua = user_agent.trim();
    if ua.is_empty() {
        return info;
    }

    parse_browser(ua, &mut info);
    parse_os(ua, &mut info);
    parse_device_class(ua, &mut info);
    info
}

/// Order matters: Chromium-family strings also contain "Safari", and Edge and
/// Opera also contain "Chrome".
fn parse_browser(ua: &str, info: &mut DeviceInfo) {
    let candidates = [
        ("Firefox", "Firefox/"),
        ("Edge", "Edg/"),
        ("Opera", "OPR/"),
        ("Chrome", "Chrome/"),
        ("Safari", "Version/"),
    ];

    for (name, marker) in candidates {
        if name == "Safari" && !ua.contains("Safari") {
            continue;
        }
        if let Some(version) = version_after(ua, marker) {
            info.browser = name.to_string();
            info.browser_version = version;
            return;
        }
    }
}

fn parse_os(ua: &str, info: &mut DeviceInfo) {
    if let Some(version) = version_after(ua, "Windows NT ") {
        info.os = "Windows".to_string();
        info.os_version = version;
    } else if ua.contains("iPhone") || ua.contains("iPad") {
        info.os = "iOS".to_string();
        if let Some(version) = version_after(ua, "OS ") {
            info.os_version = version.replace('_', ".");
        }
    } else if let Some(version) = version_after(ua, "Android ") {
        info.os = "Android".to_string();
        info.os_version = version;
    } else if let Some(version) = version_after(ua, "Mac OS X ") {
        info.os = "macOS".to_string();
        info.os_version = version.replace('_', ".");
    } else if ua.contains("Linux") {
        info.os = "Linux".to_string();
    }
}

fn parse_device_class(ua: &str, info: &mut DeviceInfo) {
    if ua.contains("iPad") || ua.contains("Tablet") {
        info.device = "Tablet".to_string();
    } else if ua.contains("Mobile") || ua.contains("iPhone") || ua.contains("Android") {
        info.device = "Mobile".to_string();
    } else {
        info.device = "Desktop".to_string();
    }
}

/// Returns the dotted/underscored version token following `marker`, if any.
fn version_after(ua: &str, marker: &str) -> Option<String> {
    let start = ua.find(marker)? + marker.len();
    let rest = &ua[start..];
    let version: String = rest
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '_')
        .collect();
    if version.is_empty() {
        None
    } else {
        Some(version)
    }
}
