//! User-agent classification.
//!
//! Deliberately shallow substring matching; anything smarter belongs behind
//! the [`EnvironmentClassifier`] trait.

use serde::{Deserialize, Serialize};

const UNKNOWN: &str = "Unknown";

/// Device, browser and OS class of a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub device: String,
    pub browser: String,
    pub os: String,
}

impl Environment {
    pub fn unknown() -> Self {
        Self {
            device: UNKNOWN.to_string(),
            browser: UNKNOWN.to_string(),
            os: UNKNOWN.to_string(),
        }
    }
}

/// Derives an [`Environment`] from a raw user-agent string.
pub trait EnvironmentClassifier: Send + Sync {
    fn classify(&self, user_agent: &str) -> Environment;
}

/// First-match keyword tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

// Order matters: Edge and Opera also advertise Chrome, Chrome advertises Safari.
const BROWSERS: &[(&str, &str)] = &[
    ("edg/", "Edge"),
    ("opr/", "Opera"),
    ("samsungbrowser", "Samsung Internet"),
    ("kakaotalk", "KakaoTalk"),
    ("naver", "Naver"),
    ("firefox/", "Firefox"),
    ("fxios", "Firefox"),
    ("crios", "Chrome"),
    ("chrome/", "Chrome"),
    ("safari/", "Safari"),
    ("curl/", "curl"),
];

const OPERATING_SYSTEMS: &[(&str, &str)] = &[
    ("android", "Android"),
    ("iphone", "iOS"),
    ("ipad", "iOS"),
    ("windows", "Windows"),
    ("mac os x", "macOS"),
    ("cros", "ChromeOS"),
    ("linux", "Linux"),
];

fn first_match(haystack: &str, table: &'static [(&'static str, &'static str)]) -> Option<&'static str> {
    table
        .iter()
        .find(|(needle, _)| haystack.contains(needle))
        .map(|(_, label)| *label)
}

impl EnvironmentClassifier for KeywordClassifier {
    fn classify(&self, user_agent: &str) -> Environment {
        let ua = user_agent.to_ascii_lowercase();
        if ua.trim().is_empty() {
            return Environment::unknown();
        }

        let device = if ua.contains("bot") || ua.contains("spider") || ua.contains("crawl") {
            "Bot"
        } else if ua.contains("ipad") || ua.contains("tablet") {
            "Tablet"
        } else if ua.contains("mobi") || ua.contains("iphone") || ua.contains("android") {
            "Mobile"
        } else {
            "Desktop"
        };

        Environment {
            device: device.to_string(),
            browser: first_match(&ua, BROWSERS).unwrap_or(UNKNOWN).to_string(),
            os: first_match(&ua, OPERATING_SYSTEMS).unwrap_or(UNKNOWN).to_string(),
        }
    }
}
