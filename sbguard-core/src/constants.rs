//! Protocol constants for SBGUARD.
//!
//! Values follow the Safe Browsing v4 `threatMatches:find` API.

// ═══════════════════════════════════════════════════════════════════════════════
// API ENDPOINT
// ═══════════════════════════════════════════════════════════════════════════════

/// Default Safe Browsing lookup endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://safebrowsing.googleapis.com/v4/threatMatches:find";

/// Query-string parameter carrying the API key.
pub const API_KEY_PARAM: &str = "key";

/// Client identifier sent with every lookup.
pub const DEFAULT_CLIENT_ID: &str = "sbguard";

/// Client version sent with every lookup.
pub const DEFAULT_CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

// ═══════════════════════════════════════════════════════════════════════════════
// THREAT FILTERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Threat types queried when none are configured.
pub const DEFAULT_THREAT_TYPES: &[&str] = &[
    "THREAT_TYPE_UNSPECIFIED",
    "MALWARE",
    "SOCIAL_ENGINEERING",
    "UNWANTED_SOFTWARE",
    "POTENTIALLY_HARMFUL_APPLICATION",
];

/// Platforms queried when none are configured.
pub const DEFAULT_THREAT_PLATFORMS: &[&str] = &["ANY_PLATFORM"];

/// The only entry type this crate looks up: exact URL strings.
pub const THREAT_ENTRY_TYPE_URL: &str = "URL";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_threat_types() {
        assert_eq!(DEFAULT_THREAT_TYPES.len(), 5);
        assert!(DEFAULT_THREAT_TYPES.contains(&"MALWARE"));
        assert!(DEFAULT_THREAT_TYPES
            .iter()
            .all(|t| t.chars().all(|c| c.is_ascii_uppercase() || c == '_')));
    }

    #[test]
    fn test_default_endpoint_is_https() {
        assert!(DEFAULT_ENDPOINT.starts_with("https://"));
        assert!(DEFAULT_ENDPOINT.ends_with("threatMatches:find"));
    }
}
