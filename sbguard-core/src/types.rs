//! Wire types for the Safe Browsing `threatMatches:find` API.
//!
//! - [`FindThreatMatchesRequest`]: batched lookup body
//! - [`FindThreatMatchesResponse`]: server answer
//! - [`ThreatMatch`]: one verdict, also the payload stored in the cache

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::THREAT_ENTRY_TYPE_URL;

/// Identifies the calling client to the API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    /// Client identifier
    pub client_id: String,
    /// Client version
    pub client_version: String,
}

/// A single entry to look up. Only exact URLs are supported.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatEntry {
    /// The URL being checked or matched
    pub url: String,
}

impl ThreatEntry {
    /// Creates an entry for a URL.
    pub fn url(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Filters and entries of a lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatInfo {
    /// Threat types to match against
    pub threat_types: Vec<String>,
    /// Platforms to match against
    pub platform_types: Vec<String>,
    /// Entry types present in `threat_entries`
    pub threat_entry_types: Vec<String>,
    /// The URLs to check
    pub threat_entries: Vec<ThreatEntry>,
}

/// Request body for `threatMatches:find`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindThreatMatchesRequest {
    /// Calling client
    pub client: ClientInfo,
    /// What to look up
    pub threat_info: ThreatInfo,
}

impl FindThreatMatchesRequest {
    /// Builds a URL lookup request.
    pub fn for_urls<I, S>(
        client: ClientInfo,
        threat_types: Vec<String>,
        platform_types: Vec<String>,
        urls: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            client,
            threat_info: ThreatInfo {
                threat_types,
                platform_types,
                threat_entry_types: vec![THREAT_ENTRY_TYPE_URL.to_string()],
                threat_entries: urls.into_iter().map(ThreatEntry::url).collect(),
            },
        }
    }

    /// Returns the URLs carried by this request, in request order.
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.threat_info.threat_entries.iter().map(|e| e.url.as_str())
    }
}

/// A verdict: why a URL was flagged.
///
/// Known fields are typed; anything else the server sends is kept in
/// `extra` so the payload is returned to callers unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatMatch {
    /// The matched entry
    pub threat: ThreatEntry,
    /// Matched threat type, e.g. `MALWARE`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threat_type: Option<String>,
    /// Matched platform, e.g. `ANY_PLATFORM`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_type: Option<String>,
    /// Matched entry type, normally `URL`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threat_entry_type: Option<String>,
    /// How long the verdict may be cached, e.g. `"300s"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_duration: Option<String>,
    /// Optional metadata attached by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threat_entry_metadata: Option<Value>,
    /// Unrecognized fields, preserved verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ThreatMatch {
    /// Creates a minimal match for a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            threat: ThreatEntry::url(url),
            threat_type: None,
            platform_type: None,
            threat_entry_type: None,
            cache_duration: None,
            threat_entry_metadata: None,
            extra: BTreeMap::new(),
        }
    }

    /// Sets the threat type.
    pub fn with_threat_type(mut self, threat_type: impl Into<String>) -> Self {
        self.threat_type = Some(threat_type.into());
        self
    }

    /// Sets the cache duration string.
    pub fn with_cache_duration(mut self, duration: impl Into<String>) -> Self {
        self.cache_duration = Some(duration.into());
        self
    }

    /// The matched URL.
    pub fn url(&self) -> &str {
        &self.threat.url
    }
}

/// Response body for `threatMatches:find`.
///
/// The server omits `matches` entirely when nothing matched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FindThreatMatchesResponse {
    /// Matches, in server order
    #[serde(default)]
    pub matches: Vec<ThreatMatch>,
}

impl FindThreatMatchesResponse {
    /// An empty response, used when nothing had to be queried.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ClientInfo {
        ClientInfo {
            client_id: "sbguard".into(),
            client_version: "0.1.0".into(),
        }
    }

    #[test]
    fn test_request_wire_format() {
        let req = FindThreatMatchesRequest::for_urls(
            client(),
            vec!["MALWARE".into()],
            vec!["ANY_PLATFORM".into()],
            ["http://a.test/", "http://b.test/"],
        );
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["client"]["clientId"], "sbguard");
        assert_eq!(json["client"]["clientVersion"], "0.1.0");
        assert_eq!(json["threatInfo"]["threatTypes"][0], "MALWARE");
        assert_eq!(json["threatInfo"]["platformTypes"][0], "ANY_PLATFORM");
        assert_eq!(json["threatInfo"]["threatEntryTypes"], serde_json::json!(["URL"]));
        assert_eq!(json["threatInfo"]["threatEntries"][1]["url"], "http://b.test/");
        assert_eq!(req.urls().collect::<Vec<_>>(), vec!["http://a.test/", "http://b.test/"]);
    }

    #[test]
    fn test_response_without_matches() {
        let resp: FindThreatMatchesResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.matches.is_empty());
    }

    #[test]
    fn test_match_keeps_unknown_fields() {
        let json = r#"{
            "threatType": "MALWARE",
            "platformType": "ANY_PLATFORM",
            "threatEntryType": "URL",
            "threat": {"url": "http://malware.test/"},
            "cacheDuration": "300.000s",
            "futureField": 7
        }"#;
        let m: ThreatMatch = serde_json::from_str(json).unwrap();

        assert_eq!(m.url(), "http://malware.test/");
        assert_eq!(m.threat_type.as_deref(), Some("MALWARE"));
        assert_eq!(m.cache_duration.as_deref(), Some("300.000s"));
        assert_eq!(m.extra.get("futureField"), Some(&serde_json::json!(7)));

        let back = serde_json::to_value(&m).unwrap();
        assert_eq!(back["futureField"], 7);
        assert_eq!(back["threat"]["url"], "http://malware.test/");
    }

    #[test]
    fn test_match_requires_threat_url() {
        let result: Result<ThreatMatch, _> = serde_json::from_str(r#"{"threatType": "MALWARE"}"#);
        assert!(result.is_err());
    }
}
