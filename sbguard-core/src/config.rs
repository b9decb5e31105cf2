//! Plugin configuration.
//!
//! Resolved once at construction. Every field has an explicit default, so a
//! host that supplies nothing gets a valid (but disabled) configuration.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::action::Action;
use crate::constants::{
    DEFAULT_CLIENT_ID, DEFAULT_CLIENT_VERSION, DEFAULT_ENDPOINT, DEFAULT_THREAT_PLATFORMS,
    DEFAULT_THREAT_TYPES, DEFAULT_TIMEOUT_SECONDS,
};
use crate::error::{Result, SbError};
use crate::types::ClientInfo;

/// Environment variable prefix used by [`SafebrowsingConfig::from_env`].
pub const ENV_PREFIX: &str = "SBGUARD_";

/// Safe Browsing lookup configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SafebrowsingConfig {
    /// API key; empty disables all lookups
    pub api_key: String,
    /// Action to take on a positive result
    #[serde(deserialize_with = "de_action")]
    pub action: Action,
    /// Threat types to query (upper-case)
    #[serde(deserialize_with = "de_threat_types")]
    pub threat_types: Vec<String>,
    /// Platforms to query (upper-case)
    #[serde(deserialize_with = "de_threat_platforms")]
    pub threat_platforms: Vec<String>,
    /// Request timeout in seconds
    pub timeout: u64,
    /// Lookup endpoint
    pub endpoint: String,
    /// Client identifier sent to the API
    pub client_id: String,
    /// Client version sent to the API
    pub client_version: String,
}

impl Default for SafebrowsingConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            action: Action::Dunno,
            threat_types: owned(DEFAULT_THREAT_TYPES),
            threat_platforms: owned(DEFAULT_THREAT_PLATFORMS),
            timeout: DEFAULT_TIMEOUT_SECONDS,
            endpoint: DEFAULT_ENDPOINT.into(),
            client_id: DEFAULT_CLIENT_ID.into(),
            client_version: DEFAULT_CLIENT_VERSION.into(),
        }
    }
}

impl fmt::Debug for SafebrowsingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafebrowsingConfig")
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
            .field("action", &self.action)
            .field("threat_types", &self.threat_types)
            .field("threat_platforms", &self.threat_platforms)
            .field("timeout", &self.timeout)
            .field("endpoint", &self.endpoint)
            .field("client_id", &self.client_id)
            .field("client_version", &self.client_version)
            .finish()
    }
}

impl SafebrowsingConfig {
    /// Creates a config with the given API key and defaults elsewhere.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Loads configuration from `SBGUARD_*` environment variables.
    ///
    /// A `.env` file in the working directory is loaded first, if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(format!("{ENV_PREFIX}{name}")).ok())
    }

    /// Builds a config from a key lookup function (`API_KEY`, `ACTION`, ...).
    ///
    /// Missing keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(key) = lookup("API_KEY") {
            config.api_key = key.trim().to_string();
        }
        if let Some(action) = lookup("ACTION") {
            config.action = action.parse()?;
        }
        if let Some(types) = lookup("THREAT_TYPES") {
            config = config.with_threat_types(&types);
        }
        if let Some(platforms) = lookup("THREAT_PLATFORMS") {
            config = config.with_threat_platforms(&platforms);
        }
        if let Some(timeout) = lookup("TIMEOUT") {
            config.timeout = timeout.trim().parse().map_err(|_| {
                SbError::ConfigError(format!("timeout must be whole seconds, got '{timeout}'"))
            })?;
        }
        if let Some(endpoint) = lookup("ENDPOINT") {
            config.endpoint = endpoint.trim().to_string();
        }

        Ok(config)
    }

    /// Sets the action taken on a positive result.
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    /// Sets threat types from a whitespace-separated list.
    ///
    /// An empty list falls back to the default threat types.
    pub fn with_threat_types(mut self, list: &str) -> Self {
        self.threat_types = word_list_or(list, DEFAULT_THREAT_TYPES);
        self
    }

    /// Sets platforms from a whitespace-separated list.
    ///
    /// An empty list falls back to `ANY_PLATFORM`.
    pub fn with_threat_platforms(mut self, list: &str) -> Self {
        self.threat_platforms = word_list_or(list, DEFAULT_THREAT_PLATFORMS);
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Points lookups at a different endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Returns true if an API key is configured.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// The client identification sent with each request.
    pub fn client_info(&self) -> ClientInfo {
        ClientInfo {
            client_id: self.client_id.clone(),
            client_version: self.client_version.clone(),
        }
    }

    /// Checks the configuration and reports every problem found.
    pub fn lint(&self) -> Vec<LintIssue> {
        let mut issues = Vec::new();

        if !self.has_api_key() {
            issues.push(LintIssue::MissingApiKey);
        }
        if self.threat_types.is_empty() {
            issues.push(LintIssue::NoThreatTypes);
        }
        if self.threat_platforms.is_empty() {
            issues.push(LintIssue::NoThreatPlatforms);
        }
        if self.timeout == 0 {
            issues.push(LintIssue::ZeroTimeout);
        }
        if let Err(e) = url::Url::parse(&self.endpoint) {
            issues.push(LintIssue::InvalidEndpoint(format!("{}: {e}", self.endpoint)));
        }

        issues
    }
}

/// A configuration problem reported by [`SafebrowsingConfig::lint`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LintIssue {
    /// No API key: every lookup is skipped.
    MissingApiKey,
    /// Threat-type filter is empty.
    NoThreatTypes,
    /// Platform filter is empty.
    NoThreatPlatforms,
    /// A zero timeout would fail every request.
    ZeroTimeout,
    /// Endpoint is not a valid URL.
    InvalidEndpoint(String),
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintIssue::MissingApiKey => f.write_str("api-key is not set, lookups are disabled"),
            LintIssue::NoThreatTypes => f.write_str("threat-types is empty"),
            LintIssue::NoThreatPlatforms => f.write_str("threat-platforms is empty"),
            LintIssue::ZeroTimeout => f.write_str("timeout must be at least 1 second"),
            LintIssue::InvalidEndpoint(detail) => write!(f, "endpoint is not a valid URL ({detail})"),
        }
    }
}

/// Splits a whitespace-separated list and upper-cases each item.
pub fn parse_word_list(list: &str) -> Vec<String> {
    list.split_whitespace().map(|s| s.to_uppercase()).collect()
}

fn word_list_or(list: &str, default: &[&str]) -> Vec<String> {
    let parsed = parse_word_list(list);
    if parsed.is_empty() {
        owned(default)
    } else {
        parsed
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Accepts either `"A B C"` or `["a", "b"]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum WordList {
    Joined(String),
    Items(Vec<String>),
}

impl WordList {
    fn resolve(self, default: &[&str]) -> Vec<String> {
        match self {
            WordList::Joined(s) => word_list_or(&s, default),
            WordList::Items(items) => word_list_or(&items.join(" "), default),
        }
    }
}

fn de_threat_types<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Vec<String>, D::Error> {
    Ok(WordList::deserialize(d)?.resolve(DEFAULT_THREAT_TYPES))
}

fn de_threat_platforms<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Vec<String>, D::Error> {
    Ok(WordList::deserialize(d)?.resolve(DEFAULT_THREAT_PLATFORMS))
}

fn de_action<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Action, D::Error> {
    let raw = String::deserialize(d)?;
    raw.parse().map_err(serde::de::Error::custom)
}
