//! Safe Browsing client implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use sbguard_core::config::SafebrowsingConfig;
use sbguard_core::constants::{API_KEY_PARAM, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECONDS};
use sbguard_core::error::{Result, SbError};
use sbguard_core::traits::ThreatClient;
use sbguard_core::types::{FindThreatMatchesRequest, FindThreatMatchesResponse};

/// Longest error body kept in an [`SbError::HttpStatus`].
const MAX_ERROR_BODY: usize = 512;

/// Client configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Lookup endpoint (e.g. "https://safebrowsing.googleapis.com/v4/threatMatches:find")
    pub endpoint: String,
    /// API key, sent as `?key=...`
    pub api_key: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl ClientConfig {
    /// Creates config for the public endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            api_key: api_key.into(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    /// Overrides the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Overrides the timeout.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

impl From<&SafebrowsingConfig> for ClientConfig {
    fn from(config: &SafebrowsingConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            timeout_seconds: config.timeout,
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish_non_exhaustive()
    }
}

/// HTTP client for `threatMatches:find`.
pub struct SafebrowsingClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl SafebrowsingClient {
    /// Creates a client with the given config.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| SbError::ConfigError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Creates a client from the plugin configuration.
    pub fn from_config(config: &SafebrowsingConfig) -> Result<Self> {
        Self::with_config(ClientConfig::from(config))
    }

    /// The configured endpoint.
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Sends one lookup and decodes the answer.
    #[instrument(skip(self, request), fields(entries = request.threat_info.threat_entries.len()))]
    pub async fn find_threat_matches(
        &self,
        request: &FindThreatMatchesRequest,
    ) -> Result<FindThreatMatchesResponse> {
        let response = self
            .http_client
            .post(&self.config.endpoint)
            .query(&[(API_KEY_PARAM, self.config.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let mut body = match serde_json::from_str::<ApiErrorBody>(&raw) {
                Ok(parsed) => parsed.error.message,
                Err(_) => raw,
            };
            truncate(&mut body, MAX_ERROR_BODY);
            return Err(SbError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;
        let decoded: FindThreatMatchesResponse = serde_json::from_slice(&bytes)
            .map_err(|e| SbError::MalformedResponse(e.to_string()))?;

        debug!(matches = decoded.matches.len(), "Lookup answered");
        Ok(decoded)
    }

    // reqwest errors embed the request URL, which carries the API key.
    fn transport_error(&self, e: reqwest::Error) -> SbError {
        if e.is_timeout() {
            SbError::Timeout {
                seconds: self.config.timeout_seconds,
            }
        } else if e.is_decode() {
            SbError::MalformedResponse(e.without_url().to_string())
        } else {
            SbError::HttpError(e.without_url().to_string())
        }
    }
}

#[async_trait]
impl ThreatClient for SafebrowsingClient {
    async fn find_threat_matches(
        &self,
        request: &FindThreatMatchesRequest,
    ) -> Result<FindThreatMatchesResponse> {
        SafebrowsingClient::find_threat_matches(self, request).await
    }
}

fn truncate(s: &mut String, max: usize) {
    if s.len() > max {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        s.truncate(end);
    }
}

/// Error body shape returned by Google APIs.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}
