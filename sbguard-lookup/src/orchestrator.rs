//! Cache-then-remote lookup and merge.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use sbguard_cache::VerdictCache;
use sbguard_client::SafebrowsingClient;
use sbguard_core::config::SafebrowsingConfig;
use sbguard_core::error::{Result, SbError};
use sbguard_core::traits::ThreatClient;
use sbguard_core::types::{FindThreatMatchesRequest, FindThreatMatchesResponse, ThreatMatch};

use crate::duration::parse_cache_duration;

/// Merged verdicts for one `check` call.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LookupResult {
    /// Remote matches in server order, followed by cached matches
    pub matches: Vec<ThreatMatch>,
    /// Number of URLs sent to the remote service
    pub queried: usize,
    /// Number of matches answered from cache
    pub cache_hits: usize,
}

impl LookupResult {
    /// Returns true if no URL was flagged.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Number of flagged URLs.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// The flagged URLs, in result order.
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.matches.iter().map(|m| m.url())
    }
}

/// Why a check did nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// No API key configured.
    NoApiKey,
    /// No URLs to check.
    NoUrls,
}

/// Outcome of a check, with the failure reason kept for the caller to log.
#[derive(Debug)]
pub enum LookupOutcome {
    /// Nothing was looked up.
    Skipped(SkipReason),
    /// Lookup finished (possibly with zero matches).
    Completed(LookupResult),
    /// The remote service could not be reached or answered badly.
    Failed(SbError),
}

impl LookupOutcome {
    /// Collapses to the caller-facing form: a result, or no verdict.
    pub fn into_result(self) -> Option<LookupResult> {
        match self {
            LookupOutcome::Completed(result) => Some(result),
            LookupOutcome::Skipped(_) | LookupOutcome::Failed(_) => None,
        }
    }

    /// Returns true if the remote call failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, LookupOutcome::Failed(_))
    }
}

/// Checks URLs against Safe Browsing through a private verdict cache.
///
/// For each call:
/// 1. URLs with a valid cached verdict are answered from cache
/// 2. The rest go out in one batched request (none if everything was cached)
/// 3. Returned matches with a positive `cacheDuration` are cached
/// 4. Remote matches come first in the result, cached ones after
///
/// Remote failures never escape [`check`](Self::check); they are logged and
/// reported as "no verdict".
pub struct LookupOrchestrator {
    config: SafebrowsingConfig,
    client: Arc<dyn ThreatClient>,
    cache: VerdictCache,
}

impl LookupOrchestrator {
    /// Creates an orchestrator talking to the configured endpoint.
    pub fn new(config: SafebrowsingConfig) -> Result<Self> {
        let client = SafebrowsingClient::from_config(&config)?;
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// Creates an orchestrator with a custom remote client.
    pub fn with_client(config: SafebrowsingConfig, client: Arc<dyn ThreatClient>) -> Self {
        Self::with_cache(config, client, VerdictCache::new())
    }

    /// Creates an orchestrator with a custom client and cache.
    pub fn with_cache(
        config: SafebrowsingConfig,
        client: Arc<dyn ThreatClient>,
        cache: VerdictCache,
    ) -> Self {
        Self {
            config,
            client,
            cache,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &SafebrowsingConfig {
        &self.config
    }

    /// The verdict cache.
    pub fn cache(&self) -> &VerdictCache {
        &self.cache
    }

    /// Drops every cached verdict.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Checks URLs and returns merged verdicts.
    ///
    /// Returns None when the check was skipped (no API key, no URLs) or the
    /// remote service failed. A `Some` result may still hold zero matches.
    pub async fn check<I, S>(&self, urls: I) -> Option<LookupResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.check_outcome(urls).await.into_result()
    }

    /// Like [`check`](Self::check), but keeps the reason for a missing result.
    #[instrument(skip_all)]
    pub async fn check_outcome<I, S>(&self, urls: I) -> LookupOutcome
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.config.has_api_key() {
            debug!("No API key configured, skipping lookup");
            return LookupOutcome::Skipped(SkipReason::NoApiKey);
        }

        let urls: BTreeSet<String> = urls.into_iter().map(|u| u.as_ref().to_string()).collect();
        if urls.is_empty() {
            return LookupOutcome::Skipped(SkipReason::NoUrls);
        }

        let cached = self.cache.get_many(&urls);
        let cached_urls: HashSet<&str> = cached.iter().map(|m| m.url()).collect();
        let to_query: Vec<&str> = urls
            .iter()
            .map(String::as_str)
            .filter(|u| !cached_urls.contains(u))
            .collect();

        let response = if to_query.is_empty() {
            debug!(cached = cached.len(), "All URLs answered from cache");
            FindThreatMatchesResponse::empty()
        } else {
            let request = self.build_request(&to_query);
            match self.client.find_threat_matches(&request).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(error = %e, urls = to_query.len(), "Safe Browsing lookup failed");
                    return LookupOutcome::Failed(e);
                }
            }
        };

        for m in &response.matches {
            let ttl = parse_cache_duration(m.cache_duration.as_deref());
            if ttl > 0 {
                self.cache.store(m.url(), m.clone(), ttl);
            } else {
                debug!(url = m.url(), duration = ?m.cache_duration, "Match not cacheable");
            }
        }

        let queried = to_query.len();
        let cache_hits = cached.len();
        let mut matches = response.matches;
        matches.extend(cached);

        info!(queried, cache_hits, matches = matches.len(), "Lookup complete");

        LookupOutcome::Completed(LookupResult {
            matches,
            queried,
            cache_hits,
        })
    }

    fn build_request(&self, urls: &[&str]) -> FindThreatMatchesRequest {
        FindThreatMatchesRequest::for_urls(
            self.config.client_info(),
            self.config.threat_types.clone(),
            self.config.threat_platforms.clone(),
            urls.iter().copied(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{malware, FakeClient};
    use sbguard_cache::ManualClock;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BAD: &str = "http://malware.test/";
    const CLEAN: &str = "http://clean.test/";

    fn config() -> SafebrowsingConfig {
        SafebrowsingConfig::new("test-key")
    }

    fn orchestrator(client: Arc<FakeClient>) -> LookupOrchestrator {
        LookupOrchestrator::with_client(config(), client)
    }

    #[tokio::test]
    async fn test_no_api_key_skips() {
        let client = Arc::new(FakeClient::with_matches(vec![malware(BAD, Some("300s"))]));
        let lookup = LookupOrchestrator::with_client(SafebrowsingConfig::default(), client.clone());

        let outcome = lookup.check_outcome([BAD]).await;

        assert!(matches!(outcome, LookupOutcome::Skipped(SkipReason::NoApiKey)));
        assert!(lookup.check([BAD]).await.is_none());
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_urls_skips() {
        let client = Arc::new(FakeClient::with_matches(vec![]));
        let lookup = orchestrator(client.clone());

        let outcome = lookup.check_outcome(Vec::<String>::new()).await;

        assert!(matches!(outcome, LookupOutcome::Skipped(SkipReason::NoUrls)));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_cached_url_needs_no_remote_call() {
        let client = Arc::new(FakeClient::with_matches(vec![]));
        let lookup = orchestrator(client.clone());
        lookup.cache().store(BAD, malware(BAD, Some("300s")), 300);

        let result = lookup.check([BAD]).await.unwrap();

        assert_eq!(result.matches, vec![malware(BAD, Some("300s"))]);
        assert_eq!(result.cache_hits, 1);
        assert_eq!(result.queried, 0);
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_second_check_served_from_cache() {
        let client = Arc::new(FakeClient::with_matches(vec![malware(BAD, Some("300.000s"))]));
        let lookup = orchestrator(client.clone());

        let first = lookup.check([BAD]).await.unwrap();
        let second = lookup.check([BAD]).await.unwrap();

        assert_eq!(first.matches, second.matches);
        assert_eq!(first.queried, 1);
        assert_eq!(second.cache_hits, 1);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_match_without_duration_is_returned_not_cached() {
        let client = Arc::new(FakeClient::with_matches(vec![malware(BAD, None)]));
        let lookup = orchestrator(client.clone());

        let first = lookup.check([BAD]).await.unwrap();
        assert_eq!(first.len(), 1);
        assert!(lookup.cache().is_empty());

        lookup.check([BAD]).await.unwrap();
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_unparsable_duration_is_not_cached() {
        let client = Arc::new(FakeClient::with_matches(vec![malware(BAD, Some("300"))]));
        let lookup = orchestrator(client);

        let result = lookup.check([BAD]).await.unwrap();

        assert_eq!(result.len(), 1);
        assert!(lookup.cache().get(BAD).is_none());
    }

    #[tokio::test]
    async fn test_remote_matches_precede_cached() {
        let fresh = "http://fresh.test/";
        let client = Arc::new(FakeClient::with_matches(vec![malware(fresh, Some("60s"))]));
        let lookup = orchestrator(client.clone());
        lookup.cache().store(BAD, malware(BAD, Some("300s")), 300);

        let result = lookup.check([BAD, fresh, CLEAN]).await.unwrap();

        assert_eq!(result.urls().collect::<Vec<_>>(), vec![fresh, BAD]);
        assert_eq!(result.queried, 2);
        assert_eq!(result.cache_hits, 1);

        let request = client.last_request().unwrap();
        assert_eq!(request.urls().collect::<Vec<_>>(), vec![CLEAN, fresh]);
    }

    #[tokio::test]
    async fn test_request_carries_configured_filters() {
        let client = Arc::new(FakeClient::with_matches(vec![]));
        let config = config()
            .with_threat_types("malware social_engineering")
            .with_threat_platforms("windows");
        let lookup = LookupOrchestrator::with_client(config, client.clone());

        let result = lookup.check([CLEAN]).await.unwrap();
        assert!(result.is_empty());

        let request = client.last_request().unwrap();
        assert_eq!(request.threat_info.threat_types, vec!["MALWARE", "SOCIAL_ENGINEERING"]);
        assert_eq!(request.threat_info.platform_types, vec!["WINDOWS"]);
        assert_eq!(request.threat_info.threat_entry_types, vec!["URL"]);
        assert_eq!(request.client.client_id, "sbguard");
    }

    #[tokio::test]
    async fn test_duplicates_queried_once() {
        let client = Arc::new(FakeClient::with_matches(vec![malware(BAD, Some("60s"))]));
        let lookup = orchestrator(client.clone());

        let result = lookup.check([BAD, BAD, BAD]).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(client.last_request().unwrap().urls().count(), 1);
        assert_eq!(lookup.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_remote_failure_returns_none() {
        let client = Arc::new(FakeClient::failing());
        let lookup = orchestrator(client.clone());

        let outcome = lookup.check_outcome([BAD]).await;
        assert!(outcome.is_failed());
        assert!(matches!(outcome, LookupOutcome::Failed(SbError::HttpError(_))));

        assert!(lookup.check([BAD]).await.is_none());
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_expired_verdict_is_requeried() {
        let clock = Arc::new(ManualClock::new());
        let client = Arc::new(FakeClient::with_matches(vec![malware(BAD, Some("300s"))]));
        let lookup = LookupOrchestrator::with_cache(
            config(),
            client.clone(),
            VerdictCache::with_clock(clock.clone()),
        );

        lookup.check([BAD]).await.unwrap();
        clock.advance_secs(299);
        lookup.check([BAD]).await.unwrap();
        assert_eq!(client.calls(), 1);

        clock.advance_secs(1);
        let result = lookup.check([BAD]).await.unwrap();
        assert_eq!(result.queried, 1);
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_end_to_end_single_remote_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "matches": [{
                    "threatType": "SOCIAL_ENGINEERING",
                    "platformType": "ANY_PLATFORM",
                    "threatEntryType": "URL",
                    "threat": {"url": BAD},
                    "cacheDuration": "300.000s"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let lookup = LookupOrchestrator::new(config().with_endpoint(server.uri())).unwrap();

        let first = lookup.check([BAD]).await.unwrap();
        let second = lookup.check([BAD]).await.unwrap();

        assert_eq!(first.matches, second.matches);
        assert_eq!(second.matches[0].threat_type.as_deref(), Some("SOCIAL_ENGINEERING"));
        // MockServer verifies `.expect(1)` on drop.
    }

    #[tokio::test]
    async fn test_end_to_end_server_error_returns_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let lookup = LookupOrchestrator::new(config().with_endpoint(server.uri())).unwrap();

        assert!(lookup.check([BAD]).await.is_none());
        assert!(lookup.cache().is_empty());
    }
}
