//! Fake threat clients shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use sbguard_core::error::{Result, SbError};
use sbguard_core::traits::ThreatClient;
use sbguard_core::types::{FindThreatMatchesRequest, FindThreatMatchesResponse, ThreatMatch};

/// Answers from a fixed set of known-bad matches and records every request.
pub struct FakeClient {
    known: Vec<ThreatMatch>,
    fail: bool,
    calls: AtomicUsize,
    requests: Mutex<Vec<FindThreatMatchesRequest>>,
}

impl FakeClient {
    pub fn with_matches(known: Vec<ThreatMatch>) -> Self {
        Self {
            known,
            fail: false,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::with_matches(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<FindThreatMatchesRequest> {
        self.requests.lock().last().cloned()
    }
}

#[async_trait]
impl ThreatClient for FakeClient {
    async fn find_threat_matches(
        &self,
        request: &FindThreatMatchesRequest,
    ) -> Result<FindThreatMatchesResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        if self.fail {
            return Err(SbError::HttpError("connection refused".into()));
        }

        let matches = request
            .urls()
            .filter_map(|url| self.known.iter().find(|m| m.url() == url).cloned())
            .collect();
        Ok(FindThreatMatchesResponse { matches })
    }
}

pub fn malware(url: &str, cache_duration: Option<&str>) -> ThreatMatch {
    let m = ThreatMatch::new(url).with_threat_type("MALWARE");
    match cache_duration {
        Some(d) => m.with_cache_duration(d),
        None => m,
    }
}
