//! Common traits for SBGUARD.
//!
//! These traits define the seams between the lookup orchestrator and its
//! collaborators, so tests can swap in counting or failing fakes.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{FindThreatMatchesRequest, FindThreatMatchesResponse};

// ═══════════════════════════════════════════════════════════════════════════════
// REMOTE THREAT CLIENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface to the remote threat-matching service.
///
/// Implementations own endpoint, credentials and timeout. Every transport
/// problem (connect error, timeout, non-2xx, undecodable body) must come back
/// as an `Err` rather than a panic.
#[async_trait]
pub trait ThreatClient: Send + Sync {
    /// Sends one batched lookup.
    async fn find_threat_matches(
        &self,
        request: &FindThreatMatchesRequest,
    ) -> Result<FindThreatMatchesResponse>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// URL EXTRACTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Pulls candidate URLs out of decoded message text.
pub trait UrlExtractor: Send + Sync {
    /// Returns the distinct URLs found across all text parts.
    fn extract_urls(&self, text_parts: &[String]) -> BTreeSet<String>;
}
