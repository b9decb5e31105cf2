//! Message-level entry point for the mail host.

use tracing::{debug, info, instrument};

use sbguard_core::action::Action;
use sbguard_core::config::{LintIssue, SafebrowsingConfig};
use sbguard_core::error::Result;
use sbguard_core::traits::UrlExtractor;
use sbguard_extract::{decoded_text_parts, MessagePart, RegexUrlExtractor};

use crate::orchestrator::LookupOrchestrator;

/// Scans a message's URLs and maps a positive lookup to the configured action.
pub struct MessageExaminer {
    lookup: LookupOrchestrator,
    extractor: Box<dyn UrlExtractor>,
}

impl MessageExaminer {
    /// Creates an examiner with the default extractor and HTTP client.
    pub fn new(config: SafebrowsingConfig) -> Result<Self> {
        Ok(Self::with_parts(
            LookupOrchestrator::new(config)?,
            Box::new(RegexUrlExtractor::new()),
        ))
    }

    /// Creates an examiner from existing components.
    pub fn with_parts(lookup: LookupOrchestrator, extractor: Box<dyn UrlExtractor>) -> Self {
        Self { lookup, extractor }
    }

    /// The underlying lookup.
    pub fn lookup(&self) -> &LookupOrchestrator {
        &self.lookup
    }

    /// Returns the action for a message.
    ///
    /// `Dunno` unless at least one URL is flagged, in which case the
    /// configured action is returned.
    #[instrument(skip_all, fields(parts = parts.len()))]
    pub async fn examine(&self, parts: &[MessagePart]) -> Action {
        let texts = decoded_text_parts(parts);
        let urls = self.extractor.extract_urls(&texts);
        if urls.is_empty() {
            debug!("No URLs found");
            return Action::Dunno;
        }

        info!(urls = urls.len(), "Checking URLs against Safe Browsing");
        match self.lookup.check(&urls).await {
            Some(result) if !result.is_empty() => {
                info!(matches = result.len(), "Safe Browsing reported threats");
                self.lookup.config().action
            }
            _ => Action::Dunno,
        }
    }

    /// Reports configuration problems.
    pub fn lint(&self) -> Vec<LintIssue> {
        self.lookup.config().lint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::test_support::{malware, FakeClient};

    const BAD: &str = "http://malware.test/landing";

    fn examiner(client: Arc<FakeClient>, action: Action) -> MessageExaminer {
        let config = SafebrowsingConfig::new("test-key").with_action(action);
        MessageExaminer::with_parts(
            LookupOrchestrator::with_client(config, client),
            Box::new(RegexUrlExtractor::new()),
        )
    }

    #[tokio::test]
    async fn test_match_returns_configured_action() {
        let client = Arc::new(FakeClient::with_matches(vec![malware(BAD, Some("60s"))]));
        let examiner = examiner(client.clone(), Action::Reject);
        let parts = [MessagePart::new("text/plain", format!("click {BAD} now"))];

        assert_eq!(examiner.examine(&parts).await, Action::Reject);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_clean_message_is_dunno() {
        let client = Arc::new(FakeClient::with_matches(vec![]));
        let examiner = examiner(client.clone(), Action::Reject);
        let parts = [MessagePart::new("text/plain", "see http://clean.test/")];

        assert_eq!(examiner.examine(&parts).await, Action::Dunno);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_no_urls_skips_lookup() {
        let client = Arc::new(FakeClient::with_matches(vec![]));
        let examiner = examiner(client.clone(), Action::Reject);
        let parts = [MessagePart::new("text/plain", "just words")];

        assert_eq!(examiner.examine(&parts).await, Action::Dunno);
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_wrapped_html_url_is_found() {
        let client = Arc::new(FakeClient::with_matches(vec![malware(BAD, None)]));
        let examiner = examiner(client, Action::Delete);
        let parts = [MessagePart::new(
            "text/html",
            "<a href=\"http://malware.test/\nlanding\">offer</a>",
        )];

        assert_eq!(examiner.examine(&parts).await, Action::Delete);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_dunno() {
        let examiner = examiner(Arc::new(FakeClient::failing()), Action::Reject);
        let parts = [MessagePart::new("text/plain", BAD)];

        assert_eq!(examiner.examine(&parts).await, Action::Dunno);
    }

    #[test]
    fn test_lint_reports_missing_key() {
        let examiner = MessageExaminer::new(SafebrowsingConfig::default()).unwrap();
        assert_eq!(examiner.lint(), vec![LintIssue::MissingApiKey]);
    }
}
