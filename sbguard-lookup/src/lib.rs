//! # SBGUARD Lookup
//!
//! Checks message URLs against Safe Browsing, answering from a verdict cache
//! where it can and querying the remote service for the rest.
//!
//! ```rust,ignore
//! let config = SafebrowsingConfig::from_env()?;
//! let lookup = LookupOrchestrator::new(config)?;
//!
//! if let Some(result) = lookup.check(["http://malware.test/"]).await {
//!     for m in &result.matches {
//!         println!("{} {:?}", m.url(), m.threat_type);
//!     }
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod duration;
mod examiner;
mod orchestrator;

#[cfg(test)]
mod test_support;

pub use duration::parse_cache_duration;
pub use examiner::MessageExaminer;
pub use orchestrator::{LookupOrchestrator, LookupOutcome, LookupResult, SkipReason};
