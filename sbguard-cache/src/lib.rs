//! TTL cache for SBGUARD verdicts.
//!
//! Entries carry an absolute expiry and are evicted lazily, on read.
//! There is no size bound and no background sweep.

mod cache;
mod clock;

pub use cache::{CacheStats, VerdictCache};
pub use clock::{Clock, ManualClock, SystemClock};
