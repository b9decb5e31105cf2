//! Cache-duration parsing.

use std::sync::LazyLock;

use regex::Regex;

/// `<digits>[.<digits>]s`, anchored at the start.
static CACHE_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+)(?:\.\d+)?s").expect("Invalid regex pattern for cache duration")
});

/// Converts a server cache duration such as `"300.000s"` to whole seconds.
///
/// The fraction is truncated. Returns 0, meaning "do not cache", for absent
/// or empty input, a missing `s` suffix, or a value that overflows.
pub fn parse_cache_duration(duration: Option<&str>) -> i64 {
    let Some(duration) = duration.filter(|d| !d.is_empty()) else {
        return 0;
    };

    CACHE_DURATION
        .captures(duration)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0)
}
