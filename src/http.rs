//! Shared HTTP plumbing.
//!
//! All network calls are blocking and carry the same per-request timeout.
//! Default headers are fixed; caller-supplied headers merge over them with
//! the caller winning per key (case-insensitive).

use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::Duration;

/// Default HTTP timeout in seconds
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Default `User-Agent` for plain URL fetches. Some upstream mirrors refuse
/// requests without a browser-looking agent string.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.5 Safari/605.1.15";

/// Get HTTP timeout from environment variable or use default.
/// Cached for performance (only reads env var once).
pub fn http_timeout() -> Duration {
    static TIMEOUT: OnceLock<Duration> = OnceLock::new();
    *TIMEOUT.get_or_init(|| {
        let secs = std::env::var("PKGGEN_HTTP_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        // Clamp to reasonable range (5-300 seconds)
        Duration::from_secs(secs.clamp(5, 300))
    })
}

/// Merge caller-supplied headers over a fixed default set.
///
/// A default is dropped when an override carries the same key, compared
/// case-insensitively. Override order is preserved after the defaults.
pub fn merge_headers(
    defaults: &[(&str, &str)],
    overrides: &BTreeMap<String, String>,
) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = defaults
        .iter()
        .filter(|(key, _)| !overrides.keys().any(|o| o.eq_ignore_ascii_case(key)))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Build a GET request with the shared timeout and a prepared header list.
pub fn get(url: &str, headers: &[(String, String)]) -> ureq::Request {
    let mut request = ureq::get(url).timeout(http_timeout());
    for (key, value) in headers {
        request = request.set(key, value);
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_in_clamped_range() {
        let timeout = http_timeout();
        assert!(timeout.as_secs() >= 5);
        assert!(timeout.as_secs() <= 300);
    }

    #[test]
    fn test_merge_headers_defaults_kept() {
        let merged = merge_headers(&[("Accept", "application/json")], &BTreeMap::new());
        assert_eq!(
            merged,
            vec![("Accept".to_string(), "application/json".to_string())]
        );
    }

    #[test]
    fn test_merge_headers_caller_wins() {
        let mut overrides = BTreeMap::new();
        overrides.insert("User-Agent".to_string(), "custom".to_string());

        let merged = merge_headers(&[("User-Agent", DEFAULT_USER_AGENT)], &overrides);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].1, "custom");
    }

    #[test]
    fn test_merge_headers_case_insensitive_override() {
        let mut overrides = BTreeMap::new();
        overrides.insert("user-agent".to_string(), "custom".to_string());

        let merged = merge_headers(&[("User-Agent", DEFAULT_USER_AGENT)], &overrides);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].0, "user-agent");
        assert_eq!(merged[0].1, "custom");
    }

    #[test]
    fn test_merge_headers_extra_override_appended() {
        let mut overrides = BTreeMap::new();
        overrides.insert("Authorization".to_string(), "Bearer t".to_string());

        let merged = merge_headers(&[("Accept", "application/json")], &overrides);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].0, "Accept");
        assert_eq!(merged[1].0, "Authorization");
    }
}
