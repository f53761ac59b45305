//! HTTP 429 handling for the Spotify Web API
//!
//! Spotify answers bursts with `429 Too Many Requests` and a `Retry-After`
//! header. The client waits the advertised time and resends, up to
//! [`RetryPolicy::max_retries`] times. Throttling never triggers a token
//! refresh.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use tracing::warn;

use tracknet_core::config::RateLimitingConfig;

/// Longest wait honoured for a single `Retry-After`
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// How many 429 responses to absorb, and how long to wait by default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    /// Wait used when the header is missing or unparseable
    pub default_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            default_retry_after: Duration::from_secs(30),
        }
    }
}

impl From<&RateLimitingConfig> for RetryPolicy {
    fn from(config: &RateLimitingConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            default_retry_after: Duration::from_secs(config.default_retry_after_secs),
        }
    }
}

impl RetryPolicy {
    /// Wait advertised by a 429 response
    pub fn retry_after(&self, headers: &HeaderMap) -> Duration {
        headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(|v| parse_retry_after(v, self.default_retry_after))
            .unwrap_or(self.default_retry_after)
    }
}

/// Parses the value of a `Retry-After` header into a [`Duration`].
///
/// The header can be either:
/// - An integer number of seconds (e.g., "30")
/// - An HTTP-date (e.g., "Fri, 31 Dec 2025 23:59:59 GMT") - parsed as seconds from now
///
/// Values above [`MAX_RETRY_AFTER`] are clamped. Falls back to the default
/// duration if parsing fails.
pub fn parse_retry_after(value: &str, default: Duration) -> Duration {
    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Duration::from_secs(seconds).min(MAX_RETRY_AFTER);
    }

    if let Ok(date) = chrono::DateTime::parse_from_rfc2822(value.trim()) {
        let now = chrono::Utc::now();
        let target = date.with_timezone(&chrono::Utc);
        let secs: u64 = (target - now).num_seconds().max(0).try_into().unwrap_or(0);
        return Duration::from_secs(secs).min(MAX_RETRY_AFTER);
    }

    warn!(value, "Could not parse Retry-After header, using default");
    default
}
