//! Session configuration.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default lifetime for cached responses (5 minutes).
pub const DEFAULT_CACHE_AGE: Duration = Duration::from_secs(300);

/// Default attempt ceiling for transport errors.
pub const DEFAULT_RETRY_COUNT: NonZeroU32 = match NonZeroU32::new(5) {
    Some(count) => count,
    None => unreachable!(),
};

/// Per-instance session configuration.
///
/// Every session carries its own copy; there are no process-wide
/// defaults. Durations deserialize from humantime strings (`"5m"`,
/// `"300s"`).
///
/// ```
/// use websession::SessionConfig;
///
/// let config: SessionConfig = serde_json::from_str(
///     r#"{ "cache_age": "1m", "retry_count": 3 }"#,
/// ).unwrap();
/// assert_eq!(config.cache_age.as_secs(), 60);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long cached responses stay fresh. Ignored when the session has
    /// no cache store.
    #[serde(with = "humantime_serde")]
    pub cache_age: Duration,

    /// Maximum number of times a request is sent when transport errors
    /// occur. HTTP error statuses never consume retries.
    pub retry_count: NonZeroU32,

    /// Header fields added to every outgoing request. Per-request headers
    /// win on conflict. These never participate in request identity.
    pub additional_headers: HashMap<String, String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            cache_age: DEFAULT_CACHE_AGE,
            retry_count: DEFAULT_RETRY_COUNT,
            additional_headers: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = SessionConfig::default();
        assert_eq!(config.cache_age, Duration::from_secs(300));
        assert_eq!(config.retry_count.get(), 5);
        assert!(config.additional_headers.is_empty());
    }

    #[test]
    fn empty_document_deserializes_to_defaults() {
        let config: SessionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.cache_age, DEFAULT_CACHE_AGE);
        assert_eq!(config.retry_count, DEFAULT_RETRY_COUNT);
    }

    #[test]
    fn humantime_durations_parse() {
        let config: SessionConfig = serde_json::from_str(
            r#"{ "cache_age": "90s", "retry_count": 2, "additional_headers": { "X-App": "1" } }"#,
        )
        .unwrap();
        assert_eq!(config.cache_age, Duration::from_secs(90));
        assert_eq!(config.retry_count.get(), 2);
        assert_eq!(config.additional_headers["X-App"], "1");
    }
}
