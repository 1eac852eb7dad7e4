use std::env;
use std::time::Duration;

use crate::state::IdentityHandle;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_RIOT_ID: &str = "Not Alet";
pub const DEFAULT_TAG_LINE: &str = "JCP";
pub const DEFAULT_REGION: &str = "las";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub api_base_url: String,
    pub identity: IdentityHandle,
    pub region: String,
    pub profile_timeout: Duration,
    pub history_timeout: Duration,
    pub live_timeout: Duration,
    pub live_poll_interval: Duration,
    pub match_count: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            identity: IdentityHandle::new(DEFAULT_RIOT_ID, DEFAULT_TAG_LINE),
            region: DEFAULT_REGION.to_string(),
            profile_timeout: Duration::from_millis(10_000),
            history_timeout: Duration::from_millis(10_000),
            live_timeout: Duration::from_millis(5_000),
            live_poll_interval: Duration::from_secs(30),
            match_count: 10,
        }
    }
}

impl SessionConfig {
    /// Reads overrides from the process environment, falling back to defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let text = |key: &str, default: String| {
            lookup(key)
                .map(|val| val.trim().to_string())
                .filter(|val| !val.is_empty())
                .unwrap_or(default)
        };
        let number = |key: &str| lookup(key).and_then(|val| val.trim().parse::<u64>().ok());
        let millis = |key: &str, default: Duration| {
            Duration::from_millis(
                number(key)
                    .unwrap_or(default.as_millis() as u64)
                    .clamp(500, 60_000),
            )
        };

        Self {
            api_base_url: text("API_BASE_URL", d.api_base_url)
                .trim_end_matches('/')
                .to_string(),
            identity: IdentityHandle::new(
                text("DEFAULT_RIOT_ID", d.identity.name),
                text("DEFAULT_TAG_LINE", d.identity.tag),
            ),
            region: text("DEFAULT_REGION", d.region).to_lowercase(),
            profile_timeout: millis("PROFILE_TIMEOUT_MS", d.profile_timeout),
            history_timeout: millis("HISTORY_TIMEOUT_MS", d.history_timeout),
            live_timeout: millis("LIVE_TIMEOUT_MS", d.live_timeout),
            live_poll_interval: Duration::from_secs(
                number("LIVE_POLL_SECS")
                    .unwrap_or(d.live_poll_interval.as_secs())
                    .max(5),
            ),
            match_count: number("MATCH_COUNT")
                .map(|n| n as usize)
                .unwrap_or(d.match_count)
                .clamp(1, 20),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_matches_defaults() {
        assert_eq!(SessionConfig::from_lookup(|_| None), SessionConfig::default());
    }

    #[test]
    fn overrides_are_clamped() {
        let cfg = SessionConfig::from_lookup(lookup(&[
            ("API_BASE_URL", "http://example.test/api/"),
            ("DEFAULT_REGION", "EUW"),
            ("PROFILE_TIMEOUT_MS", "5"),
            ("LIVE_POLL_SECS", "1"),
            ("MATCH_COUNT", "99"),
            ("LIVE_TIMEOUT_MS", "garbage"),
        ]));
        assert_eq!(cfg.api_base_url, "http://example.test/api");
        assert_eq!(cfg.region, "euw");
        assert_eq!(cfg.profile_timeout, Duration::from_millis(500));
        assert_eq!(cfg.live_poll_interval, Duration::from_secs(5));
        assert_eq!(cfg.match_count, 20);
        assert_eq!(cfg.live_timeout, Duration::from_millis(5_000));
    }

    #[test]
    fn blank_identity_keeps_default() {
        let cfg = SessionConfig::from_lookup(lookup(&[("DEFAULT_RIOT_ID", "  ")]));
        assert_eq!(cfg.identity, IdentityHandle::new("Not Alet", "JCP"));
    }
}
