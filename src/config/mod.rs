use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Root of the REST API, e.g. `https://api.github.com`
    pub base_url: String,
    /// Login that is expected to exist on the remote side
    pub known_user: String,
    pub timeout: Duration,
    pub user_agent: String,
    /// Default `Accept` header for suite-built requests. None sends no header.
    pub accept: Option<String>,
    pub absent_name_len: usize,
    pub name_seed: Option<u64>,
    /// Run the tests that talk to the real API
    pub live: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            known_user: "alexander-wiltz".to_string(),
            timeout: Duration::from_secs(10),
            user_agent: format!("rest-api-probe/{}", env!("CARGO_PKG_VERSION")),
            accept: None,
            absent_name_len: 8,
            name_seed: None,
            live: false,
        }
    }
}

impl HarnessConfig {
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from any key lookup. Values that fail to parse keep the
    /// current setting.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PROBE_BASE_URL") {
            let v = v.trim();
            if !v.is_empty() {
                self.base_url = v.to_string();
            }
        }
        if let Some(v) = lookup("PROBE_KNOWN_USER") {
            let v = v.trim();
            if !v.is_empty() {
                self.known_user = v.to_string();
            }
        }
        if let Some(v) = lookup("PROBE_TIMEOUT_SECS") {
            if let Ok(secs) = v.trim().parse::<u64>() {
                self.timeout = Duration::from_secs(secs);
            }
        }
        if let Some(v) = lookup("PROBE_USER_AGENT") {
            let v = v.trim();
            if !v.is_empty() {
                self.user_agent = v.to_string();
            }
        }
        if let Some(v) = lookup("PROBE_ACCEPT") {
            let v = v.trim();
            self.accept = if v.is_empty() { None } else { Some(v.to_string()) };
        }
        if let Some(v) = lookup("PROBE_ABSENT_NAME_LEN") {
            self.absent_name_len = v.trim().parse().unwrap_or(self.absent_name_len);
        }
        if let Some(v) = lookup("PROBE_NAME_SEED") {
            self.name_seed = v.trim().parse().ok();
        }
        if let Some(v) = lookup("PROBE_LIVE") {
            self.live = v.trim().parse().unwrap_or(self.live);
        }

        self
    }

    /// Point the config at another API root, keeping everything else
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// Global singleton config - read once on first access
pub static CONFIG: Lazy<HarnessConfig> = Lazy::new(HarnessConfig::from_env);

pub fn config() -> &'static HarnessConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.base_url, "https://api.github.com");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.absent_name_len, 8);
        assert!(config.accept.is_none());
        assert!(!config.live);
        assert!(config.user_agent.starts_with("rest-api-probe/"));
    }

    #[test]
    fn test_overrides_applied() {
        let config = HarnessConfig::default().with_overrides(lookup_from(&[
            ("PROBE_BASE_URL", "http://127.0.0.1:9000"),
            ("PROBE_TIMEOUT_SECS", "3"),
            ("PROBE_ACCEPT", "application/vnd.github+json"),
            ("PROBE_NAME_SEED", "42"),
            ("PROBE_LIVE", "true"),
        ]));
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.accept.as_deref(), Some("application/vnd.github+json"));
        assert_eq!(config.name_seed, Some(42));
        assert!(config.live);
    }

    #[test]
    fn test_global_config_is_read_once() {
        let first = config();
        let second = config();
        assert!(std::ptr::eq(first, second));
        assert!(!first.base_url.is_empty());
    }

    #[test]
    fn test_bad_values_keep_defaults() {
        let config = HarnessConfig::default().with_overrides(lookup_from(&[
            ("PROBE_TIMEOUT_SECS", "soon"),
            ("PROBE_ABSENT_NAME_LEN", "-1"),
            ("PROBE_LIVE", "yes please"),
            ("PROBE_KNOWN_USER", "   "),
        ]));
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.absent_name_len, 8);
        assert!(!config.live);
        assert_eq!(config.known_user, "alexander-wiltz");
    }
}
