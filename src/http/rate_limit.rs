use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const USED_HEADER: &str = "x-ratelimit-used";
pub const RESET_HEADER: &str = "x-ratelimit-reset";
pub const RESOURCE_HEADER: &str = "x-ratelimit-resource";

/// Quota state advertised by the remote API through `x-ratelimit-*` headers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
    pub used: Option<u32>,
    pub reset: Option<DateTime<Utc>>,
    pub resource: Option<String>,
}

impl RateLimit {
    /// None when the response carries no rate-limit headers at all.
    /// Malformed values are dropped individually.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let present = [LIMIT_HEADER, REMAINING_HEADER, USED_HEADER, RESET_HEADER, RESOURCE_HEADER]
            .iter()
            .any(|name| headers.contains_key(*name));
        if !present {
            return None;
        }

        Some(Self {
            limit: number(headers, LIMIT_HEADER),
            remaining: number(headers, REMAINING_HEADER),
            used: number(headers, USED_HEADER),
            reset: headers
                .get(RESET_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<i64>().ok())
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
            resource: headers
                .get(RESOURCE_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string()),
        })
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }
}

impl std::fmt::Display for RateLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let show = |v: Option<u32>| v.map_or_else(|| "?".to_string(), |n| n.to_string());
        write!(f, "{}/{} remaining", show(self.remaining), show(self.limit))?;
        if let Some(resource) = &self.resource {
            write!(f, " ({resource})")?;
        }
        if let Some(reset) = self.reset {
            write!(f, ", resets at {}", reset.to_rfc3339())?;
        }
        Ok(())
    }
}

fn number(headers: &HeaderMap, name: &str) -> Option<u32> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
