use reqwest::header::{HeaderName, HeaderValue, ACCEPT};
use reqwest::Method;
use std::time::Duration;
use url::Url;

use crate::error::HarnessError;

/// A single outbound request. Only GET is executed; see `Harness::execute`.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(HeaderName, HeaderValue)>,
    /// Overrides the harness-wide timeout for this request only
    pub timeout: Option<Duration>,
}

impl Request {
    /// Build a GET request. The URL must be absolute http(s).
    pub fn get(url: impl AsRef<str>) -> Result<Self, HarnessError> {
        let raw = url.as_ref().trim();
        let url = Url::parse(raw).map_err(|e| HarnessError::invalid_url(raw, e.to_string()))?;
        Self::from_url(url)
    }

    pub fn from_url(url: Url) -> Result<Self, HarnessError> {
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(HarnessError::invalid_url(
                    url.as_str(),
                    format!("unsupported scheme `{other}`"),
                ))
            }
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(HarnessError::invalid_url(url.as_str(), "missing host"));
        }

        Ok(Self {
            method: Method::GET,
            url,
            headers: Vec::new(),
            timeout: None,
        })
    }

    pub fn header(mut self, name: &str, value: &str) -> Result<Self, HarnessError> {
        let name = name.trim();
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| HarnessError::invalid_header(name, e.to_string()))?;
        let header_value = HeaderValue::from_str(value.trim())
            .map_err(|e| HarnessError::invalid_header(name, e.to_string()))?;
        self.headers.push((header_name, header_value));
        Ok(self)
    }

    pub fn accept(self, value: &str) -> Result<Self, HarnessError> {
        self.header(ACCEPT.as_str(), value)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Change the method. Anything but GET is refused at execution time.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }
}
