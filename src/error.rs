// Harness error types
use std::time::Duration;
use thiserror::Error;

/// Everything that can go wrong before or during a round trip.
///
/// A completed exchange is never an error, whatever its status code. A 404 or
/// a 403 comes back as an `Ok(Response)` and is judged by the assertions layer.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Unsupported method: {0} (only GET is allowed)")]
    UnsupportedMethod(String),

    #[error("Invalid header `{name}`: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl HarnessError {
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        HarnessError::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_header(name: impl Into<String>, reason: impl Into<String>) -> Self {
        HarnessError::InvalidHeader {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// True when the network round trip itself failed
    pub fn is_transport(&self) -> bool {
        matches!(self, HarnessError::Transport(_))
    }

    /// Short machine-friendly code, handy in log fields
    pub fn error_code(&self) -> &'static str {
        match self {
            HarnessError::InvalidUrl { .. } => "INVALID_URL",
            HarnessError::UnsupportedMethod(_) => "UNSUPPORTED_METHOD",
            HarnessError::InvalidHeader { .. } => "INVALID_HEADER",
            HarnessError::ClientBuild(_) => "CLIENT_BUILD",
            HarnessError::Transport(e) => e.error_code(),
            HarnessError::Parse(_) => "PARSE_ERROR",
        }
    }
}

/// Network round trip could not be completed
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("Could not connect to {url}: {message}")]
    Connect { url: String, message: String },

    #[error("Failed to read response body from {url}: {message}")]
    Body { url: String, message: String },

    #[error("Request to {url} failed: {message}")]
    Other { url: String, message: String },
}

impl TransportError {
    /// Classify a reqwest failure. Timeouts win over connect errors so that a
    /// connect timeout is still reported as a timeout.
    pub fn from_reqwest(err: &reqwest::Error, url: &str, timeout: Duration) -> Self {
        let url = url.to_string();
        let message = error_chain(err);

        if err.is_timeout() {
            TransportError::Timeout { url, timeout }
        } else if err.is_connect() {
            TransportError::Connect { url, message }
        } else if err.is_body() || err.is_decode() {
            TransportError::Body { url, message }
        } else {
            TransportError::Other { url, message }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            TransportError::Timeout { .. } => "TRANSPORT_TIMEOUT",
            TransportError::Connect { .. } => "TRANSPORT_CONNECT",
            TransportError::Body { .. } => "TRANSPORT_BODY",
            TransportError::Other { .. } => "TRANSPORT_OTHER",
        }
    }
}

/// Body was expected to be a JSON object but is not
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Response body is not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("Expected a JSON object but found {0}")]
    NotAnObject(&'static str),
}

// reqwest hides the interesting part (dns, refused, tls) in the source chain
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !parts.contains(&text) {
            parts.push(text);
        }
        source = inner.source();
    }
    parts.join(": ")
}
