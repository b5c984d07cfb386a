use reqwest::Method;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::request::Request;
use super::response::Response;
use crate::config::HarnessConfig;
use crate::error::{HarnessError, TransportError};

/// Issues requests and hands back whatever the server answered.
///
/// Cloning is cheap and shares the underlying client. Idle connections are
/// never pooled, so each `execute` opens its own connection and a harness can
/// be shared between tests that run on different runtimes.
#[derive(Debug, Clone)]
pub struct Harness {
    client: reqwest::Client,
    timeout: Duration,
}

impl Harness {
    pub fn new(config: &HarnessConfig) -> Result<Self, HarnessError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .pool_max_idle_per_host(0)
            // 3xx is an answer like any other status; hand it back untouched
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| HarnessError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Perform one GET round trip.
    ///
    /// Any status code the server sends back, 4xx and 5xx included, is a
    /// successful execution. Only failing to complete the exchange (DNS,
    /// refused connection, timeout, broken body) is reported as
    /// `HarnessError::Transport`. Nothing is retried.
    pub async fn execute(&self, request: &Request) -> Result<Response, HarnessError> {
        if request.method != Method::GET {
            return Err(HarnessError::UnsupportedMethod(request.method.to_string()));
        }

        let timeout = request.timeout.unwrap_or(self.timeout);
        let url = request.url.as_str();

        let mut req_builder = self.client.request(Method::GET, request.url.clone()).timeout(timeout);
        for (name, value) in &request.headers {
            req_builder = req_builder.header(name.clone(), value.clone());
        }

        let started = Instant::now();
        let response = req_builder.send().await.map_err(|e| {
            let err = TransportError::from_reqwest(&e, url, timeout);
            debug!(url, error = %err, "request failed");
            err
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let final_url = response.url().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(&e, url, timeout))?;
        let elapsed = started.elapsed();

        debug!(
            method = %request.method,
            url,
            status = status.as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            size_bytes = body.len(),
            "request completed"
        );

        let response = Response::new(status, headers, body.to_vec(), final_url, elapsed);
        if response.is_rate_limited() {
            match response.rate_limit() {
                Some(rate) => warn!(url, status = status.as_u16(), %rate, "remote API is rate limiting"),
                None => warn!(url, status = status.as_u16(), "remote API is rate limiting"),
            }
        }

        Ok(response)
    }
}
