//! # Response assertions
//!
//! Checks a `Response` against expectations and reports every mismatch at
//! once, along with the raw status and headers so a failing test explains
//! itself without a rerun.
//!
//! ```ignore
//! Expect::new(&response)
//!     .status(StatusCode::OK)
//!     .header("content-type", "application/json; charset=utf-8")
//!     .json_object()
//!     .verify()?;
//! ```

use reqwest::StatusCode;
use std::fmt;

use crate::http::{RateLimit, Response};

/// Property of the response being checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    Status,
    Header(String),
    JsonObject,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::Status => write!(f, "status"),
            Check::Header(name) => write!(f, "header `{name}`"),
            Check::JsonObject => write!(f, "body is a JSON object"),
        }
    }
}

/// Result of evaluating one check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResult {
    pub check: Check,
    pub passed: bool,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for AssertionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.passed { "ok" } else { "FAILED" };
        write!(
            f,
            "{} [{}]: expected {}, got {}",
            self.check, mark, self.expected, self.actual
        )
    }
}

/// One or more checks did not hold. Carries the raw exchange for diagnosis.
#[derive(Debug, Clone)]
pub struct AssertionFailure {
    pub failures: Vec<AssertionResult>,
    pub url: String,
    pub status: StatusCode,
    pub headers: String,
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} assertion(s) failed for GET {}", self.failures.len(), self.url)?;
        for failure in &self.failures {
            writeln!(f, "  {failure}")?;
        }
        writeln!(f, "  status: {}", self.status)?;
        write!(f, "  headers:")?;
        for line in self.headers.lines() {
            write!(f, "\n    {line}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AssertionFailure {}

/// Overall judgement of a response
#[derive(Debug, Clone)]
pub enum Verdict {
    Passed(Vec<AssertionResult>),
    Failed(AssertionFailure),
    /// Remote side is throttling; the checks say nothing about correctness
    Inconclusive(RateLimit),
}

impl Verdict {
    pub fn is_passed(&self) -> bool {
        matches!(self, Verdict::Passed(_))
    }

    pub fn is_inconclusive(&self) -> bool {
        matches!(self, Verdict::Inconclusive(_))
    }
}

/// Builder collecting checks against a single response
#[derive(Debug)]
pub struct Expect<'a> {
    response: &'a Response,
    results: Vec<AssertionResult>,
    expects_throttling: bool,
}

impl<'a> Expect<'a> {
    pub fn new(response: &'a Response) -> Self {
        Self {
            response,
            results: Vec::new(),
            expects_throttling: false,
        }
    }

    pub fn status(mut self, expected: StatusCode) -> Self {
        let actual = self.response.status();
        if expected == StatusCode::FORBIDDEN || expected == StatusCode::TOO_MANY_REQUESTS {
            self.expects_throttling = true;
        }
        self.results.push(AssertionResult {
            check: Check::Status,
            passed: actual == expected,
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
        self
    }

    /// Exact, case-sensitive comparison of the header value
    pub fn header(mut self, name: &str, expected: &str) -> Self {
        let actual = self.response.header(name);
        self.results.push(AssertionResult {
            check: Check::Header(name.to_ascii_lowercase()),
            passed: actual == Some(expected),
            expected: format!("{expected:?}"),
            actual: actual.map_or_else(|| "<missing>".to_string(), |v| format!("{v:?}")),
        });
        self
    }

    pub fn json_object(mut self) -> Self {
        let (passed, actual) = match self.response.json_object() {
            Ok(map) => (true, format!("an object with {} key(s)", map.len())),
            Err(e) => (false, e.to_string()),
        };
        self.results.push(AssertionResult {
            check: Check::JsonObject,
            passed,
            expected: "a JSON object".to_string(),
            actual,
        });
        self
    }

    pub fn results(&self) -> &[AssertionResult] {
        &self.results
    }

    /// Pass only if every check held
    pub fn verify(self) -> Result<Vec<AssertionResult>, AssertionFailure> {
        let failures: Vec<AssertionResult> = self.results.iter().filter(|r| !r.passed).cloned().collect();
        if failures.is_empty() {
            return Ok(self.results);
        }

        Err(AssertionFailure {
            failures,
            url: self.response.url().to_string(),
            status: self.response.status(),
            headers: self.response.format_headers(),
        })
    }

    /// Like `verify`, but a rate-limited response is inconclusive unless a
    /// check explicitly expects 403 or 429.
    pub fn evaluate(self) -> Verdict {
        if !self.expects_throttling && self.response.is_rate_limited() {
            return Verdict::Inconclusive(self.response.rate_limit().unwrap_or_default());
        }

        match self.verify() {
            Ok(results) => Verdict::Passed(results),
            Err(failure) => Verdict::Failed(failure),
        }
    }
}
