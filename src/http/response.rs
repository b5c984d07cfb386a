use reqwest::header::{HeaderMap, CONTENT_TYPE, RETRY_AFTER};
use reqwest::StatusCode;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::time::Duration;
use url::Url;

use super::rate_limit::RateLimit;
use crate::error::ParseError;

/// Outcome of one completed HTTP exchange. Built once by the harness and
/// only read afterwards.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    url: Url,
    elapsed: Duration,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>, url: Url, elapsed: Duration) -> Self {
        Self {
            status,
            headers,
            body,
            url,
            elapsed,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Case-insensitive header lookup. None for missing or non-visible-ASCII values.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// URL the request was sent to; redirects are not followed
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Parses the raw bytes, so a body that is not valid UTF-8 is rejected
    pub fn json_object(&self) -> Result<Map<String, Value>, ParseError> {
        into_object(serde_json::from_slice::<Value>(&self.body)?)
    }

    pub fn rate_limit(&self) -> Option<RateLimit> {
        RateLimit::from_headers(&self.headers)
    }

    /// 429, or 403 with an exhausted quota or a `Retry-After` hint
    pub fn is_rate_limited(&self) -> bool {
        match self.status {
            StatusCode::TOO_MANY_REQUESTS => true,
            StatusCode::FORBIDDEN => {
                self.headers.contains_key(RETRY_AFTER)
                    || self.rate_limit().map_or(false, |r| r.is_exhausted())
            }
            _ => false,
        }
    }

    /// One `name: value` line per header, for failure reports
    pub fn format_headers(&self) -> String {
        let mut lines = Vec::new();
        for (name, value) in &self.headers {
            let value = value.to_str().unwrap_or("<binary>");
            lines.push(format!("{name}: {value}"));
        }
        lines.join("\n")
    }
}

/// Parse a body as a JSON document that must be an object
pub fn parse_as_object(body: &str) -> Result<Map<String, Value>, ParseError> {
    into_object(serde_json::from_str::<Value>(body)?)
}

fn into_object(value: Value) -> Result<Map<String, Value>, ParseError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ParseError::NotAnObject(json_kind(&other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn response(status: StatusCode, headers: &[(&'static str, &'static str)], body: &str) -> Response {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(*name, HeaderValue::from_static(value));
        }
        Response::new(
            status,
            map,
            body.as_bytes().to_vec(),
            Url::parse("http://127.0.0.1/users/octocat").unwrap(),
            Duration::from_millis(5),
        )
    }

    #[test]
    fn test_parse_as_object() {
        let map = parse_as_object(r#"{"login": "octocat", "id": 1}"#).unwrap();
        assert_eq!(map["login"], "octocat");

        // whitespace and newlines around the document are fine
        assert!(parse_as_object("\n  {}\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_non_objects() {
        assert!(matches!(parse_as_object("[1, 2]"), Err(ParseError::NotAnObject("an array"))));
        assert!(matches!(parse_as_object("\"hi\""), Err(ParseError::NotAnObject("a string"))));
        assert!(matches!(parse_as_object("null"), Err(ParseError::NotAnObject("null"))));
        assert!(matches!(parse_as_object("{\"a\":"), Err(ParseError::Syntax(_))));
        assert!(matches!(parse_as_object("Design for failure."), Err(ParseError::Syntax(_))));
    }

    #[test]
    fn test_json_object_rejects_invalid_utf8() {
        let mut res = response(StatusCode::OK, &[], "");
        res.body = b"{\"a\":\"\xff\"}".to_vec();

        assert!(matches!(res.json_object(), Err(ParseError::Syntax(_))));
        // the lossy text view still shows something for diagnostics
        assert!(res.text().contains('\u{fffd}'));
    }

    #[test]
    fn test_json_object_matches_parse_as_object() {
        let res = response(StatusCode::OK, &[], "[]");
        assert!(matches!(res.json_object(), Err(ParseError::NotAnObject("an array"))));

        let res = response(StatusCode::OK, &[], r#" {"login": "octocat"} "#);
        assert_eq!(res.json_object().unwrap()["login"], "octocat");
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let res = response(
            StatusCode::OK,
            &[("content-type", "application/json; charset=utf-8")],
            "{}",
        );
        assert_eq!(res.header("Content-Type"), Some("application/json; charset=utf-8"));
        assert_eq!(res.content_type(), Some("application/json; charset=utf-8"));
        assert_eq!(res.header("x-missing"), None);
        assert_eq!(res.format_headers(), "content-type: application/json; charset=utf-8");
    }

    #[test]
    fn test_rate_limit_detection() {
        let exhausted = response(
            StatusCode::FORBIDDEN,
            &[("x-ratelimit-limit", "60"), ("x-ratelimit-remaining", "0")],
            r#"{"message": "API rate limit exceeded"}"#,
        );
        assert!(exhausted.is_rate_limited());

        let secondary = response(StatusCode::FORBIDDEN, &[("retry-after", "30")], "{}");
        assert!(secondary.is_rate_limited());

        let too_many = response(StatusCode::TOO_MANY_REQUESTS, &[], "");
        assert!(too_many.is_rate_limited());

        // a plain 403 is a permission problem, not throttling
        let forbidden = response(
            StatusCode::FORBIDDEN,
            &[("x-ratelimit-limit", "60"), ("x-ratelimit-remaining", "59")],
            "{}",
        );
        assert!(!forbidden.is_rate_limited());

        let not_found = response(StatusCode::NOT_FOUND, &[("x-ratelimit-remaining", "0")], "{}");
        assert!(!not_found.is_rate_limited());
    }
}
