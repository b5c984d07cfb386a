//! Local stand-in for the user lookup API.
//!
//! Answers `GET /users/:login` the way the real service does: 200 with a JSON
//! object for known logins, 404 otherwise, and 403 with an exhausted quota
//! once `rate_limit` requests have been served. Every JSON response carries
//! `Content-Type: application/json; charset=utf-8`. `/loop` answers 301
//! pointing at itself.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::json;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::debug;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

const DOCS_URL: &str = "https://docs.github.com/rest";

#[derive(Debug, Clone)]
pub struct StubConfig {
    /// Logins answered with 200, matched case-insensitively
    pub known_users: Vec<String>,
    /// Requests served before the quota is exhausted
    pub rate_limit: u32,
    /// Applied before every response
    pub delay: Option<Duration>,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            known_users: vec!["alexander-wiltz".to_string(), "octocat".to_string()],
            rate_limit: 60,
            delay: None,
        }
    }
}

impl StubConfig {
    pub fn with_users<I, S>(users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known_users: users.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn rate_limit(mut self, limit: u32) -> Self {
        self.rate_limit = limit;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

struct StubState {
    known_users: HashSet<String>,
    limit: u32,
    delay: Option<Duration>,
    used: AtomicU32,
    last_accept: Mutex<Option<String>>,
}

/// Running stub server. Aborted when dropped.
pub struct StubApi {
    addr: SocketAddr,
    state: Arc<StubState>,
    task: JoinHandle<()>,
}

impl StubApi {
    /// Bind an ephemeral port and serve on the current tokio runtime
    pub async fn start(config: StubConfig) -> Result<Self> {
        let state = Arc::new(StubState {
            known_users: config.known_users.iter().map(|u| u.to_ascii_lowercase()).collect(),
            limit: config.rate_limit,
            delay: config.delay,
            used: AtomicU32::new(0),
            last_accept: Mutex::new(None),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind stub listener")?;
        let addr = listener.local_addr().context("stub listener has no local address")?;

        let app = app(state.clone());
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("stub server stopped: {}", e);
            }
        });

        debug!(%addr, "stub API listening");
        Ok(Self { addr, state, task })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests that counted against the quota
    pub fn hits(&self) -> u32 {
        self.state.used.load(Ordering::SeqCst)
    }

    /// `Accept` header of the most recent request, if it had one
    pub fn last_accept(&self) -> Option<String> {
        self.state
            .last_accept
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Drop for StubApi {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn app(state: Arc<StubState>) -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:login", get(get_user))
        .route("/zen", get(zen))
        .route("/loop", get(redirect_loop))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn get_user(
    State(state): State<Arc<StubState>>,
    Path(login): Path<String>,
    headers: HeaderMap,
) -> Response {
    let quota = admit(&state, &headers).await;
    if quota.exhausted {
        return json_response(
            StatusCode::FORBIDDEN,
            &quota,
            json!({
                "message": "API rate limit exceeded for 127.0.0.1.",
                "documentation_url": format!("{DOCS_URL}/overview/resources-in-the-rest-api#rate-limiting"),
            }),
        );
    }

    if !state.known_users.contains(&login.to_ascii_lowercase()) {
        return json_response(
            StatusCode::NOT_FOUND,
            &quota,
            json!({
                "message": "Not Found",
                "documentation_url": format!("{DOCS_URL}/users/users#get-a-user"),
            }),
        );
    }

    json_response(StatusCode::OK, &quota, user_body(&login))
}

async fn list_users(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    let quota = admit(&state, &headers).await;
    let mut users: Vec<&String> = state.known_users.iter().collect();
    users.sort();
    let body: Vec<_> = users.into_iter().map(|login| user_body(login)).collect();
    json_response(StatusCode::OK, &quota, json!(body))
}

async fn zen(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    let quota = admit(&state, &headers).await;
    let mut response = (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain;charset=utf-8")],
        "Design for failure.",
    )
        .into_response();
    quota.apply(response.headers_mut());
    response
}

// Always points back at itself
async fn redirect_loop(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    let quota = admit(&state, &headers).await;
    let mut response = (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, "/loop")]).into_response();
    quota.apply(response.headers_mut());
    response
}

struct Quota {
    limit: u32,
    used: u32,
    exhausted: bool,
}

impl Quota {
    fn apply(&self, headers: &mut HeaderMap) {
        let remaining = self.limit.saturating_sub(self.used);
        let reset = chrono::Utc::now().timestamp() + 3600;
        let pairs = [
            ("x-ratelimit-limit", self.limit.to_string()),
            ("x-ratelimit-remaining", remaining.to_string()),
            ("x-ratelimit-used", self.used.min(self.limit).to_string()),
            ("x-ratelimit-reset", reset.to_string()),
            ("x-ratelimit-resource", "core".to_string()),
        ];
        for (name, value) in pairs {
            if let Ok(value) = HeaderValue::from_str(&value) {
                headers.insert(HeaderName::from_static(name), value);
            }
        }
    }
}

// Count the request against the quota and remember its Accept header
async fn admit(state: &StubState, headers: &HeaderMap) -> Quota {
    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }

    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *state.last_accept.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = accept;

    let used = state.used.fetch_add(1, Ordering::SeqCst) + 1;
    Quota {
        limit: state.limit,
        used,
        exhausted: used > state.limit,
    }
}

fn json_response(status: StatusCode, quota: &Quota, body: serde_json::Value) -> Response {
    let mut response = (
        status,
        [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)],
        body.to_string(),
    )
        .into_response();
    quota.apply(response.headers_mut());
    response
}

fn user_body(login: &str) -> serde_json::Value {
    json!({
        "login": login,
        "id": login.bytes().map(u64::from).sum::<u64>(),
        "type": "User",
        "site_admin": false,
        "url": format!("https://api.github.com/users/{login}"),
        "html_url": format!("https://github.com/{login}"),
        "public_repos": 0,
        "followers": 0,
        "following": 0,
    })
}
