pub mod stub;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use tracing::info;
use url::Url;

use crate::config::HarnessConfig;
use crate::endpoints;
use crate::error::HarnessError;
use crate::http::{Harness, Request, Response};
use crate::names::NameGenerator;

/// Test utilities scoped to one suite run: a single harness, the resolved
/// config and a seeded name generator.
pub struct Suite {
    config: HarnessConfig,
    base_url: Url,
    harness: Harness,
    names: Mutex<NameGenerator>,
    executed: AtomicUsize,
    started: Instant,
}

impl Suite {
    /// Load `.env`, read the process-wide config, start tracing and build
    /// the harness. `.env` must be loaded before the config is first read.
    pub fn acquire() -> Result<Self, HarnessError> {
        let _ = dotenvy::dotenv();
        let config = crate::config::config().clone();
        crate::init_tracing();
        Self::with_config(config)
    }

    pub fn with_config(config: HarnessConfig) -> Result<Self, HarnessError> {
        let base_url = endpoints::parse_base(&config.base_url)?;
        let harness = Harness::new(&config)?;
        let names = match config.name_seed {
            Some(seed) => NameGenerator::seeded(seed),
            None => NameGenerator::from_entropy(),
        };

        info!(
            base_url = %base_url,
            timeout_ms = config.timeout.as_millis() as u64,
            name_seed = names.seed(),
            live = config.live,
            "test suite acquired"
        );

        Ok(Self {
            config,
            base_url,
            harness,
            names: Mutex::new(names),
            executed: AtomicUsize::new(0),
            started: Instant::now(),
        })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn harness(&self) -> &Harness {
        &self.harness
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// A fresh random login that should not exist remotely
    pub fn absent_login(&self) -> String {
        let mut names = self.names.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        names.alphabetic(self.config.absent_name_len)
    }

    /// GET for the user lookup endpoint, with the configured default `Accept`
    pub fn user_request(&self, login: &str) -> Result<Request, HarnessError> {
        let request = Request::from_url(endpoints::user_url(&self.base_url, login)?)?;
        match &self.config.accept {
            Some(accept) => request.accept(accept),
            None => Ok(request),
        }
    }

    pub async fn execute(&self, request: &Request) -> Result<Response, HarnessError> {
        self.executed.fetch_add(1, Ordering::Relaxed);
        self.harness.execute(request).await
    }

    pub fn executed(&self) -> usize {
        self.executed.load(Ordering::Relaxed)
    }

    /// End of the suite; drops the client and its connections
    pub fn release(self) {
        info!(
            requests = self.executed(),
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "test suite released"
        );
    }
}
