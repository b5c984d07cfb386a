#![allow(dead_code)]

use std::sync::OnceLock;

use anyhow::{Context, Result};
use rest_api_probe::config::HarnessConfig;
use rest_api_probe::testing::stub::{StubApi, StubConfig};
use rest_api_probe::testing::Suite;

static SUITE: OnceLock<Suite> = OnceLock::new();

/// Suite configured from the environment, built once per test binary.
/// Live tests go through this one.
pub fn suite() -> &'static Suite {
    SUITE.get_or_init(|| Suite::acquire().expect("failed to acquire test suite"))
}

/// Stub server plus a suite pointed at it. Each test gets its own pair so
/// quotas and recorded headers never leak between tests.
pub async fn stubbed(config: StubConfig) -> Result<(StubApi, Suite)> {
    rest_api_probe::init_tracing();
    let stub = StubApi::start(config).await?;
    let harness_config = HarnessConfig::default().with_base_url(stub.base_url());
    let suite = Suite::with_config(harness_config).context("failed to build stubbed suite")?;
    Ok((stub, suite))
}

/// True (and logged) when live tests are switched off
pub fn live_disabled() -> bool {
    if suite().config().live {
        return false;
    }
    eprintln!("skipping live test: set PROBE_LIVE=true to run against {}", suite().base_url());
    true
}
