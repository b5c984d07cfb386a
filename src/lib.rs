pub mod assertions;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod names;
pub mod testing;

pub use assertions::{AssertionFailure, AssertionResult, Expect, Verdict};
pub use error::{HarnessError, ParseError, TransportError};
pub use http::{parse_as_object, Harness, RateLimit, Request, Response};

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber once; later calls are no-ops.
/// Honors `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
