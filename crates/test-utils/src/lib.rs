//! Shared helpers for kristy's integration tests.
//!
//! - [`fakes`]: scripted runner, monitor and alerter.
//! - [`builders`]: job specs and orchestrators wired to the fakes.

pub mod builders;
pub mod fakes;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
///
/// Output only shows for failing tests (or with `--nocapture`); set
/// `KRISTY_LOG=debug` to see more.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("KRISTY_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(false)
            .try_init();
    });
}

/// Fail the test if `f` has not finished within ten seconds.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(10), f)
        .await
        .expect("test timed out after 10 seconds")
}
