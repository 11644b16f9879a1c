// src/notify/mod.rs

//! Delivery of start/status pings and fallback alerts.
//!
//! - [`healthchecks`] talks to the monitoring ("dead man's switch") service.
//! - [`slack`] posts to a chat webhook when the monitor could not be told.
//!
//! The orchestrator only sees the [`Monitor`] and [`Alerter`] traits, so
//! tests can swap in fakes. Every call races the shared cancellation token;
//! a cancelled call fails with [`DeliveryError::Cancelled`].

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::Context;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub mod healthchecks;
pub mod slack;

pub use healthchecks::HealthchecksClient;
pub use slack::SlackClient;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("kristy/", env!("CARGO_PKG_VERSION"));

/// Why a notification did not reach its endpoint.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("unexpected status: {}{}", .0, reason_suffix(.0))]
    Status(u16),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("request cancelled")]
    Cancelled,
}

fn reason_suffix(code: &u16) -> String {
    reqwest::StatusCode::from_u16(*code)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(|r| format!(" {r}"))
        .unwrap_or_default()
}

pub type DeliveryFuture<'a> = Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send + 'a>>;

/// The monitoring endpoint for one job.
pub trait Monitor: Send + Sync {
    /// Signal that the job is about to run.
    fn start<'a>(&'a self, cancel: &'a CancellationToken) -> DeliveryFuture<'a>;

    /// Report the job's exit code together with a (truncated) output body.
    fn status<'a>(
        &'a self,
        exit_code: i32,
        body: Vec<u8>,
        cancel: &'a CancellationToken,
    ) -> DeliveryFuture<'a>;
}

/// Human-facing alert sent when monitoring delivery failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub text: String,
    pub title: String,
    pub output: String,
}

/// The fallback alert channel.
pub trait Alerter: Send + Sync {
    fn alert<'a>(&'a self, alert: &'a Alert, cancel: &'a CancellationToken) -> DeliveryFuture<'a>;
}

/// Build the HTTP client shared by all notification calls.
pub fn http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("building HTTP client")
}

/// Run a delivery future unless (or until) `cancel` fires.
pub(crate) async fn until_cancelled<F>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<(), DeliveryError>
where
    F: Future<Output = Result<(), DeliveryError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DeliveryError::Cancelled),
        res = fut => res,
    }
}

/// Map a response to `Ok` for 2xx and `DeliveryError::Status` otherwise.
pub(crate) fn check_status(res: &reqwest::Response) -> Result<(), DeliveryError> {
    let status = res.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(DeliveryError::Status(status.as_u16()))
    }
}
