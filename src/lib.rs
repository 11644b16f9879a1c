// src/lib.rs

pub mod capture;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod notify;
pub mod report;
pub mod types;

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::cli::CliArgs;
use crate::config::AppConfig;
use crate::engine::Orchestrator;
use crate::exec::ProcessRunner;
use crate::notify::{HealthchecksClient, SlackClient, http_client};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config resolution (file, env, flags)
/// - the HTTP clients for the monitor and the fallback alert
/// - the process runner and orchestrator
/// - Ctrl-C / SIGTERM handling
///
/// Returns the exit code the program should terminate with.
pub async fn run(args: CliArgs) -> Result<i32> {
    let cfg = config::resolve(
        args.config.as_deref(),
        args.overrides(),
        args.command.clone(),
    )?;
    debug!(
        job = %cfg.job.name,
        retries = cfg.job.retry.retries,
        timeout = ?cfg.timeout,
        ping_url = %cfg.ping_url,
        "resolved configuration"
    );

    let orchestrator = build_orchestrator(&cfg)?;

    let cancel = CancellationToken::new();
    spawn_shutdown_listener(cancel.clone());

    match orchestrator.run(&cancel).await {
        Ok(()) => Ok(0),
        Err(err) => {
            error!(failures = err.failures().len(), "run finished with errors");
            eprintln!("Error: {err}");
            Ok(err.exit_code())
        }
    }
}

/// Build an orchestrator with the real process runner and HTTP clients.
pub fn build_orchestrator(cfg: &AppConfig) -> Result<Orchestrator> {
    let http = http_client(cfg.timeout)?;
    let monitor = HealthchecksClient::new(http.clone(), &cfg.ping_url, &cfg.healthcheck);
    let alerter = SlackClient::new(http, &cfg.slack);
    let runner = ProcessRunner::new(cfg.capture.buffer_size);

    Ok(Orchestrator::new(
        cfg.job.clone(),
        Box::new(runner),
        Arc::new(monitor),
        Box::new(alerter),
    ))
}

/// Cancel `cancel` on Ctrl-C (and SIGTERM on unix).
fn spawn_shutdown_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        warn!("interrupt received; stopping command and pending notifications");
        cancel.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            warn!(error = %e, "failed to listen for SIGTERM");
            return wait_for_ctrl_c().await;
        }
    };

    tokio::select! {
        _ = wait_for_ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    wait_for_ctrl_c().await
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        // Without a signal source we must never cancel spuriously.
        std::future::pending::<()>().await;
    }
}
