// src/engine/orchestrator.rs

//! Drives one supervised run end to end.
//!
//! 1. Fire the "start" ping in a background task.
//! 2. Run the command (with retries) to completion.
//! 3. Send the status report with the final exit code and output.
//! 4. Join the start ping.
//! 5. If a ping failed and the job failed, fall back to the alert channel.
//! 6. Merge every failure into one [`AggregateError`].
//!
//! A failing job the monitor was told about is already alerted on by the
//! monitor, so no fallback is sent. A successful job whose pings were lost
//! gets no fallback either; the delivery failure is still reported in the
//! returned error.

use std::sync::Arc;

use anyhow::anyhow;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::engine::aggregate::AggregateError;
use crate::errors::KristyError;
use crate::exec::{CommandRunner, JobCommand, RetryPolicy, RetryResult, run_with_retries};
use crate::notify::{Alert, Alerter, Monitor};
use crate::report::{ALERT_LIMIT, MONITOR_LIMIT, make_message};
use crate::types::{Channel, FailureSource};

/// What to run and how to report it.
#[derive(Debug, Clone)]
pub struct JobSpec {
    /// Name used in alerts.
    pub name: String,
    pub command: JobCommand,
    pub retry: RetryPolicy,
    /// Ceiling for the monitor's status body.
    pub report_limit: usize,
    /// Ceiling for the output included in a fallback alert.
    pub alert_limit: usize,
}

impl JobSpec {
    /// Spec with default retry policy and limits, named after the program.
    pub fn new(command: JobCommand) -> Self {
        Self {
            name: command.program().to_string(),
            command,
            retry: RetryPolicy::default(),
            report_limit: MONITOR_LIMIT,
            alert_limit: ALERT_LIMIT,
        }
    }
}

pub struct Orchestrator {
    job: JobSpec,
    runner: Box<dyn CommandRunner>,
    monitor: Arc<dyn Monitor>,
    alerter: Box<dyn Alerter>,
}

impl Orchestrator {
    pub fn new(
        job: JobSpec,
        runner: Box<dyn CommandRunner>,
        monitor: Arc<dyn Monitor>,
        alerter: Box<dyn Alerter>,
    ) -> Self {
        Self {
            job,
            runner,
            monitor,
            alerter,
        }
    }

    /// Run the job once and report on it.
    ///
    /// Returns `Ok(())` only if the command succeeded and every notification
    /// was delivered.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<(), AggregateError> {
        info!(job = %self.job.name, "starting");

        let start_task = {
            let monitor = Arc::clone(&self.monitor);
            let cancel = cancel.child_token();
            tokio::spawn(async move { monitor.start(&cancel).await })
        };

        let RetryResult { outcome, attempts } =
            run_with_retries(self.runner.as_ref(), &self.job.command, self.job.retry, cancel).await;
        let exit_code = outcome.class.code();

        let body = make_message(&outcome.stdout, &outcome.stderr, self.job.report_limit);
        let status_err = self
            .monitor
            .status(exit_code, body, cancel)
            .await
            .err()
            .map(|e| KristyError::delivery(Channel::MonitorStatus, e));

        let start_err = match start_task.await {
            Ok(res) => res
                .err()
                .map(|e| KristyError::delivery(Channel::MonitorStart, e)),
            Err(join_err) => Some(KristyError::Other(anyhow!(
                "start signal task failed: {join_err}"
            ))),
        };

        let delivery_failed = start_err.is_some() || status_err.is_some();
        let alert_err = if delivery_failed && !outcome.class.is_success() {
            warn!(job = %self.job.name, "could not report to monitor; sending fallback alert");
            let alert = Alert {
                text: "Could not report job to Healthchecks.io".to_string(),
                title: format!("problem running cron job {}", self.job.name),
                output: String::from_utf8_lossy(&make_message(
                    &outcome.stdout,
                    &outcome.stderr,
                    self.job.alert_limit,
                ))
                .into_owned(),
            };
            self.alerter
                .alert(&alert, cancel)
                .await
                .err()
                .map(|e| KristyError::delivery(Channel::Alert, e))
        } else {
            if delivery_failed {
                warn!(
                    job = %self.job.name,
                    "could not report to monitor, but the job succeeded; no fallback alert"
                );
            }
            None
        };

        info!(job = %self.job.name, exit_code, attempts, "done");

        AggregateError::check([
            (FailureSource::Execution, outcome.error),
            (FailureSource::StartSignal, start_err),
            (FailureSource::StatusReport, status_err),
            (FailureSource::FallbackAlert, alert_err),
        ])
    }
}
