#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use kristy::engine::{JobSpec, Orchestrator};
use kristy::exec::{JobCommand, RetryPolicy};

use crate::fakes::{FakeAlerter, FakeMonitor, FakeRunner};

/// Builder for `JobSpec` to simplify test setup.
pub struct JobSpecBuilder {
    spec: JobSpec,
}

impl JobSpecBuilder {
    pub fn new(command: &[&str]) -> Self {
        let command = JobCommand::new(command.iter().copied())
            .expect("test command must not be empty");
        Self {
            spec: JobSpec::new(command),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.spec.name = name.to_string();
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.spec.retry.retries = retries;
        self
    }

    pub fn backoff(mut self, base_delay: Duration, factor: u32) -> Self {
        self.spec.retry = RetryPolicy {
            base_delay,
            factor,
            ..self.spec.retry
        };
        self
    }

    pub fn limits(mut self, report_limit: usize, alert_limit: usize) -> Self {
        self.spec.report_limit = report_limit;
        self.spec.alert_limit = alert_limit;
        self
    }

    pub fn build(self) -> JobSpec {
        self.spec
    }
}

/// Wire an orchestrator to fakes, keeping clones of the fakes for
/// inspection by the caller.
pub fn orchestrator(
    job: JobSpec,
    runner: &FakeRunner,
    monitor: &FakeMonitor,
    alerter: &FakeAlerter,
) -> Orchestrator {
    Orchestrator::new(
        job,
        Box::new(runner.clone()),
        Arc::new(monitor.clone()),
        Box::new(alerter.clone()),
    )
}
