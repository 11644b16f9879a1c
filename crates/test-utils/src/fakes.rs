use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use kristy::exec::{CommandRunner, ExecutionOutcome, JobCommand, RunFuture};
use kristy::notify::{Alert, Alerter, DeliveryError, DeliveryFuture, Monitor};
use kristy::types::ExitClass;

/// One scripted attempt for [`FakeRunner`].
#[derive(Debug, Clone)]
pub struct ScriptedRun {
    pub class: ExitClass,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Block until cancelled, then report a SIGKILL.
    pub hang: bool,
}

impl ScriptedRun {
    pub fn success(stdout: &str) -> Self {
        Self::exited(ExitClass::Success, stdout, "")
    }

    pub fn failed(code: i32, stdout: &str, stderr: &str) -> Self {
        Self::exited(ExitClass::Failed(code), stdout, stderr)
    }

    pub fn not_started() -> Self {
        Self::exited(ExitClass::NotStarted, "", "")
    }

    pub fn hang(stdout: &str) -> Self {
        Self {
            hang: true,
            ..Self::exited(ExitClass::Signaled(9), stdout, "")
        }
    }

    fn exited(class: ExitClass, stdout: &str, stderr: &str) -> Self {
        Self {
            class,
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
            hang: false,
        }
    }
}

/// A fake runner that:
/// - replays scripted attempts in order (succeeding once the script is empty)
/// - records when each attempt started, on the tokio clock.
#[derive(Debug, Clone, Default)]
pub struct FakeRunner {
    script: Arc<Mutex<VecDeque<ScriptedRun>>>,
    calls: Arc<Mutex<Vec<Instant>>>,
}

impl FakeRunner {
    pub fn new(script: impl IntoIterator<Item = ScriptedRun>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            calls: Arc::default(),
        }
    }

    pub fn attempts(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Time between consecutive attempts.
    pub fn gaps(&self) -> Vec<Duration> {
        let calls = self.calls.lock().unwrap();
        calls.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

impl CommandRunner for FakeRunner {
    fn run<'a>(&'a self, _command: &'a JobCommand, cancel: &'a CancellationToken) -> RunFuture<'a> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(Instant::now());
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| ScriptedRun::success(""));

            if next.hang {
                cancel.cancelled().await;
            }

            if next.class == ExitClass::NotStarted {
                return ExecutionOutcome::not_started(std::io::Error::from(
                    std::io::ErrorKind::NotFound,
                ));
            }
            ExecutionOutcome::finished(next.class, next.stdout, next.stderr)
        })
    }
}

/// What a [`FakeMonitor`] saw, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// The start ping completed (after any configured delay).
    Start,
    Status { exit_code: i32, body: Vec<u8> },
}

/// A fake monitor with configurable failures and a slow start ping.
#[derive(Debug, Clone, Default)]
pub struct FakeMonitor {
    start_failure: Option<u16>,
    status_failure: Option<u16>,
    start_delay: Duration,
    events: Arc<Mutex<Vec<MonitorEvent>>>,
}

impl FakeMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_start(mut self, status: u16) -> Self {
        self.start_failure = Some(status);
        self
    }

    pub fn failing_status(mut self, status: u16) -> Self {
        self.status_failure = Some(status);
        self
    }

    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    pub fn events(&self) -> Vec<MonitorEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<(i32, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                MonitorEvent::Status { exit_code, body } => {
                    Some((exit_code, String::from_utf8_lossy(&body).into_owned()))
                }
                MonitorEvent::Start => None,
            })
            .collect()
    }
}

impl Monitor for FakeMonitor {
    fn start<'a>(&'a self, cancel: &'a CancellationToken) -> DeliveryFuture<'a> {
        Box::pin(async move {
            if !self.start_delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(DeliveryError::Cancelled),
                    _ = tokio::time::sleep(self.start_delay) => {}
                }
            }
            self.events.lock().unwrap().push(MonitorEvent::Start);
            match self.start_failure {
                Some(code) => Err(DeliveryError::Status(code)),
                None => Ok(()),
            }
        })
    }

    fn status<'a>(
        &'a self,
        exit_code: i32,
        body: Vec<u8>,
        _cancel: &'a CancellationToken,
    ) -> DeliveryFuture<'a> {
        Box::pin(async move {
            self.events
                .lock()
                .unwrap()
                .push(MonitorEvent::Status { exit_code, body });
            match self.status_failure {
                Some(code) => Err(DeliveryError::Status(code)),
                None => Ok(()),
            }
        })
    }
}

/// A fake alert channel that records every alert it is asked to send.
#[derive(Debug, Clone, Default)]
pub struct FakeAlerter {
    failure: Option<u16>,
    alerts: Arc<Mutex<Vec<Alert>>>,
}

impl FakeAlerter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, status: u16) -> Self {
        self.failure = Some(status);
        self
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }
}

impl Alerter for FakeAlerter {
    fn alert<'a>(&'a self, alert: &'a Alert, _cancel: &'a CancellationToken) -> DeliveryFuture<'a> {
        Box::pin(async move {
            self.alerts.lock().unwrap().push(alert.clone());
            match self.failure {
                Some(code) => Err(DeliveryError::Status(code)),
                None => Ok(()),
            }
        })
    }
}
