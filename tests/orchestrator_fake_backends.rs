// tests/orchestrator_fake_backends.rs

mod common;
use crate::common::builders::{JobSpecBuilder, orchestrator};
use crate::common::fakes::{FakeAlerter, FakeMonitor, FakeRunner, MonitorEvent, ScriptedRun};
use crate::common::{init_tracing, limit_with_room};

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use kristy::engine::FailureSource;
use kristy::errors::KristyError;
use kristy::notify::DeliveryError;
use kristy::types::Channel;

fn cancel_after(cancel: &CancellationToken, delay: Duration) {
    let cancel = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        cancel.cancel();
    });
}

#[tokio::test]
async fn successful_job_reports_zero_with_output() {
    init_tracing();

    let runner = FakeRunner::new([ScriptedRun::success("hello\n")]);
    let monitor = FakeMonitor::new();
    let alerter = FakeAlerter::new();
    let job = JobSpecBuilder::new(&["echo", "hello"]).build();

    let result = orchestrator(job, &runner, &monitor, &alerter)
        .run(&CancellationToken::new())
        .await;

    assert!(result.is_ok(), "unexpected failure: {result:?}");
    assert_eq!(runner.attempts(), 1);
    assert_eq!(
        monitor.statuses(),
        vec![(0, "-- stdout --\nhello\n\n-- stderr --\n\n".to_string())]
    );
    assert!(monitor.events().contains(&MonitorEvent::Start));
    assert!(alerter.alerts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failing_job_retries_with_growing_backoff_and_reports_last_attempt() {
    init_tracing();

    let runner = FakeRunner::new([
        ScriptedRun::failed(2, "attempt 1", "err 1"),
        ScriptedRun::failed(2, "attempt 2", "err 2"),
        ScriptedRun::failed(2, "attempt 3", "err 3"),
    ]);
    let monitor = FakeMonitor::new();
    let alerter = FakeAlerter::new();
    let job = JobSpecBuilder::new(&["flaky.sh"]).retries(2).build();

    let err = orchestrator(job, &runner, &monitor, &alerter)
        .run(&CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(runner.attempts(), 3);
    assert_eq!(
        runner.gaps(),
        vec![Duration::from_secs(1), Duration::from_secs(3)]
    );
    assert_eq!(
        monitor.statuses(),
        vec![(2, "-- stdout --\nattempt 3\n-- stderr --\nerr 3\n".to_string())]
    );
    assert_eq!(err.exit_code(), 2);
    assert_eq!(err.sources().collect::<Vec<_>>(), vec![FailureSource::Execution]);
    // The monitor knows about the failure; no fallback needed.
    assert!(alerter.alerts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn recovers_when_a_retry_succeeds() {
    let runner = FakeRunner::new([
        ScriptedRun::failed(1, "", "temporary"),
        ScriptedRun::success("fine"),
    ]);
    let monitor = FakeMonitor::new();
    let alerter = FakeAlerter::new();
    let job = JobSpecBuilder::new(&["flaky.sh"]).retries(4).build();

    let result = orchestrator(job, &runner, &monitor, &alerter)
        .run(&CancellationToken::new())
        .await;

    assert!(result.is_ok());
    assert_eq!(runner.attempts(), 2);
    assert_eq!(monitor.statuses()[0].0, 0);
}

#[tokio::test]
async fn zero_retries_means_exactly_one_attempt() {
    let runner = FakeRunner::new([ScriptedRun::failed(1, "", ""), ScriptedRun::success("")]);
    let monitor = FakeMonitor::new();
    let alerter = FakeAlerter::new();
    let job = JobSpecBuilder::new(&["false"]).retries(0).build();

    let err = orchestrator(job, &runner, &monitor, &alerter)
        .run(&CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(runner.attempts(), 1);
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn start_failure_is_not_retried() {
    let runner = FakeRunner::new([ScriptedRun::not_started()]);
    let monitor = FakeMonitor::new();
    let alerter = FakeAlerter::new();
    let job = JobSpecBuilder::new(&["no-such-binary"]).retries(3).build();

    let err = orchestrator(job, &runner, &monitor, &alerter)
        .run(&CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(runner.attempts(), 1);
    assert_eq!(err.exit_code(), kristy::types::INTERNAL_ERROR_CODE);
    assert!(err.to_string().contains("could not start process"));
    assert_eq!(monitor.statuses()[0].0, kristy::types::INTERNAL_ERROR_CODE);
}

#[tokio::test]
async fn lost_status_for_successful_job_sends_no_alert() {
    let runner = FakeRunner::new([ScriptedRun::success("ok")]);
    let monitor = FakeMonitor::new().failing_status(500);
    let alerter = FakeAlerter::new();
    let job = JobSpecBuilder::new(&["true"]).build();

    let err = orchestrator(job, &runner, &monitor, &alerter)
        .run(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(alerter.alerts().is_empty());
    assert_eq!(err.sources().collect::<Vec<_>>(), vec![FailureSource::StatusReport]);
    assert_eq!(err.exit_code(), 0);
    assert_eq!(
        err.to_string(),
        "problem sending status to Healthchecks.io: unexpected status: 500 Internal Server Error"
    );
}

#[tokio::test]
async fn lost_start_for_successful_job_sends_no_alert() {
    let runner = FakeRunner::new([ScriptedRun::success("done")]);
    let monitor = FakeMonitor::new().failing_start(503);
    let alerter = FakeAlerter::new();
    let job = JobSpecBuilder::new(&["true"]).build();

    let err = orchestrator(job, &runner, &monitor, &alerter)
        .run(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(alerter.alerts().is_empty());
    assert!(err.has(FailureSource::StartSignal));
    assert!(!err.has(FailureSource::Execution));
    assert!(!err.has(FailureSource::FallbackAlert));
    assert_eq!(err.exit_code(), 0);
    // The status report still went out.
    assert_eq!(monitor.statuses()[0].0, 0);
}

#[tokio::test(start_paused = true)]
async fn cancelled_start_signal_is_reported_as_its_failure() {
    let runner = FakeRunner::new([ScriptedRun::success("")]);
    let monitor = FakeMonitor::new().with_start_delay(Duration::from_secs(10));
    let alerter = FakeAlerter::new();
    let job = JobSpecBuilder::new(&["true"]).build();

    let cancel = CancellationToken::new();
    cancel_after(&cancel, Duration::from_secs(1));

    let err = orchestrator(job, &runner, &monitor, &alerter)
        .run(&cancel)
        .await
        .unwrap_err();

    assert_eq!(err.sources().collect::<Vec<_>>(), vec![FailureSource::StartSignal]);
    assert!(matches!(
        &err.failures()[0].error,
        KristyError::Delivery {
            channel: Channel::MonitorStart,
            source: DeliveryError::Cancelled,
        }
    ));
    assert_eq!(
        err.to_string(),
        "problem sending start signal to Healthchecks.io: request cancelled"
    );
    // Successful job: nothing to escalate.
    assert!(alerter.alerts().is_empty());
    assert_eq!(err.exit_code(), 0);
}

#[tokio::test]
async fn lost_start_for_failed_job_falls_back_to_alert() {
    let runner = FakeRunner::new([ScriptedRun::failed(3, "out", "boom")]);
    let monitor = FakeMonitor::new().failing_start(503);
    let alerter = FakeAlerter::new();
    let job = JobSpecBuilder::new(&["backup.sh"]).name("nightly").build();

    let err = orchestrator(job, &runner, &monitor, &alerter)
        .run(&CancellationToken::new())
        .await
        .unwrap_err();

    let alerts = alerter.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].text, "Could not report job to Healthchecks.io");
    assert_eq!(alerts[0].title, "problem running cron job nightly");
    assert_eq!(alerts[0].output, "-- stdout --\nout\n-- stderr --\nboom\n");

    assert_eq!(
        err.sources().collect::<Vec<_>>(),
        vec![FailureSource::Execution, FailureSource::StartSignal]
    );
    assert_eq!(err.exit_code(), 3);
}

#[tokio::test]
async fn failed_alert_is_reported_alongside_everything_else() {
    let runner = FakeRunner::new([ScriptedRun::failed(4, "", "")]);
    let monitor = FakeMonitor::new().failing_status(502);
    let alerter = FakeAlerter::new().failing(404);
    let job = JobSpecBuilder::new(&["job"]).build();

    let err = orchestrator(job, &runner, &monitor, &alerter)
        .run(&CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(
        err.sources().collect::<Vec<_>>(),
        vec![
            FailureSource::Execution,
            FailureSource::StatusReport,
            FailureSource::FallbackAlert
        ]
    );
    let text = err.to_string();
    assert!(text.contains("process failed: exit status 4"));
    assert!(text.contains("problem sending status to Healthchecks.io"));
    assert!(text.contains("problem posting alert to Slack: unexpected status: 404 Not Found"));
    assert_eq!(err.exit_code(), 4);
}

#[tokio::test]
async fn alert_uses_the_larger_ceiling() {
    let runner = FakeRunner::new([ScriptedRun::failed(1, "0123456789", "")]);
    let monitor = FakeMonitor::new().failing_status(500);
    let alerter = FakeAlerter::new();
    let job = JobSpecBuilder::new(&["job"])
        .limits(limit_with_room(4), limit_with_room(10))
        .build();

    let _ = orchestrator(job, &runner, &monitor, &alerter)
        .run(&CancellationToken::new())
        .await;

    assert_eq!(
        monitor.statuses(),
        vec![(1, "-- stdout --\n6789\n-- stderr --\n\n".to_string())]
    );
    assert_eq!(
        alerter.alerts()[0].output,
        "-- stdout --\n0123456789\n-- stderr --\n\n"
    );
}

#[tokio::test(start_paused = true)]
async fn slow_start_signal_may_finish_after_status() {
    let runner = FakeRunner::new([ScriptedRun::success("")]);
    let monitor = FakeMonitor::new().with_start_delay(Duration::from_secs(10));
    let alerter = FakeAlerter::new();
    let job = JobSpecBuilder::new(&["true"]).build();

    let result = orchestrator(job, &runner, &monitor, &alerter)
        .run(&CancellationToken::new())
        .await;

    assert!(result.is_ok());
    let events = monitor.events();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], MonitorEvent::Status { exit_code: 0, .. }));
    assert_eq!(events[1], MonitorEvent::Start);
}

#[tokio::test(start_paused = true)]
async fn cancellation_during_backoff_stops_retrying() {
    let runner = FakeRunner::new([
        ScriptedRun::failed(1, "first", ""),
        ScriptedRun::failed(1, "second", ""),
    ]);
    let monitor = FakeMonitor::new();
    let alerter = FakeAlerter::new();
    let job = JobSpecBuilder::new(&["job"])
        .retries(5)
        .backoff(Duration::from_secs(60), 3)
        .build();

    let cancel = CancellationToken::new();
    cancel_after(&cancel, Duration::from_secs(5));

    let err = orchestrator(job, &runner, &monitor, &alerter)
        .run(&cancel)
        .await
        .unwrap_err();

    assert_eq!(runner.attempts(), 1);
    assert_eq!(err.exit_code(), 1);
    assert_eq!(
        monitor.statuses(),
        vec![(1, "-- stdout --\nfirst\n-- stderr --\n\n".to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_a_running_job_and_keeps_its_output() {
    let runner = FakeRunner::new([ScriptedRun::hang("partial")]);
    let monitor = FakeMonitor::new();
    let alerter = FakeAlerter::new();
    let job = JobSpecBuilder::new(&["sleep", "1000"]).retries(2).build();

    let cancel = CancellationToken::new();
    cancel_after(&cancel, Duration::from_secs(1));

    let err = orchestrator(job, &runner, &monitor, &alerter)
        .run(&cancel)
        .await
        .unwrap_err();

    assert_eq!(runner.attempts(), 1);
    assert_eq!(err.exit_code(), 128 + 9);
    assert_eq!(
        monitor.statuses(),
        vec![(137, "-- stdout --\npartial\n-- stderr --\n\n".to_string())]
    );
}
