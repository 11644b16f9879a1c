// tests/end_to_end.rs
//
// Real child processes against mock HTTP endpoints.

#![cfg(unix)]

mod common;
use crate::common::{init_tracing, with_timeout};

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kristy::build_orchestrator;
use kristy::config::{AlertSection, AppConfig, MonitorSection, RawConfigFile};

fn config(ping: &MockServer, slack: &MockServer, command: &[&str]) -> AppConfig {
    let raw = RawConfigFile {
        monitor: MonitorSection {
            healthcheck: Some("job-id".to_string()),
            ping_url: Some(ping.uri()),
            timeout: Some(Duration::from_secs(5)),
        },
        alert: AlertSection {
            slack: Some(format!("{}/hook", slack.uri())),
        },
        ..Default::default()
    };
    AppConfig::from_raw(raw, command.iter().map(|s| s.to_string()).collect()).unwrap()
}

#[tokio::test]
async fn successful_command_is_reported_with_its_output() {
    init_tracing();

    let ping = MockServer::start().await;
    let slack = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/job-id/start"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&ping)
        .await;
    Mock::given(method("POST"))
        .and(path("/job-id/0"))
        .and(body_string("-- stdout --\nhello\n\n-- stderr --\n\n"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&ping)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&slack)
        .await;

    let cfg = config(&ping, &slack, &["sh", "-c", "echo hello"]);
    let result = with_timeout(async {
        build_orchestrator(&cfg)
            .unwrap()
            .run(&CancellationToken::new())
            .await
    })
    .await;

    assert!(result.is_ok(), "unexpected failure: {result:?}");
}

#[tokio::test]
async fn unreachable_monitor_and_failing_command_alert_slack() {
    init_tracing();

    let ping = MockServer::start().await;
    let slack = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&ping)
        .await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&slack)
        .await;

    let cfg = config(&ping, &slack, &["sh", "-c", "echo oops >&2; exit 5"]);
    let err = with_timeout(async {
        build_orchestrator(&cfg)
            .unwrap()
            .run(&CancellationToken::new())
            .await
    })
    .await
    .unwrap_err();

    assert_eq!(err.exit_code(), 5);

    let requests = slack.received_requests().await.unwrap();
    let body: serde_json::Value = requests[0].body_json().unwrap();
    assert_eq!(body["text"], "Could not report job to Healthchecks.io");
    assert_eq!(body["attachments"][0]["title"], "problem running cron job sh");
    assert_eq!(
        body["attachments"][0]["fields"][0]["value"],
        "-- stdout --\n\n-- stderr --\noops\n\n"
    );
}
